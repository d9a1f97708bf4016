use crate::foundation::core::{Rect, Size};

/// Largest centered region of `source` with width/height equal to `target_ratio`.
///
/// The result is in source pixel space and always lies inside the source. A wider
/// source loses columns on both sides, a taller one loses rows at top and bottom.
/// Non-finite or non-positive ratios (e.g. from a degenerate node) keep the full source.
pub fn aspect_fit_crop(source: Size, target_ratio: f64) -> Rect {
    let full = Rect::from_origin_size((0.0, 0.0), source);
    if !(target_ratio.is_finite() && target_ratio > 0.0) || source.is_zero_area() {
        return full;
    }

    let source_ratio = source.width / source.height;
    if source_ratio > target_ratio {
        let width = (source.height * target_ratio).min(source.width);
        let x = (source.width - width) * 0.5;
        Rect::new(x, 0.0, x + width, source.height)
    } else {
        let height = (source.width / target_ratio).min(source.height);
        let y = (source.height - height) * 0.5;
        Rect::new(0.0, y, source.width, y + height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/crop.rs"]
mod tests;
