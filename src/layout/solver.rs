use crate::{
    composition::model::{CollageDocument, CollageNode},
    foundation::{
        core::{Area, Rect, Size},
        error::{CollageError, CollageResult},
    },
};

/// Canvas width used when the caller does not choose one.
pub const DEFAULT_RENDER_WIDTH: f64 = 2100.0;
/// Spacing factor to pixels, relative to the longest canvas side.
pub const SPACING_SCALE: f64 = 0.09;

/// Canvas geometry for one render call.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedCanvas {
    /// Whole-pixel canvas size, oriented as the document requests.
    pub size: Size,
    /// Inset and gap, in pixels.
    pub spacing_px: f64,
}

impl ResolvedCanvas {
    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// Integer pixel dimensions.
    pub fn pixel_dims(&self) -> (u32, u32) {
        (self.size.width as u32, self.size.height as u32)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size((0.0, 0.0), self.size)
    }

    pub fn area(&self) -> Area {
        Area::new(0.0, 0.0, self.size.width, self.size.height)
    }
}

/// Pixel placement of one node, canvas origin bottom-left with y growing up.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedNodeArea {
    /// Index into [`CollageDocument::nodes`].
    pub index: usize,
    pub rect: Area,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedLayout {
    pub canvas: ResolvedCanvas,
    /// Same order as the document nodes.
    pub nodes: Vec<ResolvedNodeArea>,
}

/// Resolve canvas size and node rectangles for `target_width` pixels.
///
/// The target is the final canvas width: the document ratio is oriented first and the
/// height follows from it. Node rectangles are not clipped or checked for overlap, and
/// may come out with negative extents when spacing exceeds a node's share.
#[tracing::instrument(skip(doc), fields(nodes = doc.nodes.len()))]
pub fn resolve_layout(doc: &CollageDocument, target_width: f64) -> CollageResult<ResolvedLayout> {
    let canvas = resolve_canvas(doc, target_width)?;
    let nodes = doc
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let rect = node_area(node, canvas);
            tracing::debug!(
                index,
                source = %node.source,
                x = rect.x,
                y = rect.y,
                w = rect.width,
                h = rect.height,
                "node area"
            );
            ResolvedNodeArea { index, rect }
        })
        .collect();
    Ok(ResolvedLayout { canvas, nodes })
}

pub fn resolve_canvas(doc: &CollageDocument, target_width: f64) -> CollageResult<ResolvedCanvas> {
    if !(target_width.is_finite() && target_width >= 1.0) {
        return Err(CollageError::invalid_argument(format!(
            "render width must be a finite value >= 1, got {target_width}"
        )));
    }

    let ratio = doc.aspect_ratio.oriented(doc.orientation);
    let width = target_width.round();
    let height = (width / ratio).round().max(1.0);
    if width > f64::from(u32::MAX) || height > f64::from(u32::MAX) {
        return Err(CollageError::invalid_argument(format!(
            "canvas {width}x{height} is out of range"
        )));
    }
    let size = Size::new(width, height);
    let spacing_px = spacing_pixels(doc.spacing, size);

    tracing::debug!(width, height, spacing_px, "resolved canvas");
    Ok(ResolvedCanvas { size, spacing_px })
}

/// Spacing in pixels for a dimensionless `spacing` factor.
pub fn spacing_pixels(spacing: f64, canvas: Size) -> f64 {
    spacing * SPACING_SCALE * canvas.width.max(canvas.height)
}

/// Map a node's proportional area into canvas pixels.
///
/// Spacing is applied twice per axis: once as the outer inset and once as the gap.
pub fn node_area(node: &CollageNode, canvas: ResolvedCanvas) -> Area {
    let (cw, ch) = (canvas.size.width, canvas.size.height);
    let s = canvas.spacing_px;
    let p = node.area;

    let width = p.width * (cw - s) - s;
    let height = p.height * (ch - s) - s;
    let x = p.x * (cw - s) + s;
    // Document y grows downward, canvas y grows upward.
    let y = ch - p.y * (ch - s) - s - height;

    Area::new(x, y, width, height)
}

#[cfg(test)]
#[path = "../../tests/unit/layout/solver.rs"]
mod tests;
