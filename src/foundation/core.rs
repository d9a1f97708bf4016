use crate::foundation::error::{CollageError, CollageResult};

pub use kurbo::{Affine, Point, Rect, Size};

/// Canvas orientation declared by a collage document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Height is at least the width.
    Portrait,
    /// Width is at least the height.
    Landscape,
}

impl Orientation {
    /// Parse the `orientation` attribute value.
    pub fn parse(s: &str) -> CollageResult<Self> {
        match s.trim() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            _ => Err(CollageError::malformed("orientation")),
        }
    }

    /// Reorder a size so that it matches this orientation.
    pub fn normalize(self, size: Size) -> Size {
        let (min, max) = (size.width.min(size.height), size.width.max(size.height));
        match self {
            Self::Portrait => Size::new(min, max),
            Self::Landscape => Size::new(max, min),
        }
    }
}

/// Positive canvas aspect ratio parsed from a `"W:H"` format string.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AspectRatio {
    /// Width component of the format.
    pub width: f64,
    /// Height component of the format.
    pub height: f64,
}

impl AspectRatio {
    /// Create a validated ratio; both components must be finite and > 0.
    pub fn new(width: f64, height: f64) -> CollageResult<Self> {
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(CollageError::malformed("format"));
        }
        Ok(Self { width, height })
    }

    /// Parse `"W:H"`, e.g. `"297:210"`.
    pub fn parse(s: &str) -> CollageResult<Self> {
        let mut parts = s.split(':');
        let (Some(w), Some(h), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CollageError::malformed("format"));
        };
        let w = w
            .trim()
            .parse::<f64>()
            .map_err(|_| CollageError::malformed("format"))?;
        let h = h
            .trim()
            .parse::<f64>()
            .map_err(|_| CollageError::malformed("format"))?;
        Self::new(w, h)
    }

    /// Width divided by height.
    pub fn value(self) -> f64 {
        self.width / self.height
    }

    /// Ratio reordered so that it matches `orientation`.
    pub fn oriented(self, orientation: Orientation) -> f64 {
        let size = orientation.normalize(Size::new(self.width, self.height));
        size.width / size.height
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle stored as origin plus size.
///
/// Unlike [`Rect`], the size is kept exactly as computed and may be negative; a negative
/// extent degenerates to nothing when drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Area {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Area {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min_x(self) -> f64 {
        self.x
    }

    pub fn max_y(self) -> f64 {
        self.y + self.height
    }

    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Width over height.
    pub fn ratio(self) -> f64 {
        self.width / self.height
    }

    /// Signed area (`width * height`).
    pub fn area(self) -> f64 {
        self.width * self.height
    }

    /// Convert to a kurbo [`Rect`] without normalizing negative extents.
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Channels as a `[r, g, b, a]` array.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
