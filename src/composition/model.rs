use std::path::{Path, PathBuf};

use crate::foundation::{
    color::{ByteOrder, Color},
    core::{Area, AspectRatio, Orientation},
    error::{CollageError, CollageResult},
};

/// The only collage format version understood by this crate.
pub const SUPPORTED_VERSION: u32 = 2;

/// A parsed and validated collage document.
///
/// Documents are built once by [`crate::parse_collage`] or [`crate::load_collage`] and are
/// not mutated afterwards. All derived geometry is recomputed per render call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CollageDocument {
    pub format_version: u32,
    pub orientation: Orientation,
    pub theme: String,
    pub aspect_ratio: AspectRatio,
    pub shadows: bool,
    pub captions: bool,
    /// Dimensionless spacing factor, scaled against the canvas at layout time.
    pub spacing: f64,
    pub background: Option<Background>,
    pub album_title: Option<String>,
    pub album_date: Option<String>,
    pub album_id: Option<String>,
    /// Draw order: later nodes paint over earlier ones.
    pub nodes: Vec<CollageNode>,
    /// Canonical location of the `.cxf` file, when loaded from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

/// Document background: an optional fill color and an optional full-canvas image.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Background {
    pub color: Option<Color>,
    pub source: Option<String>,
}

/// One placed image.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CollageNode {
    /// Fractional position and size within the canvas, origin top-left.
    pub area: Area,
    /// Rotation in radians about the node's top-left corner.
    pub theta: f64,
    /// Carried from the file; layout does not consume it.
    pub scale: f64,
    pub source: String,
    pub id: Option<String>,
    pub theme: Option<String>,
}

/// Knobs for document decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Byte order of the background color attribute.
    pub color_order: ByteOrder,
    /// Themes that make a document invalid.
    pub rejected_themes: Vec<String>,
    /// Fail documents without any `node` element.
    pub require_nodes: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            color_order: ByteOrder::Argb,
            rejected_themes: Vec::new(),
            require_nodes: true,
        }
    }
}

impl CollageDocument {
    /// Parse XML bytes with default [`ParseOptions`].
    pub fn from_xml(bytes: &[u8]) -> CollageResult<Self> {
        crate::composition::parse::parse_collage(bytes, &ParseOptions::default())
    }

    /// Attach the on-disk location used to resolve relative image sources.
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Directory relative image sources resolve against.
    pub fn base_dir(&self) -> &Path {
        self.location
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new("."))
    }

    /// Display name: the file stem of the document location.
    pub fn name(&self) -> Option<String> {
        self.location
            .as_deref()
            .and_then(Path::file_stem)
            .map(|s| s.to_string_lossy().into_owned())
    }

    pub fn album_title(&self) -> Option<&str> {
        self.album_title.as_deref()
    }

    pub fn album_date(&self) -> Option<&str> {
        self.album_date.as_deref()
    }

    pub fn album_id(&self) -> Option<&str> {
        self.album_id.as_deref()
    }

    /// Fill color of the background pass.
    ///
    /// A document without a `background` element gets opaque white; a background element
    /// without a color gets no fill.
    pub fn background_fill(&self) -> Option<Color> {
        match &self.background {
            None => Some(Color::WHITE),
            Some(bg) => bg.color,
        }
    }

    pub fn background_source(&self) -> Option<&str> {
        self.background.as_ref().and_then(|bg| bg.source.as_deref())
    }

    /// Node image sources followed by the background image source, unresolved.
    pub fn image_sources(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .map(|n| n.source.as_str())
            .chain(self.background_source())
    }

    /// Re-check document invariants.
    pub fn validate(&self, opts: &ParseOptions) -> CollageResult<()> {
        if self.format_version != SUPPORTED_VERSION {
            return Err(CollageError::UnsupportedVersion(self.format_version));
        }
        if opts.rejected_themes.iter().any(|t| t == &self.theme) {
            return Err(CollageError::UnsupportedTheme(self.theme.clone()));
        }
        AspectRatio::new(self.aspect_ratio.width, self.aspect_ratio.height)?;
        if !(self.spacing.is_finite() && self.spacing >= 0.0) {
            return Err(CollageError::malformed("spacing"));
        }
        if opts.require_nodes && self.nodes.is_empty() {
            return Err(CollageError::parse("collage contains no nodes"));
        }
        for node in &self.nodes {
            node.validate()?;
        }
        Ok(())
    }
}

impl CollageNode {
    pub fn validate(&self) -> CollageResult<()> {
        let finite = |v: f64, name: &str| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(CollageError::malformed(name))
            }
        };
        finite(self.area.x, "x")?;
        finite(self.area.y, "y")?;
        finite(self.area.width, "w")?;
        finite(self.area.height, "h")?;
        finite(self.theta, "theta")?;
        finite(self.scale, "scale")?;
        if self.source.trim().is_empty() {
            return Err(CollageError::missing("src"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/model.rs"]
mod tests;
