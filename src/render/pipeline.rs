use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context as _;

use crate::{
    assets::{
        path::{EnvHomeDir, HomeDirProvider, PathResolver},
        store::{ImageLoader, NullImageLoader},
    },
    compile::plan::plan_composition,
    composition::model::CollageDocument,
    foundation::error::{CollageError, CollageResult},
    layout::solver::{DEFAULT_RENDER_WIDTH, ResolvedLayout, resolve_layout},
    render::{backend::FrameRGBA, cpu::CpuRasterizer},
};

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Encoded output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Knobs for one render call.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Final canvas width in pixels.
    pub target_width: f64,
    pub format: OutputFormat,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    /// When false every node renders as a placeholder outline.
    pub load_images: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_RENDER_WIDTH,
            format: OutputFormat::Png,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            load_images: true,
        }
    }
}

impl RenderSettings {
    /// Defaults overridden by `COLLAGE_RENDER_WIDTH` and `COLLAGE_JPEG_QUALITY`.
    ///
    /// Values that do not parse are ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(width) = var("COLLAGE_RENDER_WIDTH")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|w| w.is_finite() && *w >= 1.0)
        {
            self.target_width = width;
        }
        if let Some(quality) = var("COLLAGE_JPEG_QUALITY")
            .and_then(|v| v.trim().parse::<u8>().ok())
            .filter(|q| (1..=100).contains(q))
        {
            self.jpeg_quality = quality;
        }
        self
    }
}

/// Output of [`render_collage`].
#[derive(Clone, Debug)]
pub struct RenderedCollage {
    /// File stem of the document, when it was loaded from disk.
    pub name: Option<String>,
    pub layout: ResolvedLayout,
    /// Premultiplied frame.
    pub frame: FrameRGBA,
    /// Nodes drawn as outlines because their image was unavailable.
    pub placeholders: usize,
}

/// Resolve, plan and rasterize a collage on the CPU.
///
/// Image sources resolve against the document location and the `HOME` directory.
pub fn render_collage(
    doc: &CollageDocument,
    settings: &RenderSettings,
    loader: &dyn ImageLoader,
) -> CollageResult<RenderedCollage> {
    let resolver = PathResolver::for_document(doc, EnvHomeDir);
    render_collage_with(doc, settings, &resolver, loader)
}

/// [`render_collage`] with an explicit path resolver.
#[tracing::instrument(skip_all, fields(name = ?doc.name()))]
pub fn render_collage_with<H: HomeDirProvider>(
    doc: &CollageDocument,
    settings: &RenderSettings,
    resolver: &PathResolver<H>,
    loader: &dyn ImageLoader,
) -> CollageResult<RenderedCollage> {
    let layout = resolve_layout(doc, settings.target_width)?;
    let loader: &dyn ImageLoader = if settings.load_images {
        loader
    } else {
        &NullImageLoader
    };
    let plan = plan_composition(doc, &layout, resolver, loader);
    let frame = CpuRasterizer::new().render(&plan)?;

    tracing::debug!(
        width = frame.width,
        height = frame.height,
        images = plan.images.len(),
        "rendered collage"
    );
    Ok(RenderedCollage {
        name: doc.name(),
        placeholders: plan.placeholder_count(),
        layout,
        frame,
    })
}

/// Encode `frame` to `path` with the default JPEG quality.
pub fn write_frame(frame: &FrameRGBA, path: &Path, format: OutputFormat) -> CollageResult<()> {
    write_frame_with_quality(frame, path, format, DEFAULT_JPEG_QUALITY)
}

pub fn write_frame_with_quality(
    frame: &FrameRGBA,
    path: &Path,
    format: OutputFormat,
    jpeg_quality: u8,
) -> CollageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    let mut out = BufWriter::new(file);
    encode_frame(frame, format, jpeg_quality, &mut out)?;
    out.flush()
        .with_context(|| format!("flush '{}'", path.display()))?;
    Ok(())
}

/// Encode `frame` into `out`.
///
/// PNG keeps straight alpha. JPEG has no alpha channel, so transparent areas come out
/// as if composited over black.
pub fn encode_frame<W: Write + std::io::Seek>(
    frame: &FrameRGBA,
    format: OutputFormat,
    jpeg_quality: u8,
    out: &mut W,
) -> CollageResult<()> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.data.len() != expected {
        return Err(CollageError::invalid_argument(format!(
            "frame data has {} bytes, expected {expected}",
            frame.data.len()
        )));
    }

    match format {
        OutputFormat::Png => {
            let straight = frame.to_straight_rgba8();
            image::write_buffer_with_format(
                out,
                &straight,
                frame.width,
                frame.height,
                image::ColorType::Rgba8,
                image::ImageFormat::Png,
            )
            .context("encode png")?;
        }
        OutputFormat::Jpeg => {
            let rgb = if frame.premultiplied {
                drop_alpha(&frame.data)
            } else {
                let mut premul = frame.data.clone();
                crate::assets::decode::premultiply_rgba8_in_place(&mut premul);
                drop_alpha(&premul)
            };
            let quality = jpeg_quality.clamp(1, 100);
            image::codecs::jpeg::JpegEncoder::new_with_quality(out, quality)
                .encode(
                    &rgb,
                    frame.width,
                    frame.height,
                    image::ExtendedColorType::Rgb8,
                )
                .context("encode jpeg")?;
        }
    }
    Ok(())
}

fn drop_alpha(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
