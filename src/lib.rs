//! Collagekit lays out and renders photo collages described by `.cxf` documents.
//!
//! A `.cxf` file is a small XML document: a page aspect ratio and orientation, a spacing
//! factor, an optional background, and a list of nodes. Each node places one image in a
//! fractional rectangle of the page, optionally rotated about its top-left corner.
//!
//! # Pipeline overview
//!
//! 1. **Parse**: XML bytes -> [`CollageDocument`] (validated, immutable)
//! 2. **Layout**: `CollageDocument + width -> ResolvedLayout` (pixel canvas and node rects)
//! 3. **Plan**: `ResolvedLayout -> DrawPlan` (ordered, backend-agnostic draw instructions)
//! 4. **Render**: `DrawPlan -> FrameRGBA` (CPU rasterizer)
//! 5. **Encode** (optional): PNG or JPEG via [`write_frame`]
//!
//! Layout and planning are pure and deterministic for a given input. Image IO happens
//! only behind the [`ImageLoader`] seam, and a missing image never fails a render: the
//! node is drawn as a black outline instead.
//!
//! Canvas space has its origin at the bottom-left with y growing upward; document
//! coordinates have y growing downward. Rendered frames are premultiplied RGBA8 with rows
//! top to bottom.
#![forbid(unsafe_code)]

mod assets;
mod compile;
mod composition;
mod foundation;
mod layout;
mod render;

pub use assets::decode::decode_image;
pub use assets::path::{
    EnvHomeDir, FixedHomeDir, HOME_MARKER, HOME_TOKEN, HomeDirProvider, PathResolver,
    common_ancestor, image_directory, strip_home_prefix,
};
pub use assets::store::{
    FsImageLoader, ImageId, ImageLoader, ImageSet, MemoryImageLoader, NullImageLoader,
    PreparedImage,
};
pub use compile::plan::{
    DrawInstruction, DrawPlan, PLACEHOLDER_LINE_WIDTH, SHADOW_BLUR_SCALE, plan_composition,
    shadow_radius,
};
pub use composition::model::{
    Background, CollageDocument, CollageNode, ParseOptions, SUPPORTED_VERSION,
};
pub use composition::parse::{LIBRARY_EXTENSION, collage_files, load_collage, parse_collage};
pub use foundation::color::{ByteOrder, Color, decode_hex_color};
pub use foundation::core::{
    Affine, Area, AspectRatio, Orientation, Point, Rect, Rgba8Premul, Size,
};
pub use foundation::error::{CollageError, CollageResult};
pub use layout::crop::aspect_fit_crop;
pub use layout::solver::{
    DEFAULT_RENDER_WIDTH, ResolvedCanvas, ResolvedLayout, ResolvedNodeArea, SPACING_SCALE,
    node_area, resolve_canvas, resolve_layout, spacing_pixels,
};
pub use render::backend::FrameRGBA;
pub use render::cpu::{CpuRasterizer, DEFAULT_SHADOW_COLOR};
pub use render::pipeline::{
    DEFAULT_JPEG_QUALITY, OutputFormat, RenderSettings, RenderedCollage, encode_frame,
    render_collage, render_collage_with, write_frame, write_frame_with_quality,
};
