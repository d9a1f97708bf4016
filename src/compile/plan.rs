use std::path::PathBuf;

use crate::{
    assets::{
        path::{HomeDirProvider, PathResolver},
        store::{ImageId, ImageLoader, ImageSet},
    },
    composition::model::CollageDocument,
    foundation::{
        color::Color,
        core::{Affine, Area, Point, Rect},
    },
    layout::{
        crop::aspect_fit_crop,
        solver::{ResolvedCanvas, ResolvedLayout},
    },
};

/// Blur radius of node shadows, relative to the canvas width.
pub const SHADOW_BLUR_SCALE: f64 = 0.01;
/// Line width of the placeholder drawn for images that failed to load.
pub const PLACEHOLDER_LINE_WIDTH: f64 = 3.0;

#[derive(Clone, Debug, serde::Serialize)]
/// Backend-agnostic draw plan for one collage render.
///
/// Instructions run in order over a canvas whose origin is bottom-left with y growing up.
/// Geometry in an instruction is mapped to the canvas by that instruction's `transform`.
pub struct DrawPlan {
    pub canvas: ResolvedCanvas,
    pub instructions: Vec<DrawInstruction>,
    /// Pixels for every [`ImageId`] referenced by `instructions`.
    #[serde(skip)]
    pub images: ImageSet,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
/// Draw instruction emitted by the planner.
pub enum DrawInstruction {
    /// Fill a canvas-space rectangle.
    Fill { rect: Area, color: Color },
    /// Draw the `crop` region of an image upright into `dest`.
    DrawImage {
        image: ImageId,
        source: PathBuf,
        crop: Rect,
        dest: Area,
        transform: Affine,
    },
    /// Outline a rectangle.
    StrokeRect {
        rect: Area,
        transform: Affine,
        color: Color,
        line_width: f64,
    },
    /// Drop shadow for following draws, until the enclosing [`DrawInstruction::Restore`].
    SetShadow { blur_radius: f64 },
    /// Push graphics state.
    Save,
    /// Pop graphics state pushed by the matching [`DrawInstruction::Save`].
    Restore,
}

impl DrawPlan {
    /// Number of nodes drawn as placeholders.
    pub fn placeholder_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| matches!(i, DrawInstruction::StrokeRect { .. }))
            .count()
    }
}

/// Build the ordered draw plan for a resolved layout.
///
/// Images are loaded through `loader` once per resolved location. A node whose image
/// cannot be loaded keeps its rectangle and gets a black placeholder outline instead.
#[tracing::instrument(skip_all, fields(nodes = layout.nodes.len()))]
pub fn plan_composition<H: HomeDirProvider>(
    doc: &CollageDocument,
    layout: &ResolvedLayout,
    resolver: &PathResolver<H>,
    loader: &dyn ImageLoader,
) -> DrawPlan {
    let canvas = layout.canvas;
    let mut images = ImageSet::new();
    let mut instructions = Vec::with_capacity(2 + layout.nodes.len() * 4);

    if let Some(color) = doc.background_fill() {
        instructions.push(DrawInstruction::Fill {
            rect: canvas.area(),
            color,
        });
    }

    if let Some(source) = doc.background_source() {
        let path = resolver.resolve(source);
        match images.intern(&path, loader) {
            Some(id) => instructions.push(image_instruction(
                &images,
                id,
                path,
                canvas.area(),
                canvas.area().ratio(),
                Affine::IDENTITY,
            )),
            None => tracing::warn!(path = %path.display(), "background image skipped"),
        }
    }

    let shadow = doc.shadows.then(|| shadow_radius(canvas));

    for area in &layout.nodes {
        let Some(node) = doc.nodes.get(area.index) else {
            continue;
        };
        let rect = area.rect;
        let corner = Point::new(rect.min_x(), rect.max_y());
        let frame = Affine::translate(corner.to_vec2()) * Affine::rotate(-node.theta);

        instructions.push(DrawInstruction::Save);

        let path = resolver.resolve(&node.source);
        match images.intern(&path, loader) {
            Some(id) => {
                if let Some(blur_radius) = shadow {
                    instructions.push(DrawInstruction::SetShadow { blur_radius });
                }
                // Node-local frame: origin at the top-left corner, the node extends below it.
                let dest = Area::new(0.0, -rect.height, rect.width, rect.height);
                instructions.push(image_instruction(
                    &images,
                    id,
                    path,
                    dest,
                    rect.ratio(),
                    frame,
                ));
            }
            None => {
                tracing::warn!(
                    index = area.index,
                    path = %path.display(),
                    "node image unavailable; drawing placeholder"
                );
                instructions.push(DrawInstruction::StrokeRect {
                    rect,
                    transform: Affine::rotate_about(-node.theta, corner),
                    color: Color::BLACK,
                    line_width: PLACEHOLDER_LINE_WIDTH,
                });
            }
        }

        instructions.push(DrawInstruction::Restore);
    }

    DrawPlan {
        canvas,
        instructions,
        images,
    }
}

/// Shadow blur radius for a canvas.
pub fn shadow_radius(canvas: ResolvedCanvas) -> f64 {
    canvas.width() * SHADOW_BLUR_SCALE
}

fn image_instruction(
    images: &ImageSet,
    id: ImageId,
    source: PathBuf,
    dest: Area,
    target_ratio: f64,
    transform: Affine,
) -> DrawInstruction {
    let crop = match images.get(id) {
        Ok(img) => aspect_fit_crop(img.size(), target_ratio),
        Err(_) => Rect::ZERO,
    };
    DrawInstruction::DrawImage {
        image: id,
        source,
        crop,
        dest,
        transform,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/plan.rs"]
mod tests;
