use std::{collections::HashMap, sync::Arc};

use crate::{
    assets::store::{ImageId, PreparedImage},
    compile::plan::{DrawInstruction, DrawPlan},
    foundation::{
        color::Color,
        core::{Affine, Area, Rect},
        error::{CollageError, CollageResult},
    },
    render::{backend::FrameRGBA, blur, composite},
};

/// Shadow color applied by [`DrawInstruction::SetShadow`]: black at one third opacity.
pub const DEFAULT_SHADOW_COLOR: Color = Color::rgba(0.0, 0.0, 0.0, 1.0 / 3.0);

/// CPU rasterizer for [`DrawPlan`]s, built on `vello_cpu`.
///
/// Each draw is rendered into its own transparent layer and composited source-over onto
/// the frame, so drop shadows can be derived from the layer's coverage.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuRasterizer;

struct Canvas {
    width: u16,
    height: u16,
    /// Flips plan space (origin bottom-left, y up) into pixel rows.
    base: Affine,
}

impl CpuRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Execute `plan` into a premultiplied frame.
    #[tracing::instrument(skip_all, fields(ops = plan.instructions.len()))]
    pub fn render(&self, plan: &DrawPlan) -> CollageResult<FrameRGBA> {
        let (w, h) = plan.canvas.pixel_dims();
        let canvas = Canvas {
            width: w
                .try_into()
                .map_err(|_| CollageError::backend("canvas width exceeds u16"))?,
            height: h
                .try_into()
                .map_err(|_| CollageError::backend("canvas height exceeds u16"))?,
            base: Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, f64::from(h)]),
        };

        let mut frame = vec![0u8; w as usize * h as usize * 4];
        let mut paints: HashMap<ImageId, vello_cpu::Image> = HashMap::new();
        let mut shadow: Option<f64> = None;
        let mut saved: Vec<Option<f64>> = Vec::new();

        for instruction in &plan.instructions {
            let layer = match instruction {
                DrawInstruction::Save => {
                    saved.push(shadow);
                    continue;
                }
                DrawInstruction::Restore => {
                    shadow = saved
                        .pop()
                        .ok_or_else(|| CollageError::backend("restore without matching save"))?;
                    continue;
                }
                DrawInstruction::SetShadow { blur_radius } => {
                    shadow = Some(*blur_radius);
                    continue;
                }
                DrawInstruction::Fill { rect, color } => {
                    let Some(rect) = drawable(*rect) else {
                        continue;
                    };
                    render_layer(&canvas, |ctx| {
                        ctx.set_transform(affine_to_cpu(canvas.base));
                        ctx.set_paint(color_to_cpu(*color));
                        ctx.fill_rect(&rect_to_cpu(rect));
                    })
                }
                DrawInstruction::DrawImage {
                    image,
                    crop,
                    dest,
                    transform,
                    ..
                } => {
                    let Some(dest) = drawable(*dest) else {
                        continue;
                    };
                    if crop.width() <= 0.0 || crop.height() <= 0.0 {
                        continue;
                    }
                    let paint = match paints.get(image) {
                        Some(p) => p.clone(),
                        None => {
                            let p = image_paint(plan.images.get(*image)?)?;
                            paints.insert(*image, p.clone());
                            p
                        }
                    };
                    render_layer(&canvas, |ctx| {
                        ctx.set_transform(affine_to_cpu(canvas.base * *transform));
                        ctx.set_paint_transform(affine_to_cpu(crop_to_dest(*crop, dest)));
                        ctx.set_paint(paint);
                        ctx.fill_rect(&rect_to_cpu(dest));
                    })
                }
                DrawInstruction::StrokeRect {
                    rect,
                    transform,
                    color,
                    line_width,
                } => {
                    let Some(rect) = drawable(*rect) else {
                        continue;
                    };
                    render_layer(&canvas, |ctx| {
                        use vello_cpu::kurbo::Shape;

                        ctx.set_transform(affine_to_cpu(canvas.base * *transform));
                        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*line_width));
                        ctx.set_paint(color_to_cpu(*color));
                        ctx.stroke_path(&rect_to_cpu(rect).to_path(0.1));
                    })
                }
            };

            let layer = layer.data_as_u8_slice();
            if let Some(radius) = shadow {
                composite_shadow(&mut frame, layer, &canvas, radius)?;
            }
            composite::over_in_place(&mut frame, layer, 1.0)?;
        }

        if !saved.is_empty() {
            tracing::warn!(open = saved.len(), "draw plan ended with unbalanced save");
        }

        Ok(FrameRGBA {
            width: w,
            height: h,
            data: frame,
            premultiplied: true,
        })
    }
}

fn composite_shadow(
    frame: &mut [u8],
    layer: &[u8],
    canvas: &Canvas,
    blur_radius: f64,
) -> CollageResult<()> {
    let (width, height) = (usize::from(canvas.width), usize::from(canvas.height));
    let Some(bounds) = coverage_bounds(layer, width, height) else {
        return Ok(());
    };
    let (radius, sigma) = blur::shadow_kernel(blur_radius);
    let region = bounds.grow(radius as usize, width, height);

    let color = DEFAULT_SHADOW_COLOR.to_rgba8_premul().to_array();
    let silhouette = composite::silhouette(&region.copy_from(layer, width), color);
    let blurred = blur::blur_rgba8_premul(
        &silhouette,
        region.width() as u32,
        region.height() as u32,
        radius,
        sigma,
    )?;
    region.composite_into(frame, width, &blurred)
}

/// Pixel region `[x0, x1) x [y0, y1)` of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Region {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl Region {
    fn width(self) -> usize {
        self.x1 - self.x0
    }

    fn height(self) -> usize {
        self.y1 - self.y0
    }

    fn grow(self, by: usize, width: usize, height: usize) -> Self {
        Self {
            x0: self.x0.saturating_sub(by),
            y0: self.y0.saturating_sub(by),
            x1: (self.x1 + by).min(width),
            y1: (self.y1 + by).min(height),
        }
    }

    fn copy_from(self, src: &[u8], stride_px: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width() * self.height() * 4);
        for y in self.y0..self.y1 {
            let start = (y * stride_px + self.x0) * 4;
            out.extend_from_slice(&src[start..start + self.width() * 4]);
        }
        out
    }

    fn composite_into(self, dst: &mut [u8], stride_px: usize, src: &[u8]) -> CollageResult<()> {
        let row_len = self.width() * 4;
        for (row, y) in (self.y0..self.y1).enumerate() {
            let start = (y * stride_px + self.x0) * 4;
            composite::over_in_place(
                &mut dst[start..start + row_len],
                &src[row * row_len..(row + 1) * row_len],
                1.0,
            )?;
        }
        Ok(())
    }
}

/// Bounding region of pixels with non-zero alpha.
fn coverage_bounds(data: &[u8], width: usize, height: usize) -> Option<Region> {
    let mut bounds: Option<Region> = None;
    for y in 0..height {
        let row = &data[y * width * 4..(y + 1) * width * 4];
        let Some(first) = row.chunks_exact(4).position(|px| px[3] != 0) else {
            continue;
        };
        let last = row.chunks_exact(4).rposition(|px| px[3] != 0).unwrap_or(first);
        bounds = Some(match bounds {
            None => Region {
                x0: first,
                y0: y,
                x1: last + 1,
                y1: y + 1,
            },
            Some(b) => Region {
                x0: b.x0.min(first),
                y0: b.y0,
                x1: b.x1.max(last + 1),
                y1: y + 1,
            },
        });
    }
    bounds
}

fn render_layer(
    canvas: &Canvas,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) -> vello_cpu::Pixmap {
    let mut ctx = vello_cpu::RenderContext::new(canvas.width, canvas.height);
    draw(&mut ctx);
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(canvas.width, canvas.height);
    ctx.render_to_pixmap(&mut pixmap);
    pixmap
}

/// Rectangle to draw, or `None` unless both extents are positive.
fn drawable(area: Area) -> Option<Rect> {
    if !(area.width > 0.0 && area.height > 0.0) {
        return None;
    }
    let rect = area.to_rect();
    rect.is_finite().then_some(rect)
}

/// Paint transform placing the `crop` region of an image upright in `dest`.
///
/// Image rows run top to bottom, so image row `crop.y0` lands on `dest.y1`.
fn crop_to_dest(crop: Rect, dest: Rect) -> Affine {
    let sx = dest.width() / crop.width();
    let sy = dest.height() / crop.height();
    Affine::new([
        sx,
        0.0,
        0.0,
        -sy,
        dest.x0 - crop.x0 * sx,
        dest.y1 + crop.y0 * sy,
    ])
}

fn image_paint(img: &PreparedImage) -> CollageResult<vello_cpu::Image> {
    let pixmap = image_premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> CollageResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CollageError::backend("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CollageError::backend("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(CollageError::backend("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels: Vec<_> = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn color_to_cpu(c: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
