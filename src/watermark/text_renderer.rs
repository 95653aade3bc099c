//! Text watermark rendering.
//!
//! Image watermarks are rendered as RGBA instances: the text is drawn at
//! [`RENDER_SCALE`] times the target size, rotated with canvas expansion and
//! downsampled back, which anti-aliases the rotated glyph edges.
//!
//! Video watermarks are rendered once per video as a coverage mask whose
//! strokes are thickened by dilation; the frame loop only stamps the mask.
//!
//! # Example
//!
//! ```ignore
//! use watermarker::watermark::font::FontResolver;
//! use watermarker::watermark::text_renderer::{measure_text, InstanceRenderer};
//!
//! let font = FontResolver::new::<&str>(&[]).resolve(24.0);
//! let renderer = InstanceRenderer::new(&font, "Copyright 2025", [255, 255, 255], 76).unwrap();
//! let instance = renderer.render(15.0).unwrap();
//! ```

use ab_glyph::{point, Font, GlyphId, ScaleFont};
use image::{GrayImage, Luma, Rgba, RgbaImage};

use super::font::SizedFont;
use super::resample::resize_rgba;
use crate::constants::RENDER_SCALE;
use crate::error::WatermarkError;

/// Calculate the dimensions of rendered text.
///
/// Returns (width, height) in pixels.
pub fn measure_text(font: &SizedFont, text: &str) -> (u32, u32) {
    let scaled_font = font.font.as_scaled(font.scale);

    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }

        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let height = scaled_font.height();

    // Add small padding
    let padding = 2;
    (
        width.ceil() as u32 + padding,
        height.ceil() as u32 + padding,
    )
}

/// Walk the glyph coverage of `text` laid out from the top-left corner.
///
/// `plot` receives canvas coordinates and a coverage value in `0.0..=1.0`;
/// coordinates may fall outside any canvas and must be clipped by the caller.
fn draw_coverage<F: FnMut(i32, i32, f32)>(font: &SizedFont, text: &str, mut plot: F) {
    let scaled_font = font.font.as_scaled(font.scale);
    let baseline_y = scaled_font.ascent();

    let mut cursor_x = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(font.scale, point(cursor_x, baseline_y));
        if let Some(outlined) = font.font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                plot(
                    px as i32 + bounds.min.x as i32,
                    py as i32 + bounds.min.y as i32,
                    coverage,
                );
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }
}

/// Render text onto a transparent canvas of the given size.
///
/// Glyph pixels take `rgb` with `alpha` scaled by coverage, so no pixel is
/// more opaque than `alpha`. Glyphs that fall outside the canvas are clipped.
pub fn render_text(
    font: &SizedFont,
    text: &str,
    rgb: [u8; 3],
    alpha: u8,
    canvas: (u32, u32),
) -> Result<RgbaImage, WatermarkError> {
    if text.is_empty() {
        return Err(WatermarkError::Render("Cannot render empty text".to_string()));
    }

    let (canvas_width, canvas_height) = (canvas.0.max(1), canvas.1.max(1));
    let mut image = RgbaImage::new(canvas_width, canvas_height);

    draw_coverage(font, text, |x, y, coverage| {
        if x >= 0 && y >= 0 && x < canvas_width as i32 && y < canvas_height as i32 {
            let pixel_alpha = (coverage.clamp(0.0, 1.0) * alpha as f32).round() as u8;

            // Overlapping glyph boxes keep the stronger coverage
            let existing = image.get_pixel(x as u32, y as u32)[3];
            image.put_pixel(
                x as u32,
                y as u32,
                Rgba([rgb[0], rgb[1], rgb[2], existing.max(pixel_alpha)]),
            );
        }
    });

    Ok(image)
}

/// Rotate an image by `degrees` counter-clockwise, expanding the canvas to
/// fit the rotated corners. Samples bilinearly; uncovered pixels stay
/// transparent.
pub fn rotate_image(image: &RgbaImage, degrees: f64) -> RgbaImage {
    if degrees == 0.0 {
        return image.clone();
    }

    // y grows downwards, so a negative math angle turns counter-clockwise on screen
    let radians = -(degrees as f32).to_radians();
    let cos = radians.cos();
    let sin = radians.sin();

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;
    let cx = src_w / 2.0;
    let cy = src_h / 2.0;

    let corners = [
        (-cx, -cy),
        (src_w - cx, -cy),
        (-cx, src_h - cy),
        (src_w - cx, src_h - cy),
    ];

    let rotated_corners: Vec<(f32, f32)> = corners
        .iter()
        .map(|(x, y)| (x * cos - y * sin, x * sin + y * cos))
        .collect();

    let min_x = rotated_corners
        .iter()
        .map(|(x, _)| *x)
        .fold(f32::INFINITY, f32::min);
    let max_x = rotated_corners
        .iter()
        .map(|(x, _)| *x)
        .fold(f32::NEG_INFINITY, f32::max);
    let min_y = rotated_corners
        .iter()
        .map(|(_, y)| *y)
        .fold(f32::INFINITY, f32::min);
    let max_y = rotated_corners
        .iter()
        .map(|(_, y)| *y)
        .fold(f32::NEG_INFINITY, f32::max);

    let dst_w = (max_x - min_x).ceil() as u32;
    let dst_h = (max_y - min_y).ceil() as u32;

    let mut rotated = RgbaImage::new(dst_w.max(1), dst_h.max(1));

    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    // Inverse rotation for sampling
    let inv_cos = (-radians).cos();
    let inv_sin = (-radians).sin();

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let rx = dx as f32 + 0.5 - dst_cx;
            let ry = dy as f32 + 0.5 - dst_cy;

            // Source coordinates in pixel-center space
            let sx = rx * inv_cos - ry * inv_sin + cx - 0.5;
            let sy = rx * inv_sin + ry * inv_cos + cy - 0.5;

            if sx >= 0.0 && sx <= src_w - 1.0 && sy >= 0.0 && sy <= src_h - 1.0 {
                let x0 = sx.floor() as u32;
                let y0 = sy.floor() as u32;
                let x1 = (x0 + 1).min(image.width() - 1);
                let y1 = (y0 + 1).min(image.height() - 1);

                let fx = sx - x0 as f32;
                let fy = sy - y0 as f32;

                let p00 = image.get_pixel(x0, y0);
                let p10 = image.get_pixel(x1, y0);
                let p01 = image.get_pixel(x0, y1);
                let p11 = image.get_pixel(x1, y1);

                let weights = [
                    (p00, (1.0 - fx) * (1.0 - fy)),
                    (p10, fx * (1.0 - fy)),
                    (p01, (1.0 - fx) * fy),
                    (p11, fx * fy),
                ];

                // Interpolate premultiplied so transparent texels do not darken edges
                let alpha: f32 = weights.iter().map(|(p, w)| p[3] as f32 * w).sum();
                if alpha <= 0.0 {
                    continue;
                }
                let channel = |c: usize| -> u8 {
                    let v: f32 = weights
                        .iter()
                        .map(|(p, w)| p[c] as f32 * p[3] as f32 * w)
                        .sum::<f32>()
                        / alpha;
                    v.round().clamp(0.0, 255.0) as u8
                };

                rotated.put_pixel(
                    dx,
                    dy,
                    Rgba([
                        channel(0),
                        channel(1),
                        channel(2),
                        alpha.round().clamp(0.0, 255.0) as u8,
                    ]),
                );
            }
        }
    }

    rotated
}

/// Renders rotated image-watermark instances from one oversized base buffer.
///
/// The base is drawn once at [`RENDER_SCALE`] times the font size into a
/// canvas of [`RENDER_SCALE`] times the unscaled text box; each instance
/// rotates a copy and downsamples it by the same factor.
#[derive(Debug, Clone)]
pub struct InstanceRenderer {
    base: RgbaImage,
    text_size: (u32, u32),
}

impl InstanceRenderer {
    pub fn new(
        font: &SizedFont,
        text: &str,
        rgb: [u8; 3],
        alpha: u8,
    ) -> Result<Self, WatermarkError> {
        let text_size = measure_text(font, text);
        let big_font = font.rescaled(font.px() * RENDER_SCALE as f32);
        let base = render_text(
            &big_font,
            text,
            rgb,
            alpha,
            (text_size.0 * RENDER_SCALE, text_size.1 * RENDER_SCALE),
        )?;

        Ok(Self { base, text_size })
    }

    /// Unrotated text box at the target font size.
    pub fn text_size(&self) -> (u32, u32) {
        self.text_size
    }

    /// Render one instance rotated by `angle` degrees counter-clockwise.
    pub fn render(&self, angle: f64) -> Result<RgbaImage, WatermarkError> {
        let rotated = rotate_image(&self.base, angle);
        let width = (rotated.width() / RENDER_SCALE).max(1);
        let height = (rotated.height() / RENDER_SCALE).max(1);
        resize_rgba(&rotated, width, height)
    }
}

/// Rasterize text into a coverage mask sized by [`measure_text`].
pub fn rasterize_mask(font: &SizedFont, text: &str) -> Result<GrayImage, WatermarkError> {
    if text.is_empty() {
        return Err(WatermarkError::Render("Cannot render empty text".to_string()));
    }

    let (width, height) = measure_text(font, text);
    let mut mask = GrayImage::new(width.max(1), height.max(1));

    draw_coverage(font, text, |x, y, coverage| {
        if x >= 0 && y >= 0 && x < mask.width() as i32 && y < mask.height() as i32 {
            let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            let pixel = mask.get_pixel_mut(x as u32, y as u32);
            pixel[0] = pixel[0].max(value);
        }
    });

    Ok(mask)
}

/// Thicken a mask with a disc of the given radius.
///
/// The output grows by `radius` on every side so that dilated strokes are not
/// clipped.
pub fn dilate_mask(mask: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }

    let r = radius as i64;
    let (w, h) = (mask.width() as i64, mask.height() as i64);
    let mut out = GrayImage::new((w + 2 * r) as u32, (h + 2 * r) as u32);

    let offsets: Vec<(i64, i64)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
        .collect();

    for (x, y, pixel) in mask.enumerate_pixels() {
        let value = pixel[0];
        if value == 0 {
            continue;
        }
        for (dx, dy) in &offsets {
            let ox = (x as i64 + r + dx) as u32;
            let oy = (y as i64 + r + dy) as u32;
            let target = out.get_pixel_mut(ox, oy);
            if target[0] < value {
                *target = Luma([value]);
            }
        }
    }

    out
}

/// Outlined text mask for video frames, rendered once per video.
pub fn render_stroked_mask(
    font: &SizedFont,
    text: &str,
    thickness: u32,
) -> Result<GrayImage, WatermarkError> {
    let mask = rasterize_mask(font, text)?;
    Ok(dilate_mask(&mask, thickness / 2))
}
