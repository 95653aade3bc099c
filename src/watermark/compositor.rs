//! Watermark compositor for blending watermarks onto images and frames.
//!
//! Image mode collects rotated instances on a transparent [`Overlay`], which
//! is then alpha-composited onto the source and flattened onto white for
//! JPEG output. Video mode stamps a text mask onto a copy of the frame and
//! blends the copy back against the original with a fixed opacity.
//!
//! # Example
//!
//! ```ignore
//! use watermarker::watermark::compositor::{alpha_composite, flatten_onto_white, Overlay};
//! use watermarker::watermark::PlacementPosition;
//!
//! let mut overlay = Overlay::new(source.width(), source.height());
//! overlay.paste_masked(&instance, PlacementPosition::new(10, 10));
//!
//! let mut rgba = source.to_rgba8();
//! alpha_composite(&mut rgba, overlay.as_image());
//! let rgb = flatten_onto_white(&rgba);
//! ```

use image::{GrayImage, Rgb, RgbImage, Rgba, RgbaImage};

use super::position::PlacementPosition;

/// Visible region of a `(w, h)` source placed at `pos` on a `target` canvas.
///
/// Returns `(x_start, y_start, x_end, y_end)` in target coordinates; the
/// range is empty when nothing overlaps.
fn visible_region(target: (u32, u32), source: (u32, u32), pos: PlacementPosition) -> (i32, i32, i32, i32) {
    let x_start = pos.x.max(0);
    let y_start = pos.y.max(0);
    let x_end = (pos.x + source.0 as i32).min(target.0 as i32);
    let y_end = (pos.y + source.1 as i32).min(target.1 as i32);
    (x_start, y_start, x_end, y_end)
}

/// Linear mix of `src` over `dst` by `weight / 255`, rounded.
fn mix(src: u8, dst: u8, weight: u8) -> u8 {
    let w = weight as u32;
    ((src as u32 * w + dst as u32 * (255 - w) + 127) / 255) as u8
}

/// Transparent layer that collects watermark instances before compositing.
#[derive(Debug, Clone)]
pub struct Overlay {
    layer: RgbaImage,
}

impl Overlay {
    /// Create a fully transparent overlay.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layer: RgbaImage::new(width, height),
        }
    }

    /// Paste `instance` at `pos` using its own alpha channel as the mask.
    ///
    /// Every channel, alpha included, moves towards the instance pixel by the
    /// instance alpha. Parts outside the overlay are clipped.
    pub fn paste_masked(&mut self, instance: &RgbaImage, pos: PlacementPosition) {
        let (x_start, y_start, x_end, y_end) =
            visible_region(self.layer.dimensions(), instance.dimensions(), pos);

        for ty in y_start..y_end {
            for tx in x_start..x_end {
                let src = instance.get_pixel((tx - pos.x) as u32, (ty - pos.y) as u32);
                let mask = src[3];
                if mask == 0 {
                    continue;
                }

                let dst = self.layer.get_pixel_mut(tx as u32, ty as u32);
                *dst = Rgba([
                    mix(src[0], dst[0], mask),
                    mix(src[1], dst[1], mask),
                    mix(src[2], dst[2], mask),
                    mix(src[3], dst[3], mask),
                ]);
            }
        }
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.layer
    }

    pub fn into_image(self) -> RgbaImage {
        self.layer
    }
}

/// Composite `overlay` onto `base` with the Porter-Duff "over" operator.
///
/// Both images must have the same dimensions; the overlapping region is used
/// otherwise.
pub fn alpha_composite(base: &mut RgbaImage, overlay: &RgbaImage) {
    let width = base.width().min(overlay.width());
    let height = base.height().min(overlay.height());

    for y in 0..height {
        for x in 0..width {
            let top = *overlay.get_pixel(x, y);
            if top[3] == 0 {
                continue;
            }
            let bottom = *base.get_pixel(x, y);
            base.put_pixel(x, y, blend_pixels(bottom, top));
        }
    }
}

/// Blend two pixels using alpha compositing.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    // Porter-Duff "over" operator
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// Drop the alpha channel by pasting the image onto opaque white.
pub fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        Rgb([
            mix(p[0], 255, p[3]),
            mix(p[1], 255, p[3]),
            mix(p[2], 255, p[3]),
        ])
    })
}

/// Paint `rgb` through a coverage mask placed at `pos` on the frame.
pub fn stamp_mask(frame: &mut RgbImage, mask: &GrayImage, pos: PlacementPosition, rgb: [u8; 3]) {
    let (x_start, y_start, x_end, y_end) =
        visible_region(frame.dimensions(), mask.dimensions(), pos);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let coverage = mask.get_pixel((tx - pos.x) as u32, (ty - pos.y) as u32)[0];
            if coverage == 0 {
                continue;
            }

            let dst = frame.get_pixel_mut(tx as u32, ty as u32);
            *dst = Rgb([
                mix(rgb[0], dst[0], coverage),
                mix(rgb[1], dst[1], coverage),
                mix(rgb[2], dst[2], coverage),
            ]);
        }
    }
}

/// Weighted blend `opacity * overlay + (1 - opacity) * original`, written
/// into `original`.
pub fn blend_frames(overlay: &RgbImage, original: &mut RgbImage, opacity: f32) {
    let alpha = opacity.clamp(0.0, 1.0);
    let beta = 1.0 - alpha;

    for (dst, src) in original.pixels_mut().zip(overlay.pixels()) {
        for c in 0..3 {
            let v = src[c] as f32 * alpha + dst[c] as f32 * beta;
            dst[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}
