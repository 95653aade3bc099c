//! Resizing helpers on top of `fast_image_resize`.

use fast_image_resize::{FilterType, Image, MulDiv, PixelType, ResizeAlg, Resizer};
use image::{RgbImage, RgbaImage};
use std::num::NonZeroU32;

use crate::error::WatermarkError;

fn non_zero(value: u32, what: &str) -> Result<NonZeroU32, WatermarkError> {
    NonZeroU32::new(value).ok_or_else(|| WatermarkError::Render(format!("{} is 0", what)))
}

/// Resize an RGBA buffer with Lanczos3.
///
/// Alpha is premultiplied for the convolution and divided back out afterwards
/// so that transparent pixels do not bleed their color into glyph edges.
pub fn resize_rgba(src: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, WatermarkError> {
    let src_width = non_zero(src.width(), "Source width")?;
    let src_height = non_zero(src.height(), "Source height")?;
    let dst_width = non_zero(width, "Target width")?;
    let dst_height = non_zero(height, "Target height")?;

    let mut src_image =
        Image::from_vec_u8(src_width, src_height, src.as_raw().clone(), PixelType::U8x4)
            .map_err(|e| WatermarkError::Render(format!("Failed to create source image: {:?}", e)))?;
    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mul_div = MulDiv::default();
    mul_div
        .multiply_alpha_inplace(&mut src_image.view_mut())
        .map_err(|e| WatermarkError::Render(format!("Failed to premultiply alpha: {:?}", e)))?;

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| WatermarkError::Render(format!("Resize operation failed: {:?}", e)))?;

    mul_div
        .divide_alpha_inplace(&mut dst_image.view_mut())
        .map_err(|e| WatermarkError::Render(format!("Failed to unpremultiply alpha: {:?}", e)))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| WatermarkError::Render("Failed to create output image buffer".to_string()))
}

/// Resize an RGB frame with bilinear filtering.
pub fn resize_rgb(src: &RgbImage, width: u32, height: u32) -> Result<RgbImage, WatermarkError> {
    if src.dimensions() == (width, height) {
        return Ok(src.clone());
    }

    let src_width = non_zero(src.width(), "Source width")?;
    let src_height = non_zero(src.height(), "Source height")?;
    let dst_width = non_zero(width, "Target width")?;
    let dst_height = non_zero(height, "Target height")?;

    let src_image =
        Image::from_vec_u8(src_width, src_height, src.as_raw().clone(), PixelType::U8x3)
            .map_err(|e| WatermarkError::Render(format!("Failed to create source frame: {:?}", e)))?;
    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x3);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Bilinear));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| WatermarkError::Render(format!("Resize operation failed: {:?}", e)))?;

    RgbImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| WatermarkError::Render("Failed to create output frame buffer".to_string()))
}
