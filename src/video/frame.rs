//! Frame geometry helpers

use image::imageops;
use image::RgbImage;

use super::backend::VideoInfo;
use crate::error::WatermarkError;
use crate::watermark::resample::resize_rgb;

/// One decoded video frame, 8-bit RGB.
pub type Frame = RgbImage;

/// Round a dimension down to an even number, keeping it at least 2.
fn even(value: u32) -> u32 {
    (value & !1).max(2)
}

/// Output dimensions for a probed video.
///
/// Square mode uses the shorter side for both axes. Both axes are rounded
/// down to even numbers so the encoder can use 4:2:0 chroma.
pub fn output_dimensions(info: &VideoInfo, square: bool) -> (u32, u32) {
    if square {
        let side = even(info.width.min(info.height));
        (side, side)
    } else {
        (even(info.width), even(info.height))
    }
}

/// Centered square crop with side `min(w, h)`.
pub fn center_crop_square(frame: &Frame) -> Frame {
    let (w, h) = frame.dimensions();
    let side = w.min(h);
    let x = (w - side) / 2;
    let y = (h - side) / 2;
    imageops::crop_imm(frame, x, y, side, side).to_image()
}

/// Bring a decoded frame to the output geometry.
///
/// Square mode crops the center square first; the result is resized when it
/// does not already match `(width, height)`.
pub fn fit_frame(frame: Frame, square: bool, width: u32, height: u32) -> Result<Frame, WatermarkError> {
    let frame = if square && frame.width() != frame.height() {
        center_crop_square(&frame)
    } else {
        frame
    };

    if frame.dimensions() == (width, height) {
        Ok(frame)
    } else {
        resize_rgb(&frame, width, height)
    }
}
