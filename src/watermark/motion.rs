//! Floating watermark placement for video frames.
//!
//! The watermark orbits the frame center once per `1 / frequency` of the
//! video, with a radius that slowly breathes between 0 and the amplitude and
//! an extra vertical bob. The result depends only on its arguments.

use std::f64::consts::PI;

use super::position::{clamp_to_bounds, ImageDimensions, PlacementPosition, WatermarkDimensions};

/// Motion parameters taken from the watermark configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    /// Maximum orbit radius in pixels
    pub amplitude: f64,
    /// Orbit cycles per traversal of the video
    pub frequency: f64,
}

impl MotionParams {
    pub fn new(amplitude: u32, frequency: f64) -> Self {
        Self {
            amplitude: amplitude as f64,
            frequency,
        }
    }
}

/// Offset from the centered position for frame `index` of `total`.
///
/// `total == 0` is treated as a single-frame video.
pub fn floating_offset(index: u64, total: u64, motion: &MotionParams) -> (f64, f64) {
    let t = index as f64 / total.max(1) as f64 * 2.0 * PI;

    let radius = motion.amplitude * (1.0 + (0.5 * t).sin()) / 2.0;
    let dx = radius * (motion.frequency * t).cos();
    let dy = radius * (motion.frequency * t).sin();
    let wobble = 0.3 * motion.amplitude * (2.0 * t).sin();

    (dx, dy + wobble)
}

/// Top-left corner of the text box for frame `index` of `total`.
///
/// The box is centered, offset by [`floating_offset`], truncated to whole
/// pixels and clamped so that it stays inside the frame.
pub fn floating_position(
    frame: &ImageDimensions,
    text: &WatermarkDimensions,
    index: u64,
    total: u64,
    motion: &MotionParams,
) -> PlacementPosition {
    let center_x = (frame.width as i64 - text.width as i64).div_euclid(2);
    let center_y = (frame.height as i64 - text.height as i64).div_euclid(2);

    let (dx, dy) = floating_offset(index, total, motion);
    let x = (center_x as f64 + dx) as i32;
    let y = (center_y as f64 + dy) as i32;

    clamp_to_bounds(PlacementPosition::new(x, y), frame, text)
}
