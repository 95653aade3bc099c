//! Watermark rendering engine.
//!
//! This module holds the pieces shared by the image and video pipelines:
//!
//! - **Font resolution** with an embedded fallback font
//! - **Grid placement** with random jitter and rotation for images
//! - **Floating placement** that orbits the frame center for videos
//! - **Text rendering**: oversampled rotated instances and stroked masks
//! - **Compositing**: alpha "over", flatten onto white, weighted frame blend
//!
//! Everything here is synchronous and side-effect free apart from logging;
//! file handling lives in [`crate::pipeline`].

pub mod compositor;
pub mod font;
pub mod motion;
pub mod position;
pub mod resample;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{alpha_composite, blend_frames, flatten_onto_white, stamp_mask, Overlay};
pub use font::{embedded_font, FontResolver, FontSource, SizedFont};
pub use motion::{floating_offset, floating_position, MotionParams};
pub use position::{
    calculate_grid_positions, clamp_to_bounds, GridLayout, GridPosition, GridSpec,
    ImageDimensions, PlacementPosition, WatermarkDimensions,
};
pub use text_renderer::{
    dilate_mask, measure_text, rasterize_mask, render_stroked_mask, render_text, rotate_image,
    InstanceRenderer,
};
