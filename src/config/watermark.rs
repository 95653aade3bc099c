//! Watermark configuration types.
//!
//! One `WatermarkConfig` drives both pipelines:
//! - image mode uses the text, fonts, size, color and grid settings
//! - video mode uses the text, color, motion, opacity, scale and thickness
//!
//! Default values are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AMPLITUDE, DEFAULT_COLOR, DEFAULT_FONTS, DEFAULT_FONT_RATIO, DEFAULT_FONT_SCALE,
    DEFAULT_FONT_SIZE, DEFAULT_FREQUENCY, DEFAULT_GRID_COLS, DEFAULT_GRID_ROWS, DEFAULT_OPACITY,
    DEFAULT_PADDING, DEFAULT_TEXT, DEFAULT_THICKNESS,
};

fn default_text() -> String {
    DEFAULT_TEXT.to_string()
}

fn default_fonts() -> Vec<String> {
    DEFAULT_FONTS.iter().map(|f| f.to_string()).collect()
}

fn default_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_font_ratio() -> f32 {
    DEFAULT_FONT_RATIO
}

fn default_color() -> [u8; 4] {
    DEFAULT_COLOR
}

fn default_amplitude() -> u32 {
    DEFAULT_AMPLITUDE
}

fn default_frequency() -> f64 {
    DEFAULT_FREQUENCY
}

fn default_opacity() -> f32 {
    DEFAULT_OPACITY
}

fn default_font_scale() -> f32 {
    DEFAULT_FONT_SCALE
}

fn default_thickness() -> u32 {
    DEFAULT_THICKNESS
}

fn default_padding() -> u32 {
    DEFAULT_PADDING
}

fn default_grid_cols() -> u32 {
    DEFAULT_GRID_COLS
}

fn default_grid_rows() -> u32 {
    DEFAULT_GRID_ROWS
}

/// Anchor hint for a single watermark.
///
/// Kept for configuration compatibility; the grid and floating placements
/// do not read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorPosition {
    TopLeft,
    TopRight,
    Center,
    BottomLeft,
    #[default]
    BottomRight,
}

/// Text watermark settings shared by the image and video pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Watermark text (default: "https://t.me/freaksredana")
    #[serde(default = "default_text")]
    pub text: String,

    /// Candidate font files, first one that loads wins
    #[serde(default = "default_fonts")]
    pub fonts: Vec<String>,

    /// Base font size in pixels; images size their text by `font_ratio` (default: 72)
    #[serde(default = "default_size")]
    pub size: u32,

    /// Image font size as a fraction of the shorter side (default: 0.05)
    #[serde(default = "default_font_ratio")]
    pub font_ratio: f32,

    /// RGBA color; image mode replaces the alpha with a fixed 30%
    #[serde(default = "default_color")]
    pub color: [u8; 4],

    /// Anchor hint (default: bottom-right)
    #[serde(default)]
    pub position: AnchorPosition,

    /// Video motion amplitude in pixels (default: 50)
    #[serde(default = "default_amplitude")]
    pub amplitude: u32,

    /// Orbit cycles per traversal of the video (default: 2.0)
    #[serde(default = "default_frequency")]
    pub frequency: f64,

    /// Video blend opacity from 0.0 to 1.0 (default: 0.5)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Video text scale (default: 1.0)
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,

    /// Video text stroke thickness in pixels (default: 2)
    #[serde(default = "default_thickness")]
    pub thickness: u32,

    /// Spacing used when the grid shrinks around oversized text (default: 20)
    #[serde(default = "default_padding")]
    pub padding: u32,

    /// Image grid columns (default: 3)
    #[serde(default = "default_grid_cols")]
    pub grid_cols: u32,

    /// Image grid rows (default: 2)
    #[serde(default = "default_grid_rows")]
    pub grid_rows: u32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: default_text(),
            fonts: default_fonts(),
            size: default_size(),
            font_ratio: default_font_ratio(),
            color: default_color(),
            position: AnchorPosition::default(),
            amplitude: default_amplitude(),
            frequency: default_frequency(),
            opacity: default_opacity(),
            font_scale: default_font_scale(),
            thickness: default_thickness(),
            padding: default_padding(),
            grid_cols: default_grid_cols(),
            grid_rows: default_grid_rows(),
        }
    }
}

impl WatermarkConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("Watermark text cannot be empty".to_string());
        }

        if self.size == 0 {
            return Err("Watermark size must be greater than 0".to_string());
        }

        if !(self.font_ratio > 0.0 && self.font_ratio <= 1.0) {
            return Err(format!(
                "Watermark font_ratio must be in (0.0, 1.0], got {}",
                self.font_ratio
            ));
        }

        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!(
                "Watermark opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            ));
        }

        if !(self.font_scale > 0.0) || !self.font_scale.is_finite() {
            return Err(format!(
                "Watermark font_scale must be positive, got {}",
                self.font_scale
            ));
        }

        if !self.frequency.is_finite() {
            return Err("Watermark frequency must be a finite number".to_string());
        }

        if self.grid_cols == 0 || self.grid_rows == 0 {
            return Err(format!(
                "Watermark grid must have at least one cell, got {}x{}",
                self.grid_cols, self.grid_rows
            ));
        }

        Ok(())
    }

    /// RGB part of the configured color.
    pub fn rgb(&self) -> [u8; 3] {
        [self.color[0], self.color[1], self.color[2]]
    }

    /// Font size for an image of the given dimensions.
    /// Image font size: `font_ratio` of the shorter side, at least 1 px.
    pub fn image_font_size(&self, width: u32, height: u32) -> u32 {
        ((width.min(height) as f32 * self.font_ratio) as u32).max(1)
    }
}
