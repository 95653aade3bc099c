// Constants module - centralized default values for configuration
//
// This module defines the default values used throughout the codebase.
// The watermark defaults reproduce the settings the service shipped with.

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark text
pub const DEFAULT_TEXT: &str = "https://t.me/freaksredana";

/// Default candidate fonts, tried in order
pub const DEFAULT_FONTS: &[&str] = &[
    "arial.ttf",
    "Arial.ttf",
    "DejaVuSans.ttf",
    "FreeSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:/Windows/Fonts/arial.ttf",
    "/usr/share/fonts/TTF/arial.ttf",
];

/// Directories searched for font candidates given as bare file names
pub const FONT_SEARCH_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/truetype/freefont",
    "/usr/share/fonts/TTF",
    "/System/Library/Fonts",
    "C:/Windows/Fonts",
];

/// Default base font size in pixels
pub const DEFAULT_FONT_SIZE: u32 = 72;

/// Default image font size as a fraction of the shorter image side
pub const DEFAULT_FONT_RATIO: f32 = 0.05;

/// Default RGBA watermark color
pub const DEFAULT_COLOR: [u8; 4] = [255, 255, 255, 128];

/// Default video motion amplitude in pixels
pub const DEFAULT_AMPLITUDE: u32 = 50;

/// Default orbit cycles per traversal
pub const DEFAULT_FREQUENCY: f64 = 2.0;

/// Default video blend opacity
pub const DEFAULT_OPACITY: f32 = 0.5;

/// Default video text scale
pub const DEFAULT_FONT_SCALE: f32 = 1.0;

/// Default video text stroke thickness in pixels
pub const DEFAULT_THICKNESS: u32 = 2;

/// Default padding in pixels
pub const DEFAULT_PADDING: u32 = 20;

/// Default image grid columns
pub const DEFAULT_GRID_COLS: u32 = 3;

/// Default image grid rows
pub const DEFAULT_GRID_ROWS: u32 = 2;

// =============================================================================
// Rendering constants
// =============================================================================

/// Oversampling factor for image watermark instances
pub const RENDER_SCALE: u32 = 2;

/// Alpha of image watermark glyphs (30% of full opacity)
pub const IMAGE_GLYPH_ALPHA: u8 = (255.0 * 0.3) as u8;

/// Maximum absolute rotation of image watermark instances in degrees
pub const MAX_ROTATION_DEGREES: f64 = 30.0;

/// Pixel size of video text at `font_scale` 1.0
pub const VIDEO_BASE_FONT_PX: f32 = 36.0;

/// JPEG quality of watermarked images
pub const JPEG_QUALITY: u8 = 95;

// =============================================================================
// Storage defaults
// =============================================================================

/// Default working directory for inputs and outputs
pub const DEFAULT_WORK_DIR: &str = "downloads";

/// Default scratch directory
pub const DEFAULT_TEMP_DIR: &str = "temp";

/// Default accepted file extensions
pub const DEFAULT_ALLOWED_FORMATS: &[&str] = &[".jpg", ".jpeg", ".png", ".mp4", ".mov"];

/// Prefix of watermarked output files
pub const OUTPUT_PREFIX: &str = "watermarked_";

// =============================================================================
// Video defaults
// =============================================================================

/// Frame rate used when the input does not report one
pub const FALLBACK_FRAME_RATE: &str = "30";
