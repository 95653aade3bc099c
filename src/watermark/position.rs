//! Grid placement for image watermarks.
//!
//! The canvas is split into `cols x rows` cells and one watermark instance is
//! placed in each cell with random jitter and a random rotation. When the
//! text does not fit a cell, the grid shrinks along that axis so that every
//! instance gets a non-degenerate placement range.
//!
//! # Example
//!
//! ```ignore
//! use rand::{rngs::StdRng, SeedableRng};
//! use watermarker::watermark::position::{calculate_grid_positions, GridSpec, ImageDimensions, WatermarkDimensions};
//!
//! let image = ImageDimensions { width: 300, height: 200 };
//! let text = WatermarkDimensions { width: 80, height: 20 };
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let layout = calculate_grid_positions(&image, &text, GridSpec::new(3, 2, 20), &mut rng);
//! assert_eq!(layout.positions.len(), 6);
//! ```

use rand::Rng;

use crate::constants::MAX_ROTATION_DEGREES;

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the watermark to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

/// A single position where a watermark should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Top-left corner and rotation of one watermark instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
    /// Rotation in degrees, within `[-30, 30]`
    pub angle: f64,
}

/// Requested grid shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub cols: u32,
    pub rows: u32,
    /// Spacing added to the text size when the grid has to shrink
    pub spacing: u32,
}

impl GridSpec {
    pub fn new(cols: u32, rows: u32, spacing: u32) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            spacing,
        }
    }
}

/// Grid actually used, which may be smaller than requested.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub cols: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    /// One position per cell, row-major
    pub positions: Vec<GridPosition>,
}

/// Shrink one grid axis if the text does not fit its cells.
///
/// Returns the (possibly reduced) cell count and the resulting cell size.
fn fit_axis(extent: u32, count: u32, text: u32, spacing: u32) -> (u32, u32) {
    let cell = extent / count;
    if text < cell {
        return (count, cell);
    }

    let shrunk = (extent / (text + spacing).max(1)).clamp(1, count);
    (shrunk, extent / shrunk)
}

/// Pick a coordinate inside `[min, min + cell - text]`, or `min` if that
/// range is empty.
fn jitter<R: Rng + ?Sized>(rng: &mut R, min: i64, cell: u32, text: u32) -> i64 {
    let max = min + cell as i64 - text as i64;
    if max <= min {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

/// Calculate one randomized placement per grid cell.
///
/// # Arguments
///
/// * `image` - Dimensions of the target image
/// * `text` - Dimensions of the unrotated text box
/// * `grid` - Requested grid
/// * `rng` - Source of jitter and rotation
///
/// # Returns
///
/// The grid that was used and its positions. Every position keeps the text
/// box inside the image whenever the text fits the image at all.
pub fn calculate_grid_positions<R: Rng + ?Sized>(
    image: &ImageDimensions,
    text: &WatermarkDimensions,
    grid: GridSpec,
    rng: &mut R,
) -> GridLayout {
    let (cols, cell_width) = fit_axis(image.width, grid.cols.max(1), text.width, grid.spacing);
    let (rows, cell_height) = fit_axis(image.height, grid.rows.max(1), text.height, grid.spacing);

    let mut positions = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let x_min = col as i64 * cell_width as i64;
            let y_min = row as i64 * cell_height as i64;

            let x = jitter(rng, x_min, cell_width, text.width);
            let y = jitter(rng, y_min, cell_height, text.height);
            let angle = rng.gen_range(-MAX_ROTATION_DEGREES..=MAX_ROTATION_DEGREES);

            positions.push(GridPosition {
                x: x as i32,
                y: y as i32,
                angle,
            });
        }
    }

    GridLayout {
        cols,
        rows,
        cell_width,
        cell_height,
        positions,
    }
}

/// Clamp a position to ensure the watermark stays within image bounds.
///
/// When the watermark is larger than the image the position is pinned to 0.
pub fn clamp_to_bounds(
    pos: PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    let max_x = image.width as i32 - watermark.width as i32;
    let max_y = image.height as i32 - watermark.height as i32;

    PlacementPosition::new(pos.x.min(max_x).max(0), pos.y.min(max_y).max(0))
}
