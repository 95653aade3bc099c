//! Image watermarking: grid of rotated instances, flattened JPEG output.

use image::codecs::jpeg::JpegEncoder;
use image::io::Reader as ImageReader;
use image::{ColorType, DynamicImage, ImageEncoder, RgbImage};
use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::artifacts::{ArtifactPaths, TempArtifacts};
use crate::config::WatermarkConfig;
use crate::constants::{IMAGE_GLYPH_ALPHA, JPEG_QUALITY};
use crate::error::{Result, WatermarkError};
use crate::watermark::{
    alpha_composite, calculate_grid_positions, flatten_onto_white, FontResolver, GridSpec,
    ImageDimensions, InstanceRenderer, Overlay, PlacementPosition, WatermarkDimensions,
};

/// Watermark a decoded image and flatten it onto white.
///
/// The font size follows the shorter image side; one rotated instance is
/// drawn per grid cell.
pub fn watermark_image<R: Rng + ?Sized>(
    image: &DynamicImage,
    config: &WatermarkConfig,
    fonts: &FontResolver,
    rng: &mut R,
) -> Result<RgbImage> {
    let (width, height) = (image.width(), image.height());

    let font_px = config.image_font_size(width, height);
    let font = fonts.resolve(font_px as f32);
    let renderer = InstanceRenderer::new(&font, &config.text, config.rgb(), IMAGE_GLYPH_ALPHA)?;
    let (text_width, text_height) = renderer.text_size();

    let layout = calculate_grid_positions(
        &ImageDimensions { width, height },
        &WatermarkDimensions {
            width: text_width,
            height: text_height,
        },
        GridSpec::new(config.grid_cols, config.grid_rows, config.padding),
        rng,
    );

    tracing::debug!(
        width,
        height,
        font_px,
        text_width,
        text_height,
        cols = layout.cols,
        rows = layout.rows,
        "Placing image watermarks"
    );

    let mut overlay = Overlay::new(width, height);
    for pos in &layout.positions {
        let instance = renderer.render(pos.angle)?;
        overlay.paste_masked(&instance, PlacementPosition::new(pos.x, pos.y));
    }

    let mut rgba = image.to_rgba8();
    alpha_composite(&mut rgba, overlay.as_image());
    Ok(flatten_onto_white(&rgba))
}

/// Decode an image file, guessing the format from its contents.
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .map_err(|e| WatermarkError::decode(path, e))?
        .with_guessed_format()
        .map_err(|e| WatermarkError::decode(path, e))?
        .decode()
        .map_err(|e| WatermarkError::decode(path, e))
}

/// Encode as baseline JPEG with full-resolution chroma.
pub fn encode_jpeg(image: &RgbImage, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| WatermarkError::encode(path, e))?;
    let mut writer = BufWriter::new(file);

    let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
    encoder
        .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
        .map_err(|e| WatermarkError::encode(path, e))?;

    writer.flush().map_err(|e| WatermarkError::encode(path, e))
}

/// Watermark `paths.input` into `paths.output`.
///
/// A partially written output is removed when encoding fails.
pub fn process_image<R: Rng + ?Sized>(
    config: &WatermarkConfig,
    fonts: &FontResolver,
    paths: &ArtifactPaths,
    rng: &mut R,
) -> Result<PathBuf> {
    let image = decode_image(&paths.input)?;
    let watermarked = watermark_image(&image, config, fonts, rng)?;

    let mut guard = TempArtifacts::new([&paths.output]);
    encode_jpeg(&watermarked, &paths.output)?;
    guard.keep(&paths.output);

    Ok(paths.output.clone())
}
