//! Video watermarking: floating outlined text per frame, audio re-muxed.

use std::path::PathBuf;

use super::artifacts::{move_file, ArtifactPaths, TempArtifacts};
use crate::config::WatermarkConfig;
use crate::constants::VIDEO_BASE_FONT_PX;
use crate::error::{Result, WatermarkError};
use crate::video::{fit_frame, output_dimensions, VideoBackend};
use crate::watermark::{
    blend_frames, floating_position, render_stroked_mask, stamp_mask, FontResolver,
    ImageDimensions, MotionParams, WatermarkDimensions,
};

/// Watermark the video at `paths.input` into `paths.output`.
///
/// `square` crops every frame to its centered square, as needed for round
/// video notes. Audio is copied from the input when present; any failure to
/// do so is logged and the silent frame-only video is delivered instead.
/// Intermediate files are removed on every exit path.
pub fn process_video(
    backend: &dyn VideoBackend,
    config: &WatermarkConfig,
    fonts: &FontResolver,
    paths: &ArtifactPaths,
    square: bool,
) -> Result<PathBuf> {
    let mut guard = TempArtifacts::new(paths.produced());

    let info = backend.probe(&paths.input)?;
    let (width, height) = output_dimensions(&info, square);

    let font = fonts.resolve(VIDEO_BASE_FONT_PX * config.font_scale);
    let mask = render_stroked_mask(&font, &config.text, config.thickness)?;
    let text = WatermarkDimensions {
        width: mask.width(),
        height: mask.height(),
    };
    let frame_dims = ImageDimensions { width, height };
    let motion = MotionParams::new(config.amplitude, config.frequency);
    let rgb = config.rgb();

    tracing::debug!(
        id = %paths.id,
        backend = backend.name(),
        width,
        height,
        frame_rate = %info.frame_rate,
        frames = info.frame_count,
        has_audio = info.has_audio,
        square,
        "Watermarking video"
    );

    let mut source = backend.open_source(&paths.input, &info)?;
    let mut sink = backend.open_sink(&paths.intermediate, width, height, &info.frame_rate)?;

    let mut index = 0u64;
    while let Some(frame) = source.next_frame()? {
        let mut frame = fit_frame(frame, square, width, height)?;
        let pos = floating_position(&frame_dims, &text, index, info.frame_count, &motion);

        let mut overlay = frame.clone();
        stamp_mask(&mut overlay, &mask, pos, rgb);
        blend_frames(&overlay, &mut frame, config.opacity);

        sink.write_frame(&frame)?;
        index += 1;
    }

    // Both ends must be closed before any file is moved
    source.close()?;
    sink.finish()?;

    if index == 0 {
        return Err(WatermarkError::decode(&paths.input, "No frames decoded"));
    }
    if info.frame_count != 0 && index != info.frame_count {
        tracing::debug!(
            id = %paths.id,
            reported = info.frame_count,
            decoded = index,
            "Decoded frame count differs from probe"
        );
    }

    deliver(backend, paths, info.has_audio)?;
    guard.keep(&paths.output);

    tracing::info!(id = %paths.id, frames = index, output = %paths.output.display(), "Video watermarked");
    Ok(paths.output.clone())
}

/// Move the finished video into place, attaching the input's audio if it has
/// any.
fn deliver(backend: &dyn VideoBackend, paths: &ArtifactPaths, has_audio: bool) -> Result<()> {
    if has_audio {
        match backend.mux_audio(&paths.intermediate, &paths.input, &paths.final_temp) {
            Ok(()) => {
                std::fs::remove_file(&paths.intermediate)?;
                move_file(&paths.final_temp, &paths.output)?;
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(
                    id = %paths.id,
                    error = %e,
                    "Audio re-mux failed, delivering video without sound"
                );
            }
        }
    }

    move_file(&paths.intermediate, &paths.output)?;
    Ok(())
}
