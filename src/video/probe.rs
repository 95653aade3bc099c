//! ffprobe output parsing

use serde::Deserialize;
use std::path::Path;

use super::backend::VideoInfo;
use crate::constants::FALLBACK_FRAME_RATE;
use crate::error::WatermarkError;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
    tags: Option<StreamTags>,
    side_data_list: Option<Vec<SideData>>,
}

#[derive(Debug, Deserialize)]
struct StreamTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SideData {
    rotation: Option<f64>,
}

/// Parse a frame rate string (e.g. "30/1" or "30000/1001").
///
/// Returns `None` for zero, negative or malformed rates.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.trim().parse().ok()?;
        let den: f64 = den_str.trim().parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        rate.trim().parse().ok()?
    };

    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Normalize a rotation in degrees to `0..360`, snapped to whole degrees.
fn normalize_rotation(degrees: f64) -> i32 {
    (degrees.round() as i32).rem_euclid(360)
}

/// Build [`VideoInfo`] from `ffprobe -print_format json -show_streams -show_format`
/// output.
pub fn parse_probe_output(json: &str, path: &Path) -> Result<VideoInfo, WatermarkError> {
    let probe: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| WatermarkError::decode(path, format!("Invalid ffprobe output: {}", e)))?;

    let streams = probe.streams.unwrap_or_default();
    let video_stream = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| WatermarkError::decode(path, "No video stream found"))?;
    let has_audio = streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let (coded_width, coded_height) = match (video_stream.width, video_stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(WatermarkError::decode(path, "Video stream has no dimensions")),
    };

    // Prefer r_frame_rate, then avg_frame_rate
    let (frame_rate, fps) = [&video_stream.r_frame_rate, &video_stream.avg_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|rate| parse_frame_rate(rate).map(|fps| (rate.clone(), fps)))
        .unwrap_or_else(|| {
            tracing::debug!(path = %path.display(), "No usable frame rate, using fallback");
            (FALLBACK_FRAME_RATE.to_string(), 30.0)
        });

    let duration = video_stream
        .duration
        .as_ref()
        .or(probe.format.as_ref().and_then(|f| f.duration.as_ref()))
        .and_then(|d| d.parse::<f64>().ok());

    let frame_count = video_stream
        .nb_frames
        .as_ref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .or_else(|| duration.map(|d| (d * fps).round().max(0.0) as u64))
        .unwrap_or(0);

    let rotation = video_stream
        .tags
        .as_ref()
        .and_then(|t| t.rotate.as_ref())
        .and_then(|r| r.parse::<f64>().ok())
        .or_else(|| {
            video_stream
                .side_data_list
                .iter()
                .flatten()
                .find_map(|sd| sd.rotation)
        })
        .map(normalize_rotation)
        .unwrap_or(0);

    let (width, height) = if rotation == 90 || rotation == 270 {
        (coded_height, coded_width)
    } else {
        (coded_width, coded_height)
    };

    Ok(VideoInfo {
        width,
        height,
        frame_rate,
        fps,
        frame_count,
        has_audio,
        rotation,
    })
}
