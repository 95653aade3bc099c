//! Video pipeline against the mock backend: frame flow, audio delivery and
//! temp file cleanup on every exit path.

use super::test_harness::TestEnv;
use rstest::rstest;
use std::sync::Arc;
use watermarker::config::Config;
use watermarker::constants::VIDEO_BASE_FONT_PX;
use watermarker::video::{FailureStage, MockVideoBackend};
use watermarker::watermark::{
    floating_position, render_stroked_mask, FontResolver, ImageDimensions, MotionParams,
    WatermarkDimensions,
};
use watermarker::{MediaKind, WatermarkError};

fn setup(backend: &MockVideoBackend) -> TestEnv {
    TestEnv::new(Arc::new(backend.clone()))
}

fn frame_lines(contents: &str) -> Vec<&str> {
    contents.lines().filter(|l| l.starts_with("frame ")).collect()
}

#[test]
fn test_every_frame_is_watermarked_and_written() {
    let backend = MockVideoBackend::new(64, 48, 12, false);
    let env = setup(&backend);
    let input = env.stage("clip", MediaKind::Video, b"source video");

    let output = env.watermarker.process(MediaKind::Video, "clip").unwrap();

    assert_eq!(output, env.work_dir().join("watermarked_clip.mp4"));
    let contents = std::fs::read_to_string(&output).unwrap();
    let lines = frame_lines(&contents);
    assert_eq!(lines.len(), 12);
    assert_eq!(lines[0], "frame 0 64x48");
    assert_eq!(lines[11], "frame 11 64x48");

    let record = backend.record();
    assert_eq!(record.frames_read, 12);
    assert_eq!(record.frames_written, 12);
    assert_eq!(record.sink_dimensions, Some((64, 48)));
    assert_eq!(record.sink_frame_rate.as_deref(), Some("30/1"));
    assert_eq!(record.sources_closed, 1);
    assert_eq!(record.sinks_finished, 1);
    assert_eq!(record.mux_calls, 0);

    assert!(input.exists());
    assert!(env.temp_files().is_empty());
}

#[test]
fn test_video_note_frames_are_square() {
    let backend = MockVideoBackend::new(64, 48, 4, false);
    let env = setup(&backend);
    env.stage("note", MediaKind::VideoNote, b"round video");

    let output = env.watermarker.process(MediaKind::VideoNote, "note").unwrap();

    assert_eq!(backend.record().sink_dimensions, Some((48, 48)));
    let contents = std::fs::read_to_string(output).unwrap();
    assert!(frame_lines(&contents).iter().all(|l| l.ends_with("48x48")));
}

#[rstest]
#[case(MediaKind::Video, 63, 47, (62, 46))]
#[case(MediaKind::VideoNote, 63, 47, (46, 46))]
#[case(MediaKind::VideoNote, 35, 81, (34, 34))]
fn test_output_dimensions_are_even(
    #[case] kind: MediaKind,
    #[case] width: u32,
    #[case] height: u32,
    #[case] expected: (u32, u32),
) {
    let backend = MockVideoBackend::new(width, height, 2, false);
    let env = setup(&backend);
    env.stage("odd", kind, b"odd sized video");

    env.watermarker.process(kind, "odd").unwrap();

    assert_eq!(backend.record().sink_dimensions, Some(expected));
    assert_eq!(backend.record().frames_written, 2);
}

#[test]
fn test_audio_is_muxed_back() {
    let backend = MockVideoBackend::new(32, 32, 3, true);
    let env = setup(&backend);
    env.stage("talk", MediaKind::Video, b"video with sound");

    let output = env.watermarker.process(MediaKind::Video, "talk").unwrap();

    let contents = std::fs::read_to_string(output).unwrap();
    assert!(contents.ends_with("audio\n"));
    assert_eq!(frame_lines(&contents).len(), 3);
    assert_eq!(backend.record().mux_calls, 1);
    assert!(env.temp_files().is_empty());
    assert_eq!(env.work_files(), vec!["talk.mp4", "watermarked_talk.mp4"]);
}

#[test]
fn test_mux_failure_delivers_silent_video() {
    let backend = MockVideoBackend::new(32, 32, 3, true);
    backend.fail_at(FailureStage::Mux);
    let env = setup(&backend);
    env.stage("muted", MediaKind::Video, b"video with sound");

    let output = env.watermarker.process(MediaKind::Video, "muted").unwrap();

    let contents = std::fs::read_to_string(output).unwrap();
    assert!(!contents.contains("audio"));
    assert!(!contents.contains("partial"));
    assert_eq!(frame_lines(&contents).len(), 3);
    assert_eq!(backend.record().mux_calls, 1);
    // The partial mux output must not survive
    assert!(env.temp_files().is_empty());
}

#[rstest]
#[case::probe(FailureStage::Probe)]
#[case::open_source(FailureStage::OpenSource)]
#[case::open_sink(FailureStage::OpenSink)]
#[case::decode_first_frame(FailureStage::Decode { after: 0 })]
#[case::decode_midway(FailureStage::Decode { after: 3 })]
#[case::encode_midway(FailureStage::Encode { after: 2 })]
#[case::finish(FailureStage::Finish)]
fn test_failure_leaves_only_the_input(#[case] stage: FailureStage) {
    let backend = MockVideoBackend::new(40, 30, 6, true);
    backend.fail_at(stage);
    let env = setup(&backend);
    env.stage("fails", MediaKind::Video, b"doomed video");

    let result = env.watermarker.process(MediaKind::Video, "fails");

    assert!(result.is_err(), "stage {:?} should fail", stage);
    assert_eq!(env.work_files(), vec!["fails.mp4"]);
    assert!(env.temp_files().is_empty());
    assert_eq!(backend.record().mux_calls, 0);
}

#[test]
fn test_no_decoded_frames_is_an_error() {
    let backend = MockVideoBackend::new(32, 32, 0, false);
    let env = setup(&backend);
    env.stage("empty", MediaKind::Video, b"no frames");

    let result = env.watermarker.process(MediaKind::Video, "empty");

    assert!(matches!(result, Err(WatermarkError::Decode { .. })));
    assert_eq!(env.work_files(), vec!["empty.mp4"]);
    assert!(env.temp_files().is_empty());
}

#[test]
fn test_wrong_reported_frame_count_still_writes_every_frame() {
    let backend = MockVideoBackend::new(32, 24, 10, false).with_reported_frame_count(100);
    let env = setup(&backend);
    env.stage("guess", MediaKind::Video, b"estimated length");

    env.watermarker.process(MediaKind::Video, "guess").unwrap();

    assert_eq!(backend.record().frames_written, 10);
}

#[test]
fn test_stale_output_is_replaced() {
    let backend = MockVideoBackend::new(16, 16, 2, false);
    let env = setup(&backend);
    env.stage("again", MediaKind::Video, b"video");
    std::fs::write(env.work_dir().join("watermarked_again.mp4"), b"stale").unwrap();

    let output = env.watermarker.process(MediaKind::Video, "again").unwrap();

    let contents = std::fs::read_to_string(output).unwrap();
    assert!(!contents.contains("stale"));
    assert_eq!(frame_lines(&contents).len(), 2);
}

#[test]
fn test_missing_input_is_decode_error() {
    let backend = MockVideoBackend::new(16, 16, 2, false);
    let env = setup(&backend);

    let result = env.watermarker.process(MediaKind::VideoNote, "absent");

    assert!(matches!(result, Err(WatermarkError::Decode { .. })));
    assert!(env.work_files().is_empty());
}

#[test]
fn test_text_is_blended_where_it_floats() {
    let mut config = Config::default();
    config.watermark.text = "wm test".to_string();
    config.watermark.color = [255, 255, 255, 255];
    let wm = config.watermark.clone();

    let backend = MockVideoBackend::new(320, 240, 40, false);
    let env = TestEnv::with_config(config, Arc::new(backend.clone()));
    env.stage("float", MediaKind::Video, b"source video");

    env.watermarker.process(MediaKind::Video, "float").unwrap();
    let frames = backend.written_frames();
    assert_eq!(frames.len(), 40);

    // Same mask and motion the pipeline derives from the config
    let font = FontResolver::new(&wm.fonts).resolve(VIDEO_BASE_FONT_PX * wm.font_scale);
    let mask = render_stroked_mask(&font, &wm.text, wm.thickness).unwrap();
    let text = WatermarkDimensions {
        width: mask.width(),
        height: mask.height(),
    };
    let frame_dims = ImageDimensions {
        width: 320,
        height: 240,
    };
    let motion = MotionParams::new(wm.amplitude, wm.frequency);

    let first = floating_position(&frame_dims, &text, 0, 40, &motion);
    let quarter = floating_position(&frame_dims, &text, 10, 40, &motion);
    assert_ne!(first, quarter);

    for (index, pos) in [(0u64, first), (10, quarter)] {
        let frame = &frames[index as usize];
        let mut solid = 0;

        for (x, y, pixel) in frame.enumerate_pixels() {
            let original = [(x % 256) as u8, (y % 256) as u8, (index % 256) as u8];
            let (mx, my) = (x as i32 - pos.x, y as i32 - pos.y);
            let inside = mx >= 0 && my >= 0 && (mx as u32) < text.width && (my as u32) < text.height;

            if !inside {
                assert_eq!(pixel.0, original, "frame {} changed outside the text at ({}, {})", index, x, y);
                continue;
            }
            if mask.get_pixel(mx as u32, my as u32)[0] == 255 {
                let expected = original.map(|o| (255.0 * wm.opacity + o as f32 * (1.0 - wm.opacity)).round() as u8);
                assert_eq!(pixel.0, expected, "frame {} at ({}, {})", index, x, y);
                solid += 1;
            }
        }

        assert!(solid > 0, "frame {} has no fully covered text pixels", index);
    }
}
