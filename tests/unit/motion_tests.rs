// Floating position of the video watermark

use rstest::rstest;
use watermarker::watermark::{
    floating_offset, floating_position, ImageDimensions, MotionParams, WatermarkDimensions,
};

#[rstest]
#[case(50, 2.0)]
#[case(10, 0.5)]
#[case(200, 3.0)]
#[case(0, 2.0)]
fn test_path_stays_inside_frame(#[case] amplitude: u32, #[case] frequency: f64) {
    let motion = MotionParams::new(amplitude, frequency);
    let frame = ImageDimensions {
        width: 1280,
        height: 720,
    };
    let text = WatermarkDimensions {
        width: 420,
        height: 48,
    };

    for index in 0..240 {
        let pos = floating_position(&frame, &text, index, 240, &motion);
        assert!(pos.x >= 0 && pos.x as u32 + text.width <= frame.width);
        assert!(pos.y >= 0 && pos.y as u32 + text.height <= frame.height);
    }
}

#[test]
fn test_zero_amplitude_stays_centered() {
    let motion = MotionParams::new(0, 2.0);
    let frame = ImageDimensions {
        width: 641,
        height: 481,
    };
    let text = WatermarkDimensions {
        width: 100,
        height: 20,
    };

    for index in [0, 13, 57, 99] {
        let pos = floating_position(&frame, &text, index, 100, &motion);
        assert_eq!((pos.x, pos.y), (270, 230));
    }
}

#[test]
fn test_last_frame_returns_near_start() {
    let motion = MotionParams::new(50, 2.0);
    let (sx, sy) = floating_offset(0, 120, &motion);
    let (ex, ey) = floating_offset(120, 120, &motion);

    assert!((sx - ex).abs() < 1e-6);
    assert!((sy - ey).abs() < 1e-6);
}

#[test]
fn test_consecutive_frames_move_smoothly() {
    let motion = MotionParams::new(50, 2.0);
    let frame = ImageDimensions {
        width: 1920,
        height: 1080,
    };
    let text = WatermarkDimensions {
        width: 300,
        height: 40,
    };

    let mut previous = floating_position(&frame, &text, 0, 900, &motion);
    for index in 1..900 {
        let pos = floating_position(&frame, &text, index, 900, &motion);
        assert!((pos.x - previous.x).abs() <= 2, "jump at frame {}", index);
        assert!((pos.y - previous.y).abs() <= 2, "jump at frame {}", index);
        previous = pos;
    }
}
