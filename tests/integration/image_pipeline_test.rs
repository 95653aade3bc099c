//! Image pipeline end to end: staged file in, flattened JPEG out.

use super::test_harness::{checkered_png, solid_jpeg, TestEnv};
use image::{ColorType, GenericImageView};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use watermarker::config::Config;
use watermarker::pipeline::unique_ids;
use watermarker::video::MockVideoBackend;
use watermarker::{MediaKind, WatermarkError};

fn env() -> TestEnv {
    TestEnv::new(Arc::new(MockVideoBackend::new(16, 16, 1, false)))
}

fn dark_text_env() -> TestEnv {
    let mut config = Config::default();
    config.watermark.color = [0, 0, 0, 255];
    TestEnv::with_config(config, Arc::new(MockVideoBackend::new(16, 16, 1, false)))
}

#[test]
fn test_photo_is_watermarked_into_work_dir() {
    let env = dark_text_env();
    let input = env.stage("AgAD1", MediaKind::Photo, &solid_jpeg(640, 480, [255, 255, 255]));

    let output = env.watermarker.process(MediaKind::Photo, "AgAD1").unwrap();

    assert_eq!(output, env.work_dir().join("watermarked_AgAD1.jpg"));
    let decoded = image::open(&output).unwrap();
    assert_eq!(decoded.dimensions(), (640, 480));
    assert_eq!(decoded.color(), ColorType::Rgb8);

    // Some pixels must have been darkened by the text
    let rgb = decoded.to_rgb8();
    assert!(rgb.pixels().any(|p| p[0] < 250));

    // The input stays for the caller; nothing else is left behind
    assert!(input.exists());
    assert_eq!(env.work_files(), vec!["AgAD1.jpg", "watermarked_AgAD1.jpg"]);
    assert!(env.temp_files().is_empty());
}

#[test]
fn test_transparent_png_is_flattened_onto_white() {
    let env = env();
    env.stage("sticker", MediaKind::Photo, &checkered_png(64, 64));

    let output = env.watermarker.process(MediaKind::Photo, "sticker").unwrap();
    let decoded = image::open(&output).unwrap().to_rgb8();

    assert_eq!(decoded.dimensions(), (64, 64));
    // Center of a fully transparent 8x8 block
    let p = decoded.get_pixel(12, 4);
    assert!(p.0.iter().all(|&c| c >= 240), "pixel = {:?}", p);
    // Center of an opaque blue block keeps its blue
    let p = decoded.get_pixel(4, 4);
    assert!(p[2] > 200 && p[0] < 140, "pixel = {:?}", p);
}

#[test]
fn test_already_watermarked_photo_can_be_watermarked_again() {
    let env = dark_text_env();
    env.stage("first", MediaKind::Photo, &solid_jpeg(320, 240, [200, 220, 240]));
    let first = env.watermarker.process(MediaKind::Photo, "first").unwrap();

    let bytes = std::fs::read(&first).unwrap();
    env.stage("second", MediaKind::Photo, &bytes);
    let second = env.watermarker.process(MediaKind::Photo, "second").unwrap();

    assert_eq!(image::open(&second).unwrap().dimensions(), (320, 240));
}

#[test]
fn test_same_seed_gives_identical_output() {
    let env = dark_text_env();
    env.stage("a", MediaKind::Photo, &solid_jpeg(300, 300, [255, 255, 255]));
    env.stage("b", MediaKind::Photo, &solid_jpeg(300, 300, [255, 255, 255]));

    let a = env
        .watermarker
        .process_with_rng(MediaKind::Photo, "a", &mut StdRng::seed_from_u64(5))
        .unwrap();
    let b = env
        .watermarker
        .process_with_rng(MediaKind::Photo, "b", &mut StdRng::seed_from_u64(5))
        .unwrap();

    assert_eq!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
}

#[test]
fn test_corrupt_photo_fails_without_output() {
    let env = env();
    env.stage("broken", MediaKind::Photo, b"definitely not an image");

    let result = env.watermarker.process(MediaKind::Photo, "broken");

    assert!(matches!(result, Err(WatermarkError::Decode { .. })));
    assert_eq!(env.work_files(), vec!["broken.jpg"]);
}

#[test]
fn test_missing_photo_is_decode_error() {
    let env = env();
    let result = env.watermarker.process(MediaKind::Photo, "nothing-here");

    assert!(matches!(result, Err(WatermarkError::Decode { .. })));
    assert!(env.work_files().is_empty());
}

#[test]
fn test_process_path_reads_from_anywhere() {
    let env = env();
    let outside = env.dir.path().join("holiday.png");
    std::fs::write(&outside, checkered_png(40, 30)).unwrap();

    let output = env
        .watermarker
        .process_path(MediaKind::Photo, &outside)
        .unwrap();

    assert_eq!(output, env.work_dir().join("watermarked_holiday.jpg"));
    assert!(outside.exists());
}

#[test]
fn test_concurrent_invocations_do_not_interfere() {
    let env = dark_text_env();
    let ids: Vec<String> = (0..6).map(|i| format!("photo{}", i)).collect();
    for (i, id) in ids.iter().enumerate() {
        env.stage(id, MediaKind::Photo, &solid_jpeg(200 + i as u32 * 10, 150, [255, 255, 255]));
    }

    std::thread::scope(|scope| {
        for id in &ids {
            let watermarker = &env.watermarker;
            scope.spawn(move || watermarker.process(MediaKind::Photo, id).unwrap());
        }
    });

    for (i, id) in ids.iter().enumerate() {
        let output = env.work_dir().join(format!("watermarked_{}.jpg", id));
        assert_eq!(image::open(output).unwrap().dimensions(), (200 + i as u32 * 10, 150));
    }
}

#[test]
fn test_input_already_in_work_dir_is_left_intact() {
    let env = dark_text_env();
    // A file sitting exactly where a staged input would go
    let bytes = solid_jpeg(160, 120, [255, 255, 255]);
    let input = env.work_dir().join("cat.jpg");
    std::fs::write(&input, &bytes).unwrap();

    let output = env
        .watermarker
        .process_path_as(MediaKind::Photo, &input, "cat")
        .unwrap();

    assert_eq!(output, env.work_dir().join("watermarked_cat.jpg"));
    assert_eq!(std::fs::read(&input).unwrap(), bytes);
    assert_eq!(env.work_files(), vec!["cat.jpg", "watermarked_cat.jpg"]);
}

#[test]
fn test_same_stem_inputs_get_separate_outputs() {
    let env = dark_text_env();
    let inputs = vec![
        env.dir.path().join("a").join("IMG.jpg"),
        env.dir.path().join("b").join("IMG.jpg"),
        env.dir.path().join("IMG.png"),
    ];
    for (i, input) in inputs.iter().enumerate() {
        std::fs::create_dir_all(input.parent().unwrap()).unwrap();
        std::fs::write(input, solid_jpeg(100 + i as u32 * 20, 80, [255, 255, 255])).unwrap();
    }
    let ids = unique_ids(&inputs);

    let outputs: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .zip(&ids)
            .map(|(input, id)| {
                let watermarker = &env.watermarker;
                scope.spawn(move || watermarker.process_path_as(MediaKind::Photo, input, id).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, output) in outputs.iter().enumerate() {
        assert_eq!(image::open(output).unwrap().dimensions(), (100 + i as u32 * 20, 80));
        assert!(inputs[i].exists());
    }
    assert_eq!(
        env.work_files(),
        vec!["watermarked_IMG_0.jpg", "watermarked_IMG_1.jpg", "watermarked_IMG_2.jpg"]
    );
}

#[test]
fn test_encode_failure_leaves_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.jpg");
    std::fs::write(&input, solid_jpeg(64, 64, [255, 255, 255])).unwrap();

    // The work dir is a regular file, so the output cannot be created
    let blocker = dir.path().join("downloads");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let mut config = Config::default();
    config.storage.work_dir = blocker.clone();
    config.storage.temp_dir = dir.path().join("temp");
    let watermarker = watermarker::Watermarker::with_backend(
        config,
        Arc::new(MockVideoBackend::new(16, 16, 1, false)),
    )
    .unwrap();

    let result = watermarker.process_path(MediaKind::Photo, &input);

    assert!(matches!(result, Err(WatermarkError::Encode { .. })));
    assert_eq!(std::fs::read(&blocker).unwrap(), b"not a directory");
    assert!(input.exists());
    let mut left: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    left.sort();
    assert_eq!(left, vec!["downloads", "photo.jpg"]);
}
