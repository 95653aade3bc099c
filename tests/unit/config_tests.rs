// Configuration loading and validation

use std::path::Path;
use watermarker::config::*;

#[test]
fn test_can_deserialize_full_yaml_config() {
    let yaml = r#"
watermark:
  text: "sample"
  fonts: ["DejaVuSans.ttf"]
  size: 48
  font_ratio: 0.1
  color: [0, 0, 0, 200]
  position: center
  amplitude: 10
  frequency: 0.5
  opacity: 0.25
  font_scale: 1.5
  thickness: 4
  padding: 8
  grid_cols: 5
  grid_rows: 4
storage:
  work_dir: "/tmp/wm/work"
  temp_dir: "/tmp/wm/temp"
  allowed_formats: [".png"]
"#;
    let config = Config::from_yaml_with_env(yaml).expect("Failed to parse config");

    assert_eq!(config.watermark.text, "sample");
    assert_eq!(config.watermark.fonts, vec!["DejaVuSans.ttf".to_string()]);
    assert_eq!(config.watermark.size, 48);
    assert_eq!(config.watermark.rgb(), [0, 0, 0]);
    assert_eq!(config.watermark.position, AnchorPosition::Center);
    assert_eq!(config.watermark.amplitude, 10);
    assert_eq!(config.watermark.thickness, 4);
    assert_eq!((config.watermark.grid_cols, config.watermark.grid_rows), (5, 4));
    assert_eq!(config.storage.temp_dir, Path::new("/tmp/wm/temp"));
    assert!(config.storage.is_allowed(Path::new("a.PNG")));
    assert!(!config.storage.is_allowed(Path::new("a.jpg")));
    assert!(config.validate().is_ok());
}

#[test]
fn test_unknown_anchor_is_rejected() {
    let yaml = r#"
watermark:
  position: somewhere
"#;
    assert!(Config::from_yaml_with_env(yaml).is_err());
}

#[test]
fn test_font_size_follows_shorter_side_only() {
    let config = WatermarkConfig {
        size: 20,
        ..WatermarkConfig::default()
    };
    // `size` does not bound the image font
    assert_eq!(config.image_font_size(1000, 2000), 50);
    assert_eq!(config.image_font_size(6000, 4000), 200);
    assert_eq!(config.image_font_size(200, 2000), 10);
}

#[test]
fn test_config_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "watermark:\n  text: \"from file\"\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.watermark.text, "from file");
    assert_eq!(config.watermark.opacity, 0.5);
}

#[test]
fn test_zero_grid_is_invalid() {
    let yaml = r#"
watermark:
  grid_cols: 0
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.contains("grid"), "unexpected error: {}", err);
}

#[test]
fn test_ensure_dirs_creates_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig {
        work_dir: dir.path().join("a/b/work"),
        temp_dir: dir.path().join("a/b/temp"),
        ..StorageConfig::default()
    };

    storage.ensure_dirs().unwrap();
    storage.ensure_dirs().unwrap();
    assert!(storage.work_dir.is_dir());
    assert!(storage.temp_dir.is_dir());
}
