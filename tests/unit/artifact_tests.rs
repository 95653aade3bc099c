// Per-invocation paths and temp file cleanup

use rstest::rstest;
use std::path::Path;
use watermarker::config::StorageConfig;
use watermarker::pipeline::{move_file, sanitize_id, unique_ids, ArtifactPaths, TempArtifacts};
use watermarker::MediaKind;

fn storage() -> StorageConfig {
    StorageConfig {
        work_dir: "downloads".into(),
        temp_dir: "temp".into(),
        ..StorageConfig::default()
    }
}

#[test]
fn test_photo_paths() {
    let paths = ArtifactPaths::new(&storage(), "AgADBAAD", MediaKind::Photo);

    assert_eq!(paths.input, Path::new("downloads/AgADBAAD.jpg"));
    assert_eq!(paths.output, Path::new("downloads/watermarked_AgADBAAD.jpg"));
}

#[test]
fn test_video_note_paths() {
    let paths = ArtifactPaths::new(&storage(), "note-42", MediaKind::VideoNote);

    assert_eq!(paths.input, Path::new("downloads/note-42.mp4"));
    assert_eq!(paths.output, Path::new("downloads/watermarked_note-42.mp4"));
    assert_eq!(paths.intermediate, Path::new("temp/watermarked_note-42_temp.mp4"));
    assert_eq!(paths.final_temp, Path::new("temp/watermarked_note-42_final_temp.mp4"));
}

#[test]
fn test_identifier_cannot_escape_work_dir() {
    assert_eq!(sanitize_id("../../etc/passwd"), "______etc_passwd");
    assert_eq!(sanitize_id(""), "media");

    let paths = ArtifactPaths::new(&storage(), "../x", MediaKind::Video);
    assert_eq!(paths.input, Path::new("downloads/___x.mp4"));
}

#[test]
fn test_guard_removes_everything_but_kept_path() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.mp4");
    let b = dir.path().join("b.mp4");
    let missing = dir.path().join("never-created.mp4");
    std::fs::write(&a, b"a").unwrap();
    std::fs::write(&b, b"b").unwrap();

    {
        let mut guard = TempArtifacts::new([&a, &b, &missing]);
        guard.keep(&b);
        assert_eq!(guard.tracked().len(), 2);
    }

    assert!(!a.exists());
    assert!(b.exists());
}

#[test]
fn test_guard_cleans_up_on_early_return() {
    fn failing_step(path: &Path) -> Result<(), std::io::Error> {
        let _guard = TempArtifacts::new([path]);
        std::fs::write(path, b"partial")?;
        Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.mp4");

    assert!(failing_step(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_move_file_replaces_existing_target() {
    let dir = tempfile::tempdir().unwrap();
    let from = dir.path().join("from.mp4");
    let to = dir.path().join("to.mp4");
    std::fs::write(&from, b"new").unwrap();
    std::fs::write(&to, b"old").unwrap();

    move_file(&from, &to).unwrap();

    assert!(!from.exists());
    assert_eq!(std::fs::read(&to).unwrap(), b"new");
}

#[rstest]
#[case(&["cat.jpg", "dog.png"], &["cat", "dog"])]
#[case(&["a/IMG.jpg", "b/IMG.jpg"], &["IMG_0", "IMG_1"])]
#[case(&["x.jpg", "x.png", "y.jpg"], &["x_0", "x_1", "y"])]
#[case(&["x_1.jpg", "x.jpg", "x.png"], &["x_1", "x_1_1", "x_2"])]
#[case(&["my photo.jpg", "my_photo.jpg"], &["my_photo_0", "my_photo_1"])]
fn test_batch_identifiers_are_distinct(#[case] inputs: &[&str], #[case] expected: &[&str]) {
    let ids = unique_ids(inputs);
    assert_eq!(ids, expected);
}
