//! Thumbnail uploader integration tests with real image decoding.
//!
//! Run with: `cargo test -p intake-processing --test thumbnail_flow_test`

mod helpers;

use std::fs;

use helpers::fixtures::create_test_png;
use helpers::{test_validator, TestStorage, TEST_TIMESTAMP};
use image::GenericImageView;
use intake_processing::{ThumbnailState, ThumbnailUploader, UploadError};

#[test]
fn test_thumbnail_lands_in_its_own_directory() {
    let storage = TestStorage::new();
    let mut uploader = ThumbnailUploader::new(test_validator(&storage.path("images")));
    uploader.set_thumb_directory(storage.path("thumbs"));

    let descriptor = storage.stage("cat.png", &create_test_png(1600, 1200));
    uploader.load_image(&descriptor).unwrap();

    let original = uploader.upload_original().unwrap();
    let thumb = uploader.upload_thumbnail().unwrap();

    let expected_name = format!("thumb_{}_cat.png", TEST_TIMESTAMP);
    assert_eq!(thumb, storage.path("thumbs").join(&expected_name));
    assert_eq!(uploader.thumb_name(), Some(expected_name.as_str()));
    assert_eq!(original, storage.path(&format!("images/{}_cat.png", TEST_TIMESTAMP)));
    assert_eq!(uploader.state(), &ThumbnailState::Persisted(thumb.clone()));

    let decoded = image::load_from_memory(&fs::read(&thumb).unwrap()).unwrap();
    assert_eq!(decoded.dimensions(), (800, 600));
}

#[test]
fn test_thumbnail_from_staged_file() {
    let storage = TestStorage::new();
    let mut uploader = ThumbnailUploader::new(test_validator(&storage.path("images")));
    uploader.set_thumb_directory(storage.path("thumbs"));
    uploader.set_thumb_resolution(100, 100);

    let descriptor = storage.stage("wide.png", &create_test_png(400, 100));
    uploader.load_image(&descriptor).unwrap();

    let thumb = uploader.upload_thumbnail().unwrap();
    let decoded = image::open(&thumb).unwrap();
    assert_eq!(decoded.dimensions(), (100, 25));

    // The original is still staged.
    assert!(descriptor.temp_location.exists());
}

#[test]
fn test_rejects_non_image_extension() {
    let storage = TestStorage::new();
    let mut uploader = ThumbnailUploader::new(test_validator(&storage.base_path));

    let descriptor = storage.stage("notes.txt", b"hello");
    assert!(matches!(
        uploader.load_image(&descriptor),
        Err(UploadError::DisallowedExtension { .. })
    ));
    assert!(matches!(
        uploader.upload_thumbnail(),
        Err(UploadError::PreconditionViolation { .. })
    ));
}

#[test]
fn test_corrupt_image_reports_decode_failure() {
    let storage = TestStorage::new();
    let mut uploader = ThumbnailUploader::new(test_validator(&storage.base_path));
    uploader.set_thumb_directory(storage.path("thumbs"));

    let descriptor = storage.stage("broken.png", b"definitely not a png");
    uploader.load_image(&descriptor).unwrap();

    assert!(matches!(
        uploader.upload_thumbnail(),
        Err(UploadError::DecodeFailure(_))
    ));
    assert!(!storage.path("thumbs").exists());
}
