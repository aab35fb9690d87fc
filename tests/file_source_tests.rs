// SPDX-License-Identifier: GPL-3.0-only

//! Scanning image files from disk

mod common;

use barscan::scanner::{LoopAction, ScanLoopController};
use barscan::{
    DumpNaming, ImageFileSource, MemorySink, ScanConfig, ScanError, ScanOutcome, Scanner,
    Symbology,
};
use image::{ImageFormat, RgbaImage};
use std::path::Path;
use std::sync::Arc;

const PAYLOAD: &str = "https://example.com/scan";

fn write_qr(path: &Path, format: ImageFormat) {
    let image = RgbaImage::from_raw(400, 400, common::render_qr_rgba(PAYLOAD, 400)).unwrap();
    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(image)
            .to_rgb8()
            .save_with_format(path, format)
            .unwrap(),
        _ => image.save_with_format(path, format).unwrap(),
    }
}

fn config(debug_dir: &Path) -> ScanConfig {
    ScanConfig {
        auto_start: false,
        debug_dir: Some(debug_dir.to_path_buf()),
        ..ScanConfig::default()
    }
}

#[test]
fn test_scan_png_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("code.png");
    write_qr(&file, ImageFormat::Png);

    let sink = Arc::new(MemorySink::new());
    let mut scanner = Scanner::new(&config(dir.path()), ImageFileSource::new(&file), sink.clone());

    let outcome = scanner.scan_once().unwrap();
    assert_eq!(outcome.result().map(|r| r.text.as_str()), Some(PAYLOAD));
    assert_eq!(sink.results(), vec![(PAYLOAD.to_string(), Symbology::QrCode)]);
}

#[test]
fn test_scan_jpeg_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("code.jpg");
    write_qr(&file, ImageFormat::Jpeg);

    let sink = Arc::new(MemorySink::new());
    let mut scanner = Scanner::new(&config(dir.path()), ImageFileSource::new(&file), sink);

    let outcome = scanner.scan_once().unwrap();
    assert_eq!(outcome.result().map(|r| r.text.as_str()), Some(PAYLOAD));
}

#[test]
fn test_corrupt_file_is_conversion_failure() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.png");
    std::fs::write(&file, b"\x89PNG truncated").unwrap();

    let sink = Arc::new(MemorySink::new());
    let mut scanner = Scanner::new(&config(dir.path()), ImageFileSource::new(&file), sink.clone());

    assert!(matches!(
        scanner.scan_once(),
        Err(ScanError::ConversionFailure(_))
    ));
    assert_eq!(sink.messages().len(), 1);
}

#[test]
fn test_failed_frame_dumped_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("blank.png");
    RgbaImage::from_pixel(320, 240, image::Rgba([90, 90, 90, 255]))
        .save(&file)
        .unwrap();

    let debug_dir = dir.path().join("debug");
    let config = ScanConfig {
        dump_naming: DumpNaming::Timestamped,
        ..config(&debug_dir)
    };
    let sink = Arc::new(MemorySink::new());
    let mut scanner = Scanner::new(&config, ImageFileSource::new(&file), sink);

    let Ok(ScanOutcome::NotFound {
        attempts,
        debug_image: Some(path),
    }) = scanner.scan_once()
    else {
        panic!("expected a dumped failure");
    };

    assert_eq!(attempts, 3);
    assert!(path.starts_with(&debug_dir));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
    let dumped = image::open(&path).unwrap();
    assert_eq!((dumped.width(), dumped.height()), (320, 240));
}

#[test]
fn test_watch_file_with_threaded_loop() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("code.png");
    write_qr(&file, ImageFormat::Png);

    let config = ScanConfig {
        auto_start: true,
        startup_delay_secs: 0.0,
        interval_secs: 0.05,
        ..config(dir.path())
    };
    let sink = Arc::new(MemorySink::new());
    let scanner = Scanner::new(&config, ImageFileSource::new(&file), sink.clone());

    let mut found = 0;
    let controller = ScanLoopController::start_with_observer(
        "file-watch",
        scanner,
        move |outcome| {
            if matches!(outcome, Ok(ScanOutcome::Decoded { .. })) {
                found += 1;
            }
            if found == 2 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        },
    );

    let scanner = controller.join().unwrap();
    assert_eq!(scanner.stats().decoded, 2);
    assert_eq!(sink.results().len(), 2);
}
