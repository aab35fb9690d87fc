// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanning image files
//!
//! This module provides command-line functionality for:
//! - Scanning an image once
//! - Watching an image file that another program keeps overwriting
//! - Saving the converted frame for inspection
//! - Printing or writing the configuration

use barscan::backends::source::ImageFileSource;
use barscan::constants::file_formats;
use barscan::decoder::Symbology;
use barscan::scanner::{LoopAction, RetryPolicy, ScanLoopController, ScanOutcome, Scanner};
use barscan::sink::ResultSink;
use barscan::{ScanConfig, TracingSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;

/// Config overrides shared by every command
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub formats: Vec<Symbology>,
    pub no_flip: bool,
    pub downscale: Option<u32>,
    pub debug_dir: Option<PathBuf>,
    pub interval: Option<f32>,
}

/// Prints results to stdout and diagnostics to stderr
struct ConsoleSink;

impl ResultSink for ConsoleSink {
    fn report(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn report_result(&self, text: &str, format: Symbology) {
        println!("{}: {}", format, text);
        TracingSink.report_result(text, format);
    }
}

/// Load the config file and apply command-line overrides
pub fn load_config(overrides: &Overrides) -> Result<ScanConfig, Box<dyn std::error::Error>> {
    let mut config = match &overrides.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::load_or_default()?,
    };

    if !overrides.formats.is_empty() {
        config.decoder = config.decoder.with_formats(overrides.formats.iter().copied());
    }
    if overrides.no_flip {
        config.retry = RetryPolicy::Disabled;
    }
    if let Some(max_dimension) = overrides.downscale {
        config.downscale_enabled = true;
        config.max_dimension = max_dimension;
    }
    if let Some(dir) = &overrides.debug_dir {
        config.debug_dir = Some(dir.clone());
    }
    if let Some(interval) = overrides.interval {
        config.interval_secs = interval;
    }

    config.validate()?;
    Ok(config)
}

fn check_image(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(file_formats::is_image_extension);
    if !supported {
        return Err(format!(
            "unsupported image {} (expected one of: {})",
            path.display(),
            file_formats::IMAGE_EXTENSIONS.join(", ")
        )
        .into());
    }
    Ok(())
}

fn build_scanner(config: &ScanConfig, image: &Path) -> Scanner {
    Scanner::new(config, ImageFileSource::new(image), Arc::new(ConsoleSink))
}

/// Scan an image once
pub fn scan(image: &Path, overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    check_image(image)?;
    let config = load_config(overrides)?;
    let mut scanner = build_scanner(&config, image);

    match scanner.scan_once()? {
        ScanOutcome::Decoded { .. } => Ok(()),
        ScanOutcome::NotFound { attempts, .. } => {
            Err(format!("no barcode found after {} attempts", attempts).into())
        }
    }
}

/// Keep scanning an image file until Ctrl-C or `count` results
pub fn watch(
    image: &Path,
    count: Option<usize>,
    overrides: &Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    check_image(image)?;
    let config = ScanConfig {
        auto_start: true,
        startup_delay_secs: 0.0,
        ..load_config(overrides)?
    };
    let scanner = build_scanner(&config, image);

    let (done, finished) = mpsc::channel::<()>();
    let interrupted = done.clone();
    ctrlc::set_handler(move || {
        let _ = interrupted.send(());
    })?;

    let mut decoded = 0;
    let controller = ScanLoopController::start_with_observer("watch", scanner, move |outcome| {
        if let Ok(ScanOutcome::Decoded { .. }) = outcome {
            decoded += 1;
            if count.is_some_and(|n| decoded >= n) {
                let _ = done.send(());
                return LoopAction::Stop;
            }
        }
        LoopAction::Continue
    });

    println!(
        "Watching {} every {}s (Ctrl-C to stop)",
        image.display(),
        config.interval_secs
    );
    // Either sender firing ends the watch
    let _ = finished.recv();

    if let Some(scanner) = controller.stop() {
        let stats = scanner.stats();
        println!(
            "Scanned {} frames: {} decoded, {} without a barcode, {} errors",
            stats.scans, stats.decoded, stats.not_found, stats.errors
        );
    }
    Ok(())
}

/// Convert an image the way the scanner sees it and save it as PNG
pub fn save(image: &Path, overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    check_image(image)?;
    let config = load_config(overrides)?;
    let mut scanner = build_scanner(&config, image);
    scanner.save_current_frame()?;
    Ok(())
}

/// Print the effective configuration, optionally writing it to disk
pub fn config(write: bool, overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    println!("{}", serde_json::to_string_pretty(&config)?);

    if write {
        let path = match &overrides.config {
            Some(path) => path.clone(),
            None => ScanConfig::default_path().ok_or("no config directory on this platform")?,
        };
        config.save(&path)?;
        eprintln!("Configuration written to {}", path.display());
    }
    Ok(())
}
