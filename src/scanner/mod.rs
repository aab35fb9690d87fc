// SPDX-License-Identifier: GPL-3.0-only

//! Interval-driven scan loop
//!
//! [`Scanner`] owns one frame source, one decoder and one result sink. The
//! host calls [`Scanner::tick`] as often as it likes (every rendered frame,
//! every timer wakeup); at most one scan attempt runs per elapsed interval.
//!
//! ```text
//! tick ─► FrameSource ─► FrameConverter ─► decode (original, h-flip, v-flip)
//!                                              │
//!                          found ◄─────────────┴─────────► not found
//!                            │                                 │
//!                     dispatch + sink              debug dump + sink diagnostic
//! ```
//!
//! [`ScanLoopController`] runs a scanner on its own thread for hosts that
//! have no frame loop to piggyback on.

pub mod dispatch;
pub mod frame_loop;
pub mod retry;

pub use dispatch::{CodeKind, LoggingHandler, QrContent, ScanHandler};
pub use frame_loop::{LoopAction, LoopCommand, ScanLoopController};
pub use retry::{Orientation, RetryOutcome, RetryPolicy};

use crate::backends::source::FrameSource;
use crate::config::ScanConfig;
use crate::decoder::{self, BarcodeDecoder, DecodeResult};
use crate::errors::{ScanError, ScanResult};
use crate::processor::{FrameConverter, FrameStats, PixelBuffer};
use crate::sink::ResultSink;
use crate::storage::DebugImageDump;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of one scan attempt that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Decoded {
        result: DecodeResult,
        kind: CodeKind,
        orientation: Orientation,
        /// Decode calls made before the match
        attempts: u32,
    },
    NotFound {
        /// Decode calls made (original plus retries)
        attempts: u32,
        /// Where the failed frame was saved, if a dump was written
        debug_image: Option<PathBuf>,
    },
}

impl ScanOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Decoded { attempts, .. } | Self::NotFound { attempts, .. } => *attempts,
        }
    }

    pub fn result(&self) -> Option<&DecodeResult> {
        match self {
            Self::Decoded { result, .. } => Some(result),
            Self::NotFound { .. } => None,
        }
    }
}

/// Timer state of the scan loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSession {
    /// Whether ticks may start attempts
    pub enabled: bool,
    /// Minimum time between attempt starts
    pub interval: Duration,
    /// Earliest instant the next attempt may start; `None` means the next
    /// tick is due
    pub next_scan_at: Option<Instant>,
    /// Start of the most recent timed attempt
    pub last_attempt_at: Option<Instant>,
    /// Resume after an unpause
    pub auto_start: bool,
}

impl ScanSession {
    fn new(config: &ScanConfig, now: Instant) -> Self {
        Self {
            enabled: config.auto_start,
            interval: config.interval(),
            next_scan_at: config.auto_start.then(|| now + config.startup_delay()),
            last_attempt_at: None,
            auto_start: config.auto_start,
        }
    }

    /// Whether a tick at `now` should start an attempt
    pub fn is_due(&self, now: Instant) -> bool {
        self.enabled && self.next_scan_at.is_none_or(|at| now >= at)
    }

    /// Enable ticks without touching the schedule
    ///
    /// Only a session that has never attempted drops its startup deadline.
    fn start(&mut self) {
        self.enabled = true;
        if self.last_attempt_at.is_none() {
            self.next_scan_at = None;
        }
    }

    fn stop(&mut self) {
        self.enabled = false;
    }

    /// Reset the clock before an attempt runs
    fn schedule_next(&mut self, now: Instant) {
        self.last_attempt_at = Some(now);
        self.next_scan_at = Some(now + self.interval);
    }
}

/// Running totals for a scanner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Attempts started (ticks that were due, plus manual scans)
    pub scans: u64,
    pub decoded: u64,
    pub not_found: u64,
    pub errors: u64,
}

/// Frame-polling barcode scanner
pub struct Scanner {
    source: Box<dyn FrameSource>,
    decoder: Box<dyn BarcodeDecoder>,
    sink: Arc<dyn ResultSink>,
    handler: Box<dyn ScanHandler>,
    converter: FrameConverter,
    dump: DebugImageDump,
    dump_on_failure: bool,
    retry: RetryPolicy,
    session: ScanSession,
    stats: ScanStats,
}

impl Scanner {
    /// Build a scanner with the decoder the config asks for
    ///
    /// With `auto_start` the session starts enabled and the first attempt
    /// waits for the configured startup delay.
    pub fn new(
        config: &ScanConfig,
        source: impl FrameSource + 'static,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let session = ScanSession::new(config, Instant::now());

        info!(
            interval_ms = session.interval.as_millis() as u64,
            auto_start = session.auto_start,
            downscale = config.downscale_enabled,
            retry = ?config.retry,
            "Scanner created"
        );

        Self {
            source: Box::new(source),
            decoder: decoder::from_config(&config.decoder),
            sink,
            handler: Box::new(LoggingHandler),
            converter: FrameConverter::from_config(config),
            dump: DebugImageDump::new(config.debug_dir(), config.dump_naming),
            dump_on_failure: config.dump_on_failure,
            retry: config.retry,
            session,
            stats: ScanStats::default(),
        }
    }

    /// Replace the decoder built from the config
    pub fn with_decoder(mut self, decoder: impl BarcodeDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn with_handler(mut self, handler: impl ScanHandler + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Replace the debug image writer
    pub fn with_debug_dump(mut self, dump: DebugImageDump) -> Self {
        self.dump = dump;
        self
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn is_scanning(&self) -> bool {
        self.session.enabled
    }

    /// Drive the loop
    ///
    /// Returns `None` when scanning is off or the interval has not elapsed,
    /// otherwise the result of the single attempt that ran. Errors have
    /// already been logged and reported to the sink.
    pub fn tick(&mut self, now: Instant) -> Option<ScanResult<ScanOutcome>> {
        if !self.session.is_due(now) {
            return None;
        }
        self.session.schedule_next(now);
        Some(self.attempt())
    }

    /// Enable scanning
    ///
    /// The interval still counts from the last attempt's start, so
    /// restarting never runs an attempt early.
    pub fn start_scanning(&mut self) {
        if !self.session.enabled {
            info!("Scanning started");
        }
        self.session.start();
    }

    pub fn stop_scanning(&mut self) {
        if self.session.enabled {
            info!("Scanning stopped");
        }
        self.session.stop();
    }

    /// Pause for host visibility changes
    ///
    /// Unpausing only resumes sessions configured to auto start.
    pub fn set_paused(&mut self, paused: bool) {
        if paused {
            self.stop_scanning();
        } else if self.session.auto_start {
            self.start_scanning();
        }
    }

    /// Run one attempt now, ignoring the timer and the enabled flag
    pub fn scan_once(&mut self) -> ScanResult<ScanOutcome> {
        self.attempt()
    }

    /// Convert the current frame and write it to the debug directory
    pub fn save_current_frame(&mut self) -> ScanResult<PathBuf> {
        let saved = self
            .current_buffer()
            .and_then(|buffer| self.dump.dump(&buffer));

        match &saved {
            Ok(path) => self
                .sink
                .report(&format!("Frame saved to {}", path.display())),
            Err(e) => {
                warn!(error = %e, "Failed to save frame");
                self.sink.report(&format!("Could not save frame: {}", e));
            }
        }
        saved
    }

    /// Stop scanning for good
    pub fn shutdown(&mut self) {
        self.session.stop();
        info!(
            scans = self.stats.scans,
            decoded = self.stats.decoded,
            not_found = self.stats.not_found,
            errors = self.stats.errors,
            "Scanner shut down"
        );
    }

    fn attempt(&mut self) -> ScanResult<ScanOutcome> {
        self.stats.scans += 1;
        let outcome = self.scan_frame();

        match &outcome {
            Ok(ScanOutcome::Decoded { .. }) => self.stats.decoded += 1,
            Ok(ScanOutcome::NotFound { .. }) => self.stats.not_found += 1,
            Err(e) => {
                self.stats.errors += 1;
                if e.is_transient() {
                    debug!(error = %e, "Frame not available");
                } else {
                    warn!(error = %e, "Scan attempt failed");
                }
                self.sink.report(&format!("Scan failed: {}", e));
            }
        }
        outcome
    }

    fn current_buffer(&mut self) -> ScanResult<PixelBuffer> {
        let frame = self.source.current_frame().ok_or(ScanError::NoFrame)?;
        self.converter.convert(&frame)
    }

    fn scan_frame(&mut self) -> ScanResult<ScanOutcome> {
        let buffer = self.current_buffer()?;
        debug!(
            width = buffer.width(),
            height = buffer.height(),
            decoder = self.decoder.name(),
            "Scanning frame"
        );

        let retry = retry::decode_with_retry(&*self.decoder, &buffer, self.retry)?;

        match retry.found {
            Some((result, orientation)) => {
                let kind = dispatch::dispatch(&result, &*self.sink, &mut *self.handler);
                Ok(ScanOutcome::Decoded {
                    result,
                    kind,
                    orientation,
                    attempts: retry.attempts,
                })
            }
            None => Ok(self.not_found(&buffer, retry.attempts)),
        }
    }

    /// Diagnose a frame with no barcode and report it once
    fn not_found(&self, buffer: &PixelBuffer, attempts: u32) -> ScanOutcome {
        let stats = FrameStats::sample(buffer);
        let exposure = stats.exposure();
        debug!(
            attempts,
            average_brightness = stats.average_brightness,
            ?exposure,
            "No barcode detected"
        );

        let mut message = format!("No barcode detected: {}", exposure.hint());
        let debug_image = if self.dump_on_failure {
            match self.dump.dump(buffer) {
                Ok(path) => {
                    message.push_str(&format!(". Debug image saved to {}", path.display()));
                    Some(path)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to write debug image");
                    message.push_str(&format!(". Could not save debug image: {}", e));
                    None
                }
            }
        } else {
            None
        };

        self.sink.report(&message);
        ScanOutcome::NotFound {
            attempts,
            debug_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::source::{FrameHandle, StaticFrameSource};
    use crate::decoder::Symbology;
    use crate::sink::MemorySink;
    use crate::storage::{DumpNaming, FileStore, MemoryStore};

    /// Decoder with a fixed answer that counts its calls
    struct FixedDecoder {
        answer: Option<DecodeResult>,
        calls: Arc<std::sync::atomic::AtomicU32>,
    }

    impl BarcodeDecoder for FixedDecoder {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn supports(&self, _symbology: Symbology) -> bool {
            true
        }

        fn decode(&self, _buffer: &PixelBuffer) -> Option<DecodeResult> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn manual_config() -> ScanConfig {
        ScanConfig {
            auto_start: false,
            interval_secs: 1.0,
            ..ScanConfig::default()
        }
    }

    fn scanner_with(
        answer: Option<DecodeResult>,
    ) -> (Scanner, Arc<MemorySink>, Arc<MemoryStore>) {
        let sink = Arc::new(MemorySink::new());
        let store = Arc::new(MemoryStore::new());
        let frame = FrameHandle::from_rgba(120, 120, vec![255u8; 120 * 120 * 4]);
        let scanner = Scanner::new(&manual_config(), StaticFrameSource::new(frame), sink.clone())
            .with_decoder(FixedDecoder {
                answer,
                calls: Arc::default(),
            })
            .with_debug_dump(DebugImageDump::with_store(
                "/dumps",
                DumpNaming::Fixed,
                store.clone() as Arc<dyn FileStore>,
            ));
        (scanner, sink, store)
    }

    #[test]
    fn test_auto_start_waits_for_startup_delay() {
        let sink = Arc::new(MemorySink::new());
        let before = Instant::now();
        let mut scanner = Scanner::new(&ScanConfig::default(), StaticFrameSource::empty(), sink);

        assert!(scanner.is_scanning());
        assert!(scanner.tick(before).is_none());
        assert!(scanner.tick(before + Duration::from_secs(2)).is_some());
    }

    #[test]
    fn test_interval_gating() {
        let (mut scanner, _, _) = scanner_with(None);
        scanner.start_scanning();

        let t0 = Instant::now();
        assert!(scanner.tick(t0).is_some());
        assert!(scanner.tick(t0 + Duration::from_millis(500)).is_none());
        assert!(scanner.tick(t0 + Duration::from_millis(999)).is_none());
        assert!(scanner.tick(t0 + Duration::from_secs(1)).is_some());
        assert_eq!(scanner.stats().scans, 2);
    }

    #[test]
    fn test_stop_prevents_attempts() {
        let (mut scanner, _, _) = scanner_with(None);
        scanner.start_scanning();
        scanner.stop_scanning();

        let t0 = Instant::now();
        for i in 0..5 {
            assert!(scanner.tick(t0 + Duration::from_secs(i * 10)).is_none());
        }
        assert_eq!(scanner.stats().scans, 0);

        scanner.start_scanning();
        assert!(scanner.tick(t0).is_some());
    }

    #[test]
    fn test_restart_keeps_interval() {
        let (mut scanner, _, _) = scanner_with(None);
        scanner.start_scanning();

        let t0 = Instant::now();
        assert!(scanner.tick(t0).is_some());

        scanner.start_scanning();
        assert!(scanner.tick(t0 + Duration::from_millis(10)).is_none());

        scanner.stop_scanning();
        scanner.start_scanning();
        assert!(scanner.tick(t0 + Duration::from_millis(20)).is_none());

        scanner.stop_scanning();
        assert!(scanner.tick(t0 + Duration::from_secs(1)).is_none());
        scanner.start_scanning();
        assert!(scanner.tick(t0 + Duration::from_secs(1)).is_some());
        assert_eq!(scanner.stats().scans, 2);
        assert_eq!(scanner.session().last_attempt_at, Some(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_start_skips_startup_delay_before_first_attempt() {
        let sink = Arc::new(MemorySink::new());
        let mut scanner = Scanner::new(&ScanConfig::default(), StaticFrameSource::empty(), sink);
        assert!(scanner.session().next_scan_at.is_some());

        scanner.start_scanning();
        assert!(scanner.tick(Instant::now()).is_some());
    }

    /// Records which handler hook ran
    #[derive(Clone, Default)]
    struct RecordingHandler {
        seen: Arc<std::sync::Mutex<Vec<CodeKind>>>,
    }

    impl ScanHandler for RecordingHandler {
        fn handle_qr_code(&mut self, content: &QrContent) {
            self.seen.lock().unwrap().push(CodeKind::Qr(content.clone()));
        }

        fn handle_product_code(&mut self, _result: &DecodeResult) {
            self.seen.lock().unwrap().push(CodeKind::Product);
        }
    }

    #[test]
    fn test_custom_handler_receives_results() {
        let handler = RecordingHandler::default();
        let (scanner, sink, _) =
            scanner_with(Some(DecodeResult::new("4006381333931", Symbology::Ean13)));
        let mut scanner = scanner.with_handler(handler.clone());

        scanner.scan_once().unwrap();
        assert_eq!(*handler.seen.lock().unwrap(), vec![CodeKind::Product]);
        assert_eq!(sink.results().len(), 1);
    }

    #[test]
    fn test_pause_resumes_only_with_auto_start() {
        let (mut scanner, _, _) = scanner_with(None);
        scanner.start_scanning();
        scanner.set_paused(true);
        assert!(!scanner.is_scanning());
        scanner.set_paused(false);
        assert!(!scanner.is_scanning());
    }

    #[test]
    fn test_decoded_result_is_dispatched() {
        let (mut scanner, sink, store) =
            scanner_with(Some(DecodeResult::new("https://example.com", Symbology::QrCode)));

        let outcome = scanner.scan_once().unwrap();
        assert_eq!(
            outcome.result().map(|r| r.text.as_str()),
            Some("https://example.com")
        );
        assert!(matches!(
            outcome,
            ScanOutcome::Decoded {
                kind: CodeKind::Qr(QrContent::Url(_)),
                orientation: Orientation::Original,
                attempts: 1,
                ..
            }
        ));
        assert_eq!(sink.results().len(), 1);
        assert!(store.paths().is_empty());
    }

    #[test]
    fn test_not_found_reports_once_and_dumps() {
        let (mut scanner, sink, store) = scanner_with(None);

        let outcome = scanner.scan_once().unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::NotFound {
                attempts: 3,
                debug_image: Some(PathBuf::from("/dumps/debug_camera.png")),
            }
        );
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("all white"));
        assert!(messages[0].contains("/dumps/debug_camera.png"));
        assert_eq!(store.paths().len(), 1);
    }

    #[test]
    fn test_missing_frame_is_reported_and_clock_still_advances() {
        let sink = Arc::new(MemorySink::new());
        let mut scanner = Scanner::new(&manual_config(), StaticFrameSource::empty(), sink.clone());
        scanner.start_scanning();

        let t0 = Instant::now();
        assert!(matches!(scanner.tick(t0), Some(Err(ScanError::NoFrame))));
        assert!(scanner.tick(t0 + Duration::from_millis(10)).is_none());
        assert_eq!(sink.messages().len(), 1);
        assert_eq!(scanner.stats().errors, 1);
    }

    #[test]
    fn test_save_current_frame() {
        let (mut scanner, sink, store) = scanner_with(None);
        let path = scanner.save_current_frame().unwrap();

        assert_eq!(path, PathBuf::from("/dumps/debug_camera.png"));
        assert!(store.get(&path).is_some());
        assert_eq!(
            sink.messages(),
            vec!["Frame saved to /dumps/debug_camera.png".to_string()]
        );
    }
}
