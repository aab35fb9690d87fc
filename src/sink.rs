// SPDX-License-Identifier: GPL-3.0-only

//! Result sinks
//!
//! Where scan results and diagnostics end up: a UI label, a log, a
//! database. Reporting is fire-and-forget.

use crate::decoder::Symbology;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Receiver of scan results and diagnostics
pub trait ResultSink: Send + Sync {
    /// Diagnostic message (failures, hints)
    fn report(&self, message: &str);

    /// A successfully decoded barcode
    fn report_result(&self, text: &str, format: Symbology);
}

impl<S: ResultSink + ?Sized> ResultSink for Arc<S> {
    fn report(&self, message: &str) {
        (**self).report(message)
    }

    fn report_result(&self, text: &str, format: Symbology) {
        (**self).report_result(text, format)
    }
}

/// Sink that forwards everything to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ResultSink for TracingSink {
    fn report(&self, message: &str) {
        info!(target: "barscan::report", "{}", message);
    }

    fn report_result(&self, text: &str, format: Symbology) {
        info!(target: "barscan::report", %format, text, "Barcode scanned");
    }
}

/// Entry recorded by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Message(String),
    Result { text: String, format: Symbology },
}

/// Sink that keeps every report in memory
///
/// Behaves like a result label: `last_result` is what a UI would show.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<Report>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports in arrival order
    pub fn reports(&self) -> Vec<Report> {
        self.lock().clone()
    }

    /// Diagnostic messages only
    pub fn messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|r| match r {
                Report::Message(m) => Some(m.clone()),
                Report::Result { .. } => None,
            })
            .collect()
    }

    /// Decoded results only
    pub fn results(&self) -> Vec<(String, Symbology)> {
        self.lock()
            .iter()
            .filter_map(|r| match r {
                Report::Result { text, format } => Some((text.clone(), *format)),
                Report::Message(_) => None,
            })
            .collect()
    }

    /// Most recent decoded result, formatted like a result label
    pub fn last_result(&self) -> Option<String> {
        self.results()
            .pop()
            .map(|(text, format)| format!("Result: {}\nType: {}", text, format))
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Report>> {
        // A poisoned lock only means a reporter panicked mid-push
        self.reports.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ResultSink for MemorySink {
    fn report(&self, message: &str) {
        self.lock().push(Report::Message(message.to_string()));
    }

    fn report_result(&self, text: &str, format: Symbology) {
        self.lock().push(Report::Result {
            text: text.to_string(),
            format,
        });
    }
}
