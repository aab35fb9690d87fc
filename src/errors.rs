// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner
//!
//! None of these are fatal: the scan loop logs them, reports them to the
//! result sink and carries on with the next tick. "No barcode in this
//! frame" is not an error at all and is modelled as
//! [`ScanOutcome::NotFound`](crate::scanner::ScanOutcome::NotFound).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias using ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure of a single scan attempt or debug dump
#[derive(Debug, Error)]
pub enum ScanError {
    /// The source has no frame (nothing attached, or an empty buffer)
    #[error("no frame available from source")]
    NoFrame,

    /// The source is still warming up and reports implausibly small frames
    #[error("frame not ready yet ({width}x{height}, need width >= {min_width})")]
    FrameNotReady {
        width: u32,
        height: u32,
        min_width: u32,
    },

    /// The frame could not be turned into a pixel buffer
    #[error("frame conversion failed: {0}")]
    ConversionFailure(String),

    /// The decoding library panicked
    #[error("decoder fault: {0}")]
    DecoderFault(String),

    /// Writing a debug image failed
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding a debug image failed
    #[error("could not encode debug image: {0}")]
    Encode(#[from] image::ImageError),

    /// The threaded scan loop exited before answering
    #[error("scan loop is not running")]
    LoopStopped,
}

impl ScanError {
    /// Whether the error only means "try again on a later tick"
    ///
    /// Sources routinely produce no frame or undersized frames while a
    /// camera is starting, so those are logged at a lower level.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScanError::NoFrame | ScanError::FrameNotReady { .. })
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ScanError::NoFrame.is_transient());
        assert!(
            ScanError::FrameNotReady {
                width: 16,
                height: 16,
                min_width: 100
            }
            .is_transient()
        );
        assert!(!ScanError::ConversionFailure("bad stride".into()).is_transient());
        assert!(!ScanError::DecoderFault("boom".into()).is_transient());
    }

    #[test]
    fn test_error_messages() {
        let err = ScanError::FrameNotReady {
            width: 64,
            height: 48,
            min_width: 100,
        };
        assert_eq!(
            err.to_string(),
            "frame not ready yet (64x48, need width >= 100)"
        );

        let err = ScanError::Io {
            path: PathBuf::from("/tmp/debug_camera.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("could not write /tmp/debug_camera.png"));
    }
}
