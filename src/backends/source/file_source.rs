// SPDX-License-Identifier: GPL-3.0-only

//! Image file frame source
//!
//! Serves a still image from disk as if it were a camera feed. The file is
//! re-read whenever its modification time changes, so an external tool
//! overwriting the image behaves like a new frame arriving.

use super::FrameSource;
use super::types::{FrameHandle, PixelFormat};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Frame source backed by an image file
pub struct ImageFileSource {
    path: PathBuf,
    /// Last loaded frame and the modification time it was loaded at
    cached: Option<(SystemTime, FrameHandle)>,
}

impl ImageFileSource {
    /// Create a source for an image file
    ///
    /// The file does not have to exist yet; until it does the source
    /// reports no frame.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: None,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reload(&mut self, modified: SystemTime) -> Option<FrameHandle> {
        let frame = load_image_as_frame(&self.path)?;
        self.cached = Some((modified, frame.clone()));
        Some(frame)
    }
}

impl FrameSource for ImageFileSource {
    fn current_frame(&mut self) -> Option<FrameHandle> {
        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Image file unavailable");
                self.cached = None;
                return None;
            }
        };

        match &self.cached {
            Some((at, frame)) if *at == modified => Some(frame.clone()),
            _ => self.reload(modified),
        }
    }
}

/// Load an image file as an encoded frame
///
/// The bytes are handed to the converter undecoded, the same way an MJPEG
/// camera delivers compressed frames. Returns `None` for unreadable files
/// and unsupported extensions.
pub fn load_image_as_frame(path: &Path) -> Option<FrameHandle> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        warn!(path = %path.display(), extension, "Unsupported image format");
        return None;
    }

    let format = if extension == "png" {
        PixelFormat::Png
    } else {
        PixelFormat::Jpeg
    };

    match std::fs::read(path) {
        Ok(bytes) => {
            info!(path = %path.display(), bytes = bytes.len(), "Image file loaded");
            Some(FrameHandle::encoded(format, bytes))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read image file");
            None
        }
    }
}
