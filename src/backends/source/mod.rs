// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources
//!
//! A [`FrameSource`] hands out the latest available frame on demand. The
//! scanner never reaches for a global camera or texture; whatever produces
//! frames is injected through this trait.

pub mod file_source;
pub mod format_converters;
pub mod types;

pub use file_source::ImageFileSource;
pub use types::{FrameHandle, PixelFormat, RowOrder};

/// Supplier of frames for the scanner
pub trait FrameSource: Send {
    /// Latest available frame, or `None` when nothing is attached
    fn current_frame(&mut self) -> Option<FrameHandle>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Option<FrameHandle> + Send,
{
    fn current_frame(&mut self) -> Option<FrameHandle> {
        self()
    }
}

/// Source that always returns the same frame
///
/// Useful for still images and tests. `clear` detaches the frame.
#[derive(Debug, Clone, Default)]
pub struct StaticFrameSource {
    frame: Option<FrameHandle>,
}

impl StaticFrameSource {
    pub fn new(frame: FrameHandle) -> Self {
        Self { frame: Some(frame) }
    }

    /// Source with nothing attached
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&mut self, frame: FrameHandle) {
        self.frame = Some(frame);
    }

    pub fn clear(&mut self) {
        self.frame = None;
    }
}

impl FrameSource for StaticFrameSource {
    fn current_frame(&mut self) -> Option<FrameHandle> {
        self.frame.clone()
    }
}
