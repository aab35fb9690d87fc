// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing
//!
//! Turns source frames into canonical [`PixelBuffer`]s and inspects them
//! when decoding fails.

pub mod buffer;
pub mod converter;
pub mod diagnostics;

pub use buffer::PixelBuffer;
pub use converter::FrameConverter;
pub use diagnostics::{Exposure, FrameStats};
