// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for frame capture
//!
//! The scanner only ever talks to the [`source::FrameSource`] trait. Live
//! cameras, still images and test fixtures all plug in here.

pub mod source;
