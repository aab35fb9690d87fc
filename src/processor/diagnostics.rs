// SPDX-License-Identifier: GPL-3.0-only

//! Frame brightness diagnostics
//!
//! Cheap sampling run on frames that failed to decode, to tell "no code in
//! view" apart from "camera is delivering black frames".

use super::buffer::PixelBuffer;
use crate::constants::diagnostics::{
    BLACK_LEVEL, SAMPLE_COUNT, TOO_BRIGHT, TOO_DARK, WHITE_LEVEL,
};

/// Coarse exposure classification of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// Every sample is black (covered lens, uninitialised texture)
    AllBlack,
    /// Every sample is white (blown out, blank texture)
    AllWhite,
    TooDark,
    TooBright,
    Normal,
}

impl Exposure {
    /// Human readable hint for failure diagnostics
    pub fn hint(&self) -> &'static str {
        match self {
            Self::AllBlack => "image appears to be all black",
            Self::AllWhite => "image appears to be all white",
            Self::TooDark => "image too dark, more lighting needed",
            Self::TooBright => "image too bright, reduce lighting or exposure",
            Self::Normal => "move the code closer and ensure good lighting",
        }
    }
}

/// Brightness statistics over an evenly spaced pixel sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Mean of `(r + g + b) / 3` over the sample
    pub average_brightness: f32,
    /// Samples darker than the black level
    pub black_samples: usize,
    /// Samples brighter than the white level
    pub white_samples: usize,
    /// Number of pixels sampled
    pub samples: usize,
}

impl FrameStats {
    /// Sample up to [`SAMPLE_COUNT`] evenly spaced pixels
    pub fn sample(buffer: &PixelBuffer) -> Self {
        let pixel_count = buffer.len();
        if pixel_count == 0 {
            return Self {
                average_brightness: 0.0,
                black_samples: 0,
                white_samples: 0,
                samples: 0,
            };
        }

        let step = (pixel_count / SAMPLE_COUNT).max(1);
        let mut total = 0.0;
        let mut black_samples = 0;
        let mut white_samples = 0;
        let mut samples = 0;

        for px in buffer.pixels().chunks_exact(4).step_by(step) {
            let brightness = (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0;
            total += brightness;
            if brightness < BLACK_LEVEL {
                black_samples += 1;
            }
            if brightness > WHITE_LEVEL {
                white_samples += 1;
            }
            samples += 1;
        }

        Self {
            average_brightness: total / samples as f32,
            black_samples,
            white_samples,
            samples,
        }
    }

    pub fn exposure(&self) -> Exposure {
        if self.samples > 0 && self.black_samples == self.samples {
            Exposure::AllBlack
        } else if self.samples > 0 && self.white_samples == self.samples {
            Exposure::AllWhite
        } else if self.average_brightness < TOO_DARK {
            Exposure::TooDark
        } else if self.average_brightness > TOO_BRIGHT {
            Exposure::TooBright
        } else {
            Exposure::Normal
        }
    }
}
