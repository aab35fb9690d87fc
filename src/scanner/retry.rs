// SPDX-License-Identifier: GPL-3.0-only

//! Mirror retry
//!
//! Some sources deliver mirrored frames (front cameras, bottom-up
//! readbacks that slipped past the converter). QR codes do not decode
//! when mirrored, so a failed frame is retried flipped horizontally and
//! then vertically.

use crate::decoder::{BarcodeDecoder, DecodeResult, decode_guarded};
use crate::errors::ScanResult;
use crate::processor::PixelBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Only try the frame as delivered
    Disabled,
    /// Also try horizontal and vertical mirrors
    #[default]
    Mirror,
}

impl RetryPolicy {
    /// Orientations tried, in order
    pub fn orientations(&self) -> &'static [Orientation] {
        match self {
            RetryPolicy::Disabled => &[Orientation::Original],
            RetryPolicy::Mirror => &[
                Orientation::Original,
                Orientation::MirroredHorizontal,
                Orientation::MirroredVertical,
            ],
        }
    }
}

/// Which copy of the frame a result was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Original,
    MirroredHorizontal,
    MirroredVertical,
}

impl Orientation {
    /// Produce the copy to decode, `None` for the original buffer
    fn apply(&self, buffer: &PixelBuffer) -> Option<PixelBuffer> {
        match self {
            Orientation::Original => None,
            Orientation::MirroredHorizontal => Some(buffer.mirrored_horizontal()),
            Orientation::MirroredVertical => Some(buffer.mirrored_vertical()),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::Original => "original",
            Orientation::MirroredHorizontal => "horizontal mirror",
            Orientation::MirroredVertical => "vertical mirror",
        };
        write!(f, "{}", name)
    }
}

/// Result of running every orientation a policy allows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    /// Decoded barcode and the orientation it came from
    pub found: Option<(DecodeResult, Orientation)>,
    /// Decode calls made (1 to 3)
    pub attempts: u32,
}

/// Decode `buffer`, retrying mirrored copies until one succeeds
///
/// A decoder panic aborts the remaining orientations and surfaces as
/// `DecoderFault`.
pub fn decode_with_retry(
    decoder: &dyn BarcodeDecoder,
    buffer: &PixelBuffer,
    policy: RetryPolicy,
) -> ScanResult<RetryOutcome> {
    let mut attempts = 0;

    for &orientation in policy.orientations() {
        attempts += 1;
        let flipped = orientation.apply(buffer);
        let candidate = flipped.as_ref().unwrap_or(buffer);

        if let Some(result) = decode_guarded(decoder, candidate)? {
            debug!(%orientation, attempts, format = %result.format, "Decoded frame");
            return Ok(RetryOutcome {
                found: Some((result, orientation)),
                attempts,
            });
        }
        debug!(%orientation, "No barcode found");
    }

    Ok(RetryOutcome {
        found: None,
        attempts,
    })
}
