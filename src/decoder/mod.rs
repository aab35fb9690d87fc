// SPDX-License-Identifier: GPL-3.0-only

//! Barcode decoder adapters
//!
//! The scanner talks to decoding libraries through [`BarcodeDecoder`].
//! Decoders are configured once from a [`DecoderConfig`] and are pure
//! functions of the buffer they are handed: "nothing found" is `None`,
//! never an error.
//!
//! Backends:
//! - [`QrDetector`]: rqrr, QR codes only (always available)
//! - [`MultiFormatDecoder`]: rxing, every [`Symbology`] (`multi-format` feature)

#[cfg(feature = "multi-format")]
pub mod multi_format;
pub mod qr_detector;
pub mod types;

#[cfg(feature = "multi-format")]
pub use multi_format::MultiFormatDecoder;
pub use qr_detector::QrDetector;
pub use types::{DecodeResult, DecoderConfig, Symbology, TextEncoding};

use crate::errors::{ScanError, ScanResult};
use crate::processor::PixelBuffer;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{info, warn};

/// Adapter around a barcode decoding library
pub trait BarcodeDecoder: Send {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Whether this backend can recognise `symbology` at all
    fn supports(&self, symbology: Symbology) -> bool;

    /// Look for one barcode in the buffer
    fn decode(&self, buffer: &PixelBuffer) -> Option<DecodeResult>;
}

impl<D: BarcodeDecoder + ?Sized> BarcodeDecoder for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn supports(&self, symbology: Symbology) -> bool {
        (**self).supports(symbology)
    }

    fn decode(&self, buffer: &PixelBuffer) -> Option<DecodeResult> {
        (**self).decode(buffer)
    }
}

/// Call a decoder, turning a panic inside the library into `DecoderFault`
///
/// Third-party decoders occasionally panic on malformed input. A panic
/// must not take the scan loop down with it.
pub fn decode_guarded(
    decoder: &dyn BarcodeDecoder,
    buffer: &PixelBuffer,
) -> ScanResult<Option<DecodeResult>> {
    catch_unwind(AssertUnwindSafe(|| decoder.decode(buffer))).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!(decoder = decoder.name(), panic = %message, "Decoder panicked");
        ScanError::DecoderFault(message)
    })
}

/// Build the most capable decoder compiled into this binary
pub fn from_config(config: &DecoderConfig) -> Box<dyn BarcodeDecoder> {
    #[cfg(feature = "multi-format")]
    let decoder: Box<dyn BarcodeDecoder> = Box::new(MultiFormatDecoder::new(config));
    #[cfg(not(feature = "multi-format"))]
    let decoder: Box<dyn BarcodeDecoder> = Box::new(QrDetector::new(config));

    let unsupported: Vec<&str> = config
        .formats
        .iter()
        .filter(|s| !decoder.supports(**s))
        .map(|s| s.name())
        .collect();
    if !unsupported.is_empty() {
        warn!(
            decoder = decoder.name(),
            ?unsupported,
            "Some allowed symbologies are not supported by this build (enable the multi-format feature)"
        );
    }

    info!(
        decoder = decoder.name(),
        formats = config.formats.len(),
        try_harder = config.try_harder,
        allow_rotated = config.allow_rotated,
        allow_inverted = config.allow_inverted,
        character_set = config.character_set.label(),
        "Barcode decoder initialized"
    );

    decoder
}
