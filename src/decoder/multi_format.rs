// SPDX-License-Identifier: GPL-3.0-only

//! Multi-format barcode decoding
//!
//! Uses rxing (a ZXing port) for the full symbology list. The decoder
//! config maps straight onto rxing decode hints. rxing only tries
//! rotated 1D codes internally, so `allow_rotated` adds a pass over the
//! frame turned by 90 degrees.

use super::BarcodeDecoder;
use super::types::{DecodeResult, DecoderConfig, Symbology};
use crate::processor::PixelBuffer;
use image::{GrayImage, imageops};
use rxing::{BarcodeFormat, DecodeHintValue, DecodeHints};
use std::collections::HashSet;
use tracing::trace;

/// Decoder for every supported symbology, backed by rxing
pub struct MultiFormatDecoder {
    formats: HashSet<BarcodeFormat>,
    try_harder: bool,
    allow_rotated: bool,
    allow_inverted: bool,
    character_set: &'static str,
}

impl MultiFormatDecoder {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            formats: config.formats.iter().map(|s| to_rxing(*s)).collect(),
            try_harder: config.try_harder,
            allow_rotated: config.allow_rotated,
            allow_inverted: config.allow_inverted,
            character_set: config.character_set.label(),
        }
    }

    fn hints(&self) -> DecodeHints {
        DecodeHints::default()
            .with(DecodeHintValue::TryHarder(self.try_harder))
            .with(DecodeHintValue::AlsoInverted(self.allow_inverted))
            .with(DecodeHintValue::PureBarcode(false))
            .with(DecodeHintValue::CharacterSet(self.character_set.to_string()))
            .with(DecodeHintValue::PossibleFormats(self.formats.clone()))
    }

    fn decode_luma(&self, luma: &GrayImage, pass: &str) -> Option<DecodeResult> {
        let mut hints = self.hints();
        let result = rxing::helpers::detect_in_luma_with_hints(
            luma.as_raw().clone(),
            luma.width(),
            luma.height(),
            None,
            &mut hints,
        );

        match result {
            Ok(found) => {
                let format = from_rxing(found.getBarcodeFormat())?;
                Some(DecodeResult::new(found.getText(), format))
            }
            Err(e) => {
                trace!(pass, error = %e, "rxing found no barcode");
                None
            }
        }
    }
}

impl BarcodeDecoder for MultiFormatDecoder {
    fn name(&self) -> &'static str {
        "rxing"
    }

    fn supports(&self, _symbology: Symbology) -> bool {
        true
    }

    fn decode(&self, buffer: &PixelBuffer) -> Option<DecodeResult> {
        if buffer.is_empty() || self.formats.is_empty() {
            return None;
        }

        let luma = buffer.to_luma();
        self.decode_luma(&luma, "upright").or_else(|| {
            self.allow_rotated
                .then(|| imageops::rotate90(&luma))
                .and_then(|rotated| self.decode_luma(&rotated, "rotated"))
        })
    }
}

fn to_rxing(symbology: Symbology) -> BarcodeFormat {
    match symbology {
        Symbology::QrCode => BarcodeFormat::QR_CODE,
        Symbology::Ean13 => BarcodeFormat::EAN_13,
        Symbology::Ean8 => BarcodeFormat::EAN_8,
        Symbology::UpcA => BarcodeFormat::UPC_A,
        Symbology::UpcE => BarcodeFormat::UPC_E,
        Symbology::Code128 => BarcodeFormat::CODE_128,
        Symbology::Code39 => BarcodeFormat::CODE_39,
        Symbology::Code93 => BarcodeFormat::CODE_93,
        Symbology::DataMatrix => BarcodeFormat::DATA_MATRIX,
        Symbology::Pdf417 => BarcodeFormat::PDF_417,
        Symbology::Aztec => BarcodeFormat::AZTEC,
        Symbology::Itf => BarcodeFormat::ITF,
        Symbology::Codabar => BarcodeFormat::CODABAR,
    }
}

/// Map back to our symbology; formats we never ask for are dropped
fn from_rxing(format: &BarcodeFormat) -> Option<Symbology> {
    Symbology::ALL
        .into_iter()
        .find(|s| to_rxing(*s) == *format)
}
