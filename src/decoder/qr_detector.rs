// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection
//!
//! This module implements QR code decoding using the rqrr crate. Frames
//! are converted to grayscale and searched for finder patterns. rqrr
//! locates codes at any rotation, so `allow_rotated` needs no extra pass.
//! `try_harder` adds an Otsu-binarised pass for low-contrast frames, and
//! `allow_inverted` adds a pass with inverted polarity.

use super::BarcodeDecoder;
use super::types::{DecodeResult, DecoderConfig, Symbology, TextEncoding};
use crate::processor::PixelBuffer;
use image::GrayImage;
use rqrr::PreparedImage;
use tracing::{debug, trace};

/// QR code decoder backed by rqrr
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// False when the allow-list excludes QR codes
    enabled: bool,
    try_harder: bool,
    allow_inverted: bool,
    encoding: TextEncoding,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new(&DecoderConfig::qr_only())
    }
}

impl QrDetector {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            enabled: config.allows(Symbology::QrCode),
            try_harder: config.try_harder,
            allow_inverted: config.allow_inverted,
            encoding: config.character_set,
        }
    }

    /// Run the grayscale, binarised and inverted passes in order
    fn decode_luma(&self, luma: &GrayImage) -> Option<String> {
        let width = luma.width() as usize;
        let height = luma.height() as usize;
        let raw = luma.as_raw();
        let at = |x: usize, y: usize| raw[y * width + x];

        if let Some(text) = self.run_pass("greyscale", width, height, at) {
            return Some(text);
        }

        if self.try_harder {
            let threshold = otsu_threshold(raw);
            let binarised = |x, y| if at(x, y) < threshold { 0 } else { 255 };
            if let Some(text) = self.run_pass("otsu", width, height, binarised) {
                return Some(text);
            }
        }

        if self.allow_inverted {
            if let Some(text) = self.run_pass("inverted", width, height, |x, y| 255 - at(x, y)) {
                return Some(text);
            }
        }

        None
    }

    /// Detect grids in one prepared image and decode the first readable one
    fn run_pass<F>(&self, pass: &str, width: usize, height: usize, fill: F) -> Option<String>
    where
        F: FnMut(usize, usize) -> u8,
    {
        let mut prepared = PreparedImage::prepare_from_greyscale(width, height, fill);
        let grids = prepared.detect_grids();
        trace!(pass, grids = grids.len(), "QR grid detection complete");

        for grid in grids {
            let mut payload = Vec::new();
            match grid.decode_to(&mut payload) {
                Ok(_meta) => {
                    debug!(pass, bytes = payload.len(), "Decoded QR grid");
                    return Some(self.encoding.decode(&payload));
                }
                Err(e) => debug!(pass, error = ?e, "Failed to decode QR grid"),
            }
        }
        None
    }
}

impl BarcodeDecoder for QrDetector {
    fn name(&self) -> &'static str {
        "rqrr"
    }

    fn supports(&self, symbology: Symbology) -> bool {
        symbology == Symbology::QrCode
    }

    fn decode(&self, buffer: &PixelBuffer) -> Option<DecodeResult> {
        if !self.enabled || buffer.is_empty() {
            return None;
        }

        let start = std::time::Instant::now();
        let text = self.decode_luma(&buffer.to_luma());
        trace!(
            width = buffer.width(),
            height = buffer.height(),
            found = text.is_some(),
            decode_ms = start.elapsed().as_millis() as u64,
            "QR decode pass finished"
        );

        text.map(|text| DecodeResult::new(text, Symbology::QrCode))
    }
}

/// Global threshold maximising between-class variance
fn otsu_threshold(grey: &[u8]) -> u8 {
    let mut hist = [0u32; 256];
    for &p in grey {
        hist[p as usize] += 1;
    }

    let total = grey.len() as f64;
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut best_threshold = 0u8;
    let mut best_variance = 0.0f64;
    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;

    for (t, &count) in hist.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }

        sum_bg += t as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let variance = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);

        if variance > best_variance {
            best_variance = variance;
            // Pixels strictly below the threshold are dark
            best_threshold = (t + 1).min(255) as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otsu_threshold_bimodal() {
        let mut grey = Vec::new();
        grey.extend((0..50).map(|i| i as u8));
        grey.extend((0..50).map(|i| (200 + i % 56) as u8));

        let t = otsu_threshold(&grey);
        assert!(t > 49 && t <= 200, "otsu threshold was {}", t);
    }

    #[test]
    fn test_uniform_buffers_never_match() {
        let detector = QrDetector::new(&DecoderConfig::default());
        for color in [[0, 0, 0, 255], [255, 255, 255, 255], [128, 64, 200, 255]] {
            let buffer = PixelBuffer::filled(200, 200, color);
            assert_eq!(detector.decode(&buffer), None);
        }
    }

    #[test]
    fn test_disabled_when_qr_not_allowed() {
        let config = DecoderConfig::default().with_formats([Symbology::Ean13]);
        let detector = QrDetector::new(&config);
        assert!(!detector.enabled);
        // Uniform buffer is enough: a disabled detector never runs rqrr
        assert!(detector.decode(&PixelBuffer::filled(120, 120, [255; 4])).is_none());
    }
}
