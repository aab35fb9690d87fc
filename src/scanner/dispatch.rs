// SPDX-License-Identifier: GPL-3.0-only

//! Result classification and routing

use crate::decoder::{DecodeResult, Symbology};
use crate::sink::ResultSink;
use tracing::info;

/// What a QR payload looks like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrContent {
    /// `http://` or `https://` link. Never opened automatically.
    Url(String),
    /// Anything else
    Text(String),
}

impl QrContent {
    pub fn parse(content: &str) -> Self {
        if content.starts_with("http://") || content.starts_with("https://") {
            Self::Url(content.to_string())
        } else {
            Self::Text(content.to_string())
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

/// Routing category of a decoded barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeKind {
    Qr(QrContent),
    /// EAN-13, EAN-8, UPC-A, UPC-E
    Product,
    Other,
}

impl CodeKind {
    pub fn classify(result: &DecodeResult) -> Self {
        match result.format {
            Symbology::QrCode => Self::Qr(QrContent::parse(&result.text)),
            format if format.is_product() => Self::Product,
            _ => Self::Other,
        }
    }
}

/// Application hooks for decoded barcodes
///
/// The default methods only log. Override the ones you care about.
pub trait ScanHandler: Send {
    fn handle_qr_code(&mut self, content: &QrContent) {
        match content {
            QrContent::Url(url) => info!(%url, "QR code contains a URL"),
            QrContent::Text(text) => info!(%text, "QR code scanned"),
        }
    }

    fn handle_product_code(&mut self, result: &DecodeResult) {
        info!(code = %result.text, format = %result.format, "Product barcode scanned");
    }

    fn handle_other_code(&mut self, result: &DecodeResult) {
        info!(text = %result.text, format = %result.format, "Barcode scanned");
    }
}

/// Handler that keeps the default logging behaviour
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ScanHandler for LoggingHandler {}

/// Report the result to the sink and route it to the matching handler
pub fn dispatch(
    result: &DecodeResult,
    sink: &dyn ResultSink,
    handler: &mut dyn ScanHandler,
) -> CodeKind {
    sink.report_result(&result.text, result.format);

    let kind = CodeKind::classify(result);
    match &kind {
        CodeKind::Qr(content) => handler.handle_qr_code(content),
        CodeKind::Product => handler.handle_product_code(result),
        CodeKind::Other => handler.handle_other_code(result),
    }
    kind
}
