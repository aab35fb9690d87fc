// SPDX-License-Identifier: GPL-3.0-only

//! Decoder configuration and result types

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Barcode symbologies the scanner can be asked to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbology {
    #[serde(rename = "QR_CODE")]
    QrCode,
    /// Most common product barcode (13 digits)
    #[serde(rename = "EAN_13")]
    Ean13,
    /// Shorter product barcode (8 digits)
    #[serde(rename = "EAN_8")]
    Ean8,
    /// North American product barcode
    #[serde(rename = "UPC_A")]
    UpcA,
    /// Compact version of UPC-A
    #[serde(rename = "UPC_E")]
    UpcE,
    #[serde(rename = "CODE_128")]
    Code128,
    #[serde(rename = "CODE_39")]
    Code39,
    #[serde(rename = "CODE_93")]
    Code93,
    #[serde(rename = "DATA_MATRIX")]
    DataMatrix,
    #[serde(rename = "PDF_417")]
    Pdf417,
    #[serde(rename = "AZTEC")]
    Aztec,
    /// Interleaved 2 of 5
    #[serde(rename = "ITF")]
    Itf,
    #[serde(rename = "CODABAR")]
    Codabar,
}

impl Symbology {
    /// Every supported symbology
    pub const ALL: [Symbology; 13] = [
        Symbology::QrCode,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::DataMatrix,
        Symbology::Pdf417,
        Symbology::Aztec,
        Symbology::Itf,
        Symbology::Codabar,
    ];

    /// Canonical upper-case name (`QR_CODE`, `EAN_13`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            Self::QrCode => "QR_CODE",
            Self::Ean13 => "EAN_13",
            Self::Ean8 => "EAN_8",
            Self::UpcA => "UPC_A",
            Self::UpcE => "UPC_E",
            Self::Code128 => "CODE_128",
            Self::Code39 => "CODE_39",
            Self::Code93 => "CODE_93",
            Self::DataMatrix => "DATA_MATRIX",
            Self::Pdf417 => "PDF_417",
            Self::Aztec => "AZTEC",
            Self::Itf => "ITF",
            Self::Codabar => "CODABAR",
        }
    }

    /// Retail product codes (EAN/UPC family)
    pub fn is_product(&self) -> bool {
        matches!(self, Self::Ean13 | Self::Ean8 | Self::UpcA | Self::UpcE)
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Symbology {
    type Err = String;

    /// Parse a symbology name, ignoring case, `-` and `_`
    ///
    /// Accepts `QR_CODE`, `qr`, `ean-13`, `Code128`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "qr" | "qrcode" => return Ok(Self::QrCode),
            "i25" | "interleaved2of5" => return Ok(Self::Itf),
            _ => {}
        }

        Self::ALL
            .into_iter()
            .find(|sym| sym.name().replace('_', "").to_lowercase() == normalized)
            .ok_or_else(|| format!("unknown symbology: {}", s))
    }
}

/// Character set used to turn decoded bytes into text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "UTF-8")]
    Utf8,
    #[serde(rename = "ISO-8859-1")]
    Latin1,
}

impl TextEncoding {
    /// Decode payload bytes; invalid UTF-8 sequences are replaced
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
        }
    }
}

/// Decoder tuning, fixed for the lifetime of a decoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Symbologies to look for
    pub formats: BTreeSet<Symbology>,
    /// Spend more time per frame for better recall
    pub try_harder: bool,
    /// Also look for codes rotated relative to the frame
    pub allow_rotated: bool,
    /// Also look for light-on-dark codes
    pub allow_inverted: bool,
    /// Character set of text payloads
    pub character_set: TextEncoding,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            formats: Symbology::ALL.into_iter().collect(),
            try_harder: true,
            allow_rotated: true,
            allow_inverted: true,
            character_set: TextEncoding::Utf8,
        }
    }
}

impl DecoderConfig {
    /// Configuration that only looks for QR codes
    pub fn qr_only() -> Self {
        Self {
            formats: BTreeSet::from([Symbology::QrCode]),
            ..Self::default()
        }
    }

    /// Restrict to the given symbologies
    pub fn with_formats(mut self, formats: impl IntoIterator<Item = Symbology>) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    pub fn allows(&self, symbology: Symbology) -> bool {
        self.formats.contains(&symbology)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.formats.is_empty() {
            return Err(ConfigError::Invalid(
                "decoder.formats must list at least one symbology".into(),
            ));
        }
        Ok(())
    }
}

/// A successfully decoded barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeResult {
    /// Decoded payload text
    pub text: String,
    /// Symbology of the code
    pub format: Symbology,
}

impl DecodeResult {
    pub fn new(text: impl Into<String>, format: Symbology) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}
