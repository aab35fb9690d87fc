// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for frame sources

use std::sync::Arc;

/// Pixel layout of a frame handed over by a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    /// This is the canonical format used throughout the pipeline after conversion
    RGBA,
    /// BGRA - 32-bit with alpha (B G R A byte order)
    /// Common GPU readback order
    BGRA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    /// Used for monochrome cameras and IR sensors
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    /// Common raw format from webcam sensors
    YUYV,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1 interleaved)
    UYVY,
    /// Compressed JPEG bytes (MJPEG cameras, still images)
    Jpeg,
    /// Compressed PNG bytes
    Png,
}

impl PixelFormat {
    /// Bytes per pixel for uncompressed formats
    ///
    /// Packed 4:2:2 formats average two bytes per pixel. Compressed formats
    /// have no fixed size and return `None`.
    pub fn bytes_per_pixel(&self) -> Option<u32> {
        match self {
            Self::RGBA | Self::BGRA => Some(4),
            Self::RGB24 => Some(3),
            Self::YUYV | Self::UYVY => Some(2),
            Self::Gray8 => Some(1),
            Self::Jpeg | Self::Png => None,
        }
    }

    /// Whether the data is an encoded image rather than raw samples
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RGBA => "RGBA",
            Self::BGRA => "BGRA",
            Self::RGB24 => "RGB24",
            Self::Gray8 => "GRAY8",
            Self::YUYV => "YUYV",
            Self::UYVY => "UYVY",
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
        };
        f.write_str(name)
    }
}

/// Vertical order of rows in the source data
///
/// GPU readbacks usually deliver the bottom row first. The converter uses
/// this to produce buffers whose first row is always the top of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowOrder {
    /// First row in memory is the top of the image
    #[default]
    TopDown,
    /// First row in memory is the bottom of the image
    BottomUp,
}

/// A frame as delivered by a source
///
/// The data is shared so sources can hand out the same storage to several
/// consumers. The converter never keeps a reference to it.
#[derive(Debug, Clone)]
pub struct FrameHandle {
    /// Width in pixels (0 for compressed frames until decoded)
    pub width: u32,
    /// Height in pixels (0 for compressed frames until decoded)
    pub height: u32,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Pixel layout of `data`
    pub format: PixelFormat,
    /// Whether the first row is the top or the bottom of the image
    pub row_order: RowOrder,
    /// Raw samples or encoded bytes
    pub data: Arc<[u8]>,
}

impl FrameHandle {
    /// Create a tightly packed frame in the given raw format
    pub fn new(width: u32, height: u32, format: PixelFormat, data: impl Into<Arc<[u8]>>) -> Self {
        let stride = width * format.bytes_per_pixel().unwrap_or(0);
        Self {
            width,
            height,
            stride,
            format,
            row_order: RowOrder::TopDown,
            data: data.into(),
        }
    }

    /// Create a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self::new(width, height, PixelFormat::RGBA, data)
    }

    /// Wrap encoded JPEG or PNG bytes
    ///
    /// Dimensions are filled in by the converter after decoding.
    pub fn encoded(format: PixelFormat, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width: 0,
            height: 0,
            stride: 0,
            format,
            row_order: RowOrder::TopDown,
            data: bytes.into(),
        }
    }

    /// Override the row stride (for padded rows)
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Override the row order
    pub fn with_row_order(mut self, row_order: RowOrder) -> Self {
        self.row_order = row_order;
        self
    }

    /// Check if the frame carries no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
