// SPDX-License-Identifier: GPL-3.0-only

//! Frame to pixel buffer conversion
//!
//! Copies a source frame out into an owned [`PixelBuffer`] in the
//! canonical orientation (top-down rows, origin top-left), optionally
//! downscaling it. The source may overwrite its storage as soon as
//! [`FrameConverter::convert`] returns.

use super::buffer::PixelBuffer;
use crate::backends::source::format_converters::row_to_rgba;
use crate::backends::source::{FrameHandle, PixelFormat, RowOrder};
use crate::config::ScanConfig;
use crate::constants::frames;
use crate::errors::{ScanError, ScanResult};
use image::{ImageFormat, imageops};
use tracing::{debug, trace};

/// Converts source frames into decodable pixel buffers
#[derive(Debug, Clone)]
pub struct FrameConverter {
    /// Frames narrower than this are reported as not ready
    min_ready_width: u32,
    /// Longest side after downscaling (`None` disables downscaling)
    max_dimension: Option<u32>,
}

impl Default for FrameConverter {
    fn default() -> Self {
        Self::new(frames::MIN_READY_WIDTH)
    }
}

impl FrameConverter {
    /// Create a converter without downscaling
    pub fn new(min_ready_width: u32) -> Self {
        Self {
            min_ready_width,
            max_dimension: None,
        }
    }

    /// Enable downscaling to fit within `max_dimension`
    pub fn with_downscale(mut self, max_dimension: u32) -> Self {
        self.max_dimension = Some(max_dimension);
        self
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        let converter = Self::new(config.min_ready_width);
        if config.downscale_enabled {
            converter.with_downscale(config.max_dimension)
        } else {
            converter
        }
    }

    /// Copy a frame into a canonical pixel buffer
    pub fn convert(&self, frame: &FrameHandle) -> ScanResult<PixelBuffer> {
        if frame.is_empty() {
            return Err(ScanError::NoFrame);
        }

        let start = std::time::Instant::now();

        let buffer = if frame.format.is_compressed() {
            let buffer = decode_compressed(frame)?;
            self.check_ready(buffer.width(), buffer.height())?;
            buffer
        } else {
            if frame.width == 0 || frame.height == 0 {
                return Err(ScanError::NoFrame);
            }
            self.check_ready(frame.width, frame.height)?;
            copy_raw(frame)?
        };

        trace!(
            width = buffer.width(),
            height = buffer.height(),
            format = %frame.format,
            conversion_ms = start.elapsed().as_millis() as u64,
            "Frame copied to pixel buffer"
        );

        Ok(match self.max_dimension {
            Some(max_dimension) => {
                let (width, height) = (buffer.width(), buffer.height());
                let scaled = buffer.downscaled(max_dimension);
                if scaled.width() != width {
                    debug!(
                        from_width = width,
                        from_height = height,
                        width = scaled.width(),
                        height = scaled.height(),
                        "Downscaled frame"
                    );
                }
                scaled
            }
            None => buffer,
        })
    }

    fn check_ready(&self, width: u32, height: u32) -> ScanResult<()> {
        if width < self.min_ready_width {
            return Err(ScanError::FrameNotReady {
                width,
                height,
                min_width: self.min_ready_width,
            });
        }
        Ok(())
    }
}

/// Copy raw samples row by row, dropping stride padding
fn copy_raw(frame: &FrameHandle) -> ScanResult<PixelBuffer> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;

    let Some(bpp) = frame.format.bytes_per_pixel() else {
        return Err(ScanError::ConversionFailure(format!(
            "{} frames have no fixed pixel size",
            frame.format
        )));
    };
    let row_bytes = width * bpp as usize;

    if matches!(frame.format, PixelFormat::YUYV | PixelFormat::UYVY) && width % 2 != 0 {
        return Err(ScanError::ConversionFailure(format!(
            "{} needs an even width, got {}",
            frame.format, width
        )));
    }
    if stride < row_bytes {
        return Err(ScanError::ConversionFailure(format!(
            "stride {} is smaller than a {}-pixel {} row ({} bytes)",
            stride, width, frame.format, row_bytes
        )));
    }
    let needed = stride * (height - 1) + row_bytes;
    if frame.data.len() < needed {
        return Err(ScanError::ConversionFailure(format!(
            "frame data is {} bytes, {}x{} {} needs {}",
            frame.data.len(),
            width,
            height,
            frame.format,
            needed
        )));
    }

    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let src_row = match frame.row_order {
            RowOrder::TopDown => y,
            RowOrder::BottomUp => height - 1 - y,
        };
        let row_start = src_row * stride;
        row_to_rgba(
            frame.format,
            &frame.data[row_start..row_start + row_bytes],
            width,
            &mut pixels,
        );
    }

    PixelBuffer::from_raw(frame.width, frame.height, pixels).ok_or_else(|| {
        ScanError::ConversionFailure("converted pixel count does not match dimensions".into())
    })
}

/// Decode JPEG/PNG bytes into a pixel buffer
fn decode_compressed(frame: &FrameHandle) -> ScanResult<PixelBuffer> {
    let format = match frame.format {
        PixelFormat::Png => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    };

    let decoded = image::load_from_memory_with_format(&frame.data, format).map_err(|e| {
        ScanError::ConversionFailure(format!("could not decode {} frame: {}", frame.format, e))
    })?;

    let mut rgba = decoded.to_rgba8();
    if frame.row_order == RowOrder::BottomUp {
        imageops::flip_vertical_in_place(&mut rgba);
    }

    Ok(PixelBuffer::from_image(rgba))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn converter() -> FrameConverter {
        FrameConverter::new(1)
    }

    #[test]
    fn test_copy_rgba_without_stride() {
        // 2x2 RGBA frame with 2 bytes of padding per row
        let data: Vec<u8> = vec![
            255, 0, 0, 255, // Red pixel
            0, 255, 0, 255, // Green pixel
            0, 0, // stride padding
            0, 0, 255, 255, // Blue pixel
            255, 255, 255, 255, // White pixel
            0, 0, // stride padding
        ];
        let frame = FrameHandle::from_rgba(2, 2, data).with_stride(10);

        let buffer = converter().convert(&frame).unwrap();
        assert_eq!(buffer.pixels().len(), 16);
        assert_eq!(buffer.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(buffer.pixel(1, 0), [0, 255, 0, 255]);
        assert_eq!(buffer.pixel(0, 1), [0, 0, 255, 255]);
        assert_eq!(buffer.pixel(1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn test_bottom_up_rows_are_flipped() {
        // Memory holds the bottom row (gray 10) first
        let frame = FrameHandle::new(1, 2, PixelFormat::Gray8, vec![10, 200])
            .with_row_order(RowOrder::BottomUp);

        let buffer = converter().convert(&frame).unwrap();
        assert_eq!(buffer.pixel(0, 0), [200, 200, 200, 255]);
        assert_eq!(buffer.pixel(0, 1), [10, 10, 10, 255]);
    }

    #[test]
    fn test_copies_out_of_source() {
        let data: Arc<[u8]> = Arc::from(vec![7u8; 16]);
        let frame = FrameHandle::from_rgba(2, 2, Arc::clone(&data));
        let buffer = converter().convert(&frame).unwrap();

        drop(frame);
        // Only our handle remains; the buffer owns a separate copy
        assert_eq!(Arc::strong_count(&data), 1);
        assert_eq!(buffer.pixels(), &[7u8; 16][..]);
    }

    #[test]
    fn test_empty_frame_is_no_frame() {
        let frame = FrameHandle::from_rgba(0, 0, Vec::<u8>::new());
        assert!(matches!(converter().convert(&frame), Err(ScanError::NoFrame)));
    }

    #[test]
    fn test_narrow_frame_not_ready() {
        let frame = FrameHandle::from_rgba(16, 16, vec![0u8; 16 * 16 * 4]);
        let result = FrameConverter::default().convert(&frame);
        assert!(matches!(
            result,
            Err(ScanError::FrameNotReady {
                width: 16,
                height: 16,
                min_width: 100
            })
        ));
    }

    #[test]
    fn test_short_data_is_conversion_failure() {
        let frame = FrameHandle::from_rgba(4, 4, vec![0u8; 40]);
        assert!(matches!(
            converter().convert(&frame),
            Err(ScanError::ConversionFailure(_))
        ));
    }

    #[test]
    fn test_small_stride_is_conversion_failure() {
        let frame = FrameHandle::from_rgba(4, 1, vec![0u8; 16]).with_stride(8);
        assert!(matches!(
            converter().convert(&frame),
            Err(ScanError::ConversionFailure(_))
        ));
    }

    #[test]
    fn test_odd_width_yuyv_rejected() {
        let frame = FrameHandle::new(3, 1, PixelFormat::YUYV, vec![0u8; 6]);
        assert!(matches!(
            converter().convert(&frame),
            Err(ScanError::ConversionFailure(_))
        ));
    }

    #[test]
    fn test_garbage_png_is_conversion_failure() {
        let frame = FrameHandle::encoded(PixelFormat::Png, vec![1, 2, 3, 4]);
        assert!(matches!(
            converter().convert(&frame),
            Err(ScanError::ConversionFailure(_))
        ));
    }

    #[test]
    fn test_png_frame_decodes() {
        let source = PixelBuffer::filled(120, 60, [0, 128, 255, 255]);
        let frame = FrameHandle::encoded(PixelFormat::Png, source.encode_png().unwrap());

        let buffer = FrameConverter::default().convert(&frame).unwrap();
        assert_eq!(buffer, source);
    }

    #[test]
    fn test_downscale_applied() {
        let frame = FrameHandle::from_rgba(400, 200, vec![90u8; 400 * 200 * 4]);
        let buffer = FrameConverter::new(100)
            .with_downscale(100)
            .convert(&frame)
            .unwrap();
        assert_eq!((buffer.width(), buffer.height()), (100, 50));
    }
}
