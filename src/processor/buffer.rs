// SPDX-License-Identifier: GPL-3.0-only

//! Canonical CPU pixel buffer
//!
//! Every buffer is RGBA8, row-major, with the origin at the top-left
//! corner. Buffers are immutable: mirroring and downscaling produce new
//! buffers.

use image::{GrayImage, ImageFormat, RgbaImage, imageops};
use std::io::Cursor;

/// An owned RGBA frame ready for decoding
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Wrap tightly packed RGBA pixels
    ///
    /// Returns `None` if `pixels.len() != width * height * 4`.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, pixels).map(Self::from_image)
    }

    /// Buffer filled with a single color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::from_image(RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }

    pub(crate) fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGBA bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// RGBA value at `(x, y)`, origin top-left
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Luminance plane for decoders that work on grey data
    pub fn to_luma(&self) -> GrayImage {
        imageops::grayscale(&self.image)
    }

    /// Copy mirrored left-right
    pub fn mirrored_horizontal(&self) -> Self {
        Self::from_image(imageops::flip_horizontal(&self.image))
    }

    /// Copy mirrored top-bottom
    pub fn mirrored_vertical(&self) -> Self {
        Self::from_image(imageops::flip_vertical(&self.image))
    }

    /// Dimensions after fitting inside `max_dimension`, or `None` if the
    /// buffer already fits
    ///
    /// Aspect ratio is preserved up to rounding. Never upscales.
    pub fn fitted_size(&self, max_dimension: u32) -> Option<(u32, u32)> {
        let (width, height) = (self.width(), self.height());
        if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
            return None;
        }

        let scale =
            (width as f64 / max_dimension as f64).max(height as f64 / max_dimension as f64);
        let fit = |side: u32| ((side as f64 / scale).round() as u32).clamp(1, max_dimension);

        Some((fit(width), fit(height)))
    }

    /// Downscale to fit inside `max_dimension` using bilinear interpolation
    ///
    /// Buffers that already fit are returned unchanged.
    pub fn downscaled(self, max_dimension: u32) -> Self {
        match self.fitted_size(max_dimension) {
            Some((dst_width, dst_height)) => {
                let pixels = downscale_rgba(&self.image, dst_width, dst_height);
                // Length matches by construction
                RgbaImage::from_raw(dst_width, dst_height, pixels)
                    .map(Self::from_image)
                    .unwrap_or(self)
            }
            None => self,
        }
    }

    /// Encode as PNG (lossless)
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Cursor::new(Vec::new());
        self.image.write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }
}

/// Downscale RGBA pixels using bilinear interpolation
fn downscale_rgba(src: &RgbaImage, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let src_width = src.width() as usize;
    let src_height = src.height() as usize;
    let data = src.as_raw();
    let stride = src_width * 4;

    let mut result = Vec::with_capacity((dst_width * dst_height * 4) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = (src_x as usize).min(src_width - 1);
            let y0 = (src_y as usize).min(src_height - 1);
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let sample = |px: usize, py: usize, channel: usize| -> f32 {
                data[py * stride + px * 4 + channel] as f32
            };

            for channel in 0..4 {
                let p00 = sample(x0, y0, channel);
                let p01 = sample(x1, y0, channel);
                let p10 = sample(x0, y1, channel);
                let p11 = sample(x1, y1, channel);

                let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                    + p01 * x_frac * (1.0 - y_frac)
                    + p10 * (1.0 - x_frac) * y_frac
                    + p11 * x_frac * y_frac;

                result.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _y in 0..height {
            for x in 0..width {
                let red = (x * 255 / width.max(2).saturating_sub(1).max(1)).min(255) as u8;
                pixels.extend_from_slice(&[red, 0, 0, 255]);
            }
        }
        PixelBuffer::from_raw(width, height, pixels).unwrap()
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_none());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_mirrors() {
        // 2x2: red green / blue white
        let pixels = vec![
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ];
        let buffer = PixelBuffer::from_raw(2, 2, pixels).unwrap();

        let h = buffer.mirrored_horizontal();
        assert_eq!(h.pixel(0, 0), [0, 255, 0, 255]);
        assert_eq!(h.pixel(1, 1), [0, 0, 255, 255]);

        let v = buffer.mirrored_vertical();
        assert_eq!(v.pixel(0, 0), [0, 0, 255, 255]);
        assert_eq!(v.pixel(1, 0), [255, 255, 255, 255]);

        // Source is untouched
        assert_eq!(buffer.pixel(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_fitted_size() {
        let buffer = PixelBuffer::filled(2048, 1024, [0, 0, 0, 255]);
        assert_eq!(buffer.fitted_size(1024), Some((1024, 512)));

        let buffer = PixelBuffer::filled(300, 1200, [0, 0, 0, 255]);
        assert_eq!(buffer.fitted_size(600), Some((150, 600)));

        let buffer = PixelBuffer::filled(640, 480, [0, 0, 0, 255]);
        assert_eq!(buffer.fitted_size(1024), None);
        assert_eq!(buffer.fitted_size(640), None);
    }

    #[test]
    fn test_downscale_keeps_buffer_within_bound_unchanged() {
        let buffer = gradient(64, 32);
        assert_eq!(buffer.clone().downscaled(64), buffer);
    }

    #[test]
    fn test_downscale_interpolates() {
        let buffer = gradient(4, 2);
        let small = buffer.downscaled(2);
        assert_eq!((small.width(), small.height()), (2, 1));

        // First pixel samples the dark end, second the bright end
        assert!(small.pixel(0, 0)[0] < 100);
        assert!(small.pixel(1, 0)[0] > 150);
    }

    #[test]
    fn test_uniform_downscale_stays_uniform() {
        let buffer = PixelBuffer::filled(1500, 900, [12, 34, 56, 255]);
        let small = buffer.downscaled(500);
        assert_eq!((small.width(), small.height()), (500, 300));
        assert!(small.pixels().chunks_exact(4).all(|p| p == [12, 34, 56, 255]));
    }

    #[test]
    fn test_png_roundtrip_dimensions() {
        let buffer = gradient(8, 4);
        let png = buffer.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.as_raw().as_slice(), buffer.pixels());
    }
}
