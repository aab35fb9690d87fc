// SPDX-License-Identifier: GPL-3.0-only
//! Row-level pixel format conversion to RGBA
//!
//! Each function converts exactly one row of `width` pixels and appends the
//! RGBA result to `out`. Stride handling and row order are the caller's job.

use super::types::PixelFormat;

/// Append one row of `format` samples to `out` as RGBA
///
/// `row` must hold at least `width * bytes_per_pixel` bytes. Compressed
/// formats are not row-convertible and leave `out` untouched.
pub fn row_to_rgba(format: PixelFormat, row: &[u8], width: usize, out: &mut Vec<u8>) {
    match format {
        PixelFormat::RGBA => out.extend_from_slice(&row[..width * 4]),
        PixelFormat::BGRA => bgra_row_to_rgba(row, width, out),
        PixelFormat::RGB24 => rgb_row_to_rgba(row, width, out),
        PixelFormat::Gray8 => gray_row_to_rgba(row, width, out),
        PixelFormat::YUYV => packed_422_row_to_rgba(row, width, [0, 1, 2, 3], out),
        PixelFormat::UYVY => packed_422_row_to_rgba(row, width, [1, 0, 3, 2], out),
        PixelFormat::Jpeg | PixelFormat::Png => {}
    }
}

fn bgra_row_to_rgba(row: &[u8], width: usize, out: &mut Vec<u8>) {
    for px in row[..width * 4].chunks_exact(4) {
        out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
    }
}

fn rgb_row_to_rgba(row: &[u8], width: usize, out: &mut Vec<u8>) {
    for px in row[..width * 3].chunks_exact(3) {
        out.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
}

fn gray_row_to_rgba(row: &[u8], width: usize, out: &mut Vec<u8>) {
    for &luma in &row[..width] {
        out.extend_from_slice(&[luma, luma, luma, 255]);
    }
}

/// Convert a packed YUV 4:2:2 row to RGBA
///
/// Each 4-byte group encodes 2 pixels. `layout` gives the offsets of
/// `[y0, u, y1, v]` inside the group (YUYV = `[0, 1, 2, 3]`,
/// UYVY = `[1, 0, 3, 2]`). Uses BT.601 coefficients.
fn packed_422_row_to_rgba(row: &[u8], width: usize, layout: [usize; 4], out: &mut Vec<u8>) {
    let [y0_at, u_at, y1_at, v_at] = layout;
    let mut emitted = 0;

    for chunk in row.chunks_exact(4) {
        let u = chunk[u_at] as f32 - 128.0;
        let v = chunk[v_at] as f32 - 128.0;

        for y in [chunk[y0_at] as f32, chunk[y1_at] as f32] {
            if emitted == width {
                return;
            }
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
            out.extend_from_slice(&[r, g, b, 255]);
            emitted += 1;
        }
    }
}
