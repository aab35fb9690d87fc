// SPDX-License-Identifier: GPL-3.0-only

//! Shared helpers for integration tests

#![allow(dead_code)]

use barscan::{FrameHandle, PixelFormat};
use qrcode::{Color, QrCode};

/// Quiet zone around the symbol, in modules
const QUIET_ZONE: usize = 4;

/// Render `payload` as a black-on-white QR code centred in a `size` x
/// `size` RGBA image
pub fn render_qr_rgba(payload: &str, size: u32) -> Vec<u8> {
    let code = QrCode::new(payload.as_bytes()).expect("payload fits in a QR code");
    let modules = code.width();
    let colors = code.to_colors();

    let size = size as usize;
    let total = modules + 2 * QUIET_ZONE;
    let scale = size / total;
    assert!(scale >= 2, "image too small for a {}-module code", modules);
    let offset = (size - scale * total) / 2 + QUIET_ZONE * scale;

    let mut pixels = vec![255u8; size * size * 4];
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let (mx, my) = (i % modules, i / modules);
        for y in 0..scale {
            let row = offset + my * scale + y;
            for x in 0..scale {
                let col = offset + mx * scale + x;
                let p = (row * size + col) * 4;
                pixels[p..p + 3].copy_from_slice(&[0, 0, 0]);
            }
        }
    }
    pixels
}

/// RGBA frame containing a QR code
pub fn qr_frame(payload: &str, size: u32) -> FrameHandle {
    FrameHandle::from_rgba(size, size, render_qr_rgba(payload, size))
}

/// Uniform white RGBA frame
pub fn blank_frame(size: u32) -> FrameHandle {
    FrameHandle::from_rgba(size, size, vec![255u8; (size * size * 4) as usize])
}

/// Swap R and B channels in place (RGBA <-> BGRA)
pub fn to_bgra(frame: &FrameHandle) -> FrameHandle {
    let mut data = frame.data.to_vec();
    for px in data.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    FrameHandle::new(frame.width, frame.height, PixelFormat::BGRA, data)
}

/// Reverse row order of a tightly packed RGBA frame
pub fn flip_rows(frame: &FrameHandle) -> Vec<u8> {
    let row = (frame.width * 4) as usize;
    frame
        .data
        .chunks_exact(row)
        .rev()
        .flatten()
        .copied()
        .collect()
}

/// Mirror a tightly packed RGBA frame left-right
pub fn mirror_columns(frame: &FrameHandle) -> FrameHandle {
    let row = (frame.width * 4) as usize;
    let data: Vec<u8> = frame
        .data
        .chunks_exact(row)
        .flat_map(|r| r.chunks_exact(4).rev().flatten().copied().collect::<Vec<_>>())
        .collect();
    FrameHandle::from_rgba(frame.width, frame.height, data)
}
