// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion of caller frames into single-channel working images, and the
// working-width downscale.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use idscan_core::{IdScanError, ImageView, Result};
use tracing::debug;

// BT.601 luma weights in 14-bit fixed point.
const R_WEIGHT: u32 = 4899;
const G_WEIGHT: u32 = 9617;
const B_WEIGHT: u32 = 1868;
const SHIFT: u32 = 14;

/// Copy `view` into an owned grayscale image, honouring stride and channel
/// order. Alpha is ignored.
pub fn to_luma(view: &ImageView<'_>) -> Result<GrayImage> {
    let (width, height) = (view.width(), view.height());
    let channels = view.format().channels();
    let mut buffer = Vec::with_capacity(width as usize * height as usize);

    for y in 0..height {
        let row = view.row(y);
        match view.format().rgb_offsets() {
            None => buffer.extend_from_slice(row),
            Some((r, g, b)) => buffer.extend(row.chunks_exact(channels).map(|px| {
                let sum = px[r] as u32 * R_WEIGHT
                    + px[g] as u32 * G_WEIGHT
                    + px[b] as u32 * B_WEIGHT
                    + (1 << (SHIFT - 1));
                (sum >> SHIFT) as u8
            })),
        }
    }

    GrayImage::from_raw(width, height, buffer).ok_or_else(|| {
        IdScanError::ProcessingFailure(format!("luma buffer does not fit {width}x{height}"))
    })
}

/// Shrink `gray` so its width does not exceed `max_width`, preserving aspect.
///
/// Returns the working image and the scale factor applied (`<= 1.0`). A
/// `max_width` of zero disables downscaling.
pub fn downscale(gray: GrayImage, max_width: u32) -> (GrayImage, f64) {
    let (width, height) = gray.dimensions();
    if max_width == 0 || width <= max_width {
        return (gray, 1.0);
    }
    let scale = max_width as f64 / width as f64;
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    debug!(width, height, max_width, new_height, scale, "Downscaling working image");
    (
        imageops::resize(&gray, max_width, new_height, FilterType::Triangle),
        scale,
    )
}

/// Mean and population standard deviation of all pixel values.
pub fn mean_std(gray: &GrayImage) -> (f64, f64) {
    let count = gray.width() as f64 * gray.height() as f64;
    if count == 0.0 {
        return (0.0, 0.0);
    }
    let (mut sum, mut sum_sq) = (0.0f64, 0.0f64);
    for Luma([v]) in gray.pixels() {
        let v = *v as f64;
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / count;
    (mean, (sum_sq / count - mean * mean).max(0.0).sqrt())
}
