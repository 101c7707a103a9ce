// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contrast-limited adaptive histogram equalisation.
//
// The frame is split into a grid of tiles. Each tile's histogram is clipped
// at `clip_limit` times the mean bin count, the excess is spread evenly over
// all bins, and the cumulative histogram becomes that tile's lookup table.
// Output pixels blend the four nearest tile tables bilinearly so tile seams
// do not show.

use image::{GrayImage, Luma};

/// Tiles per axis.
pub const DEFAULT_GRID: u32 = 8;
/// Histogram clip limit relative to the mean bin height.
pub const DEFAULT_CLIP_LIMIT: f64 = 2.0;

/// Equalise `gray` with a `grid` x `grid` tiling.
pub fn equalize(gray: &GrayImage, grid: u32, clip_limit: f64) -> GrayImage {
    let (width, height) = gray.dimensions();
    let grid_x = grid.clamp(1, width.max(1));
    let grid_y = grid.clamp(1, height.max(1));
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let mut luts = Vec::with_capacity((grid_x * grid_y) as usize);
    for ty in 0..grid_y {
        let (y0, y1) = tile_span(ty, grid_y, height);
        for tx in 0..grid_x {
            let (x0, x1) = tile_span(tx, grid_x, width);
            luts.push(tile_lut(gray, x0..x1, y0..y1, clip_limit));
        }
    }

    let tile_w = width as f64 / grid_x as f64;
    let tile_h = height as f64 / grid_y as f64;
    let lut = |tx: u32, ty: u32| &luts[(ty * grid_x + tx) as usize];

    GrayImage::from_fn(width, height, |x, y| {
        let (ty0, ty1, wy) = neighbours(y, tile_h, grid_y);
        let (tx0, tx1, wx) = neighbours(x, tile_w, grid_x);
        let v = gray.get_pixel(x, y).0[0] as usize;

        let top = lut(tx0, ty0)[v] as f64 * (1.0 - wx) + lut(tx1, ty0)[v] as f64 * wx;
        let bottom = lut(tx0, ty1)[v] as f64 * (1.0 - wx) + lut(tx1, ty1)[v] as f64 * wx;
        Luma([(top * (1.0 - wy) + bottom * wy).round().min(255.0) as u8])
    })
}

fn tile_span(index: u32, tiles: u32, extent: u32) -> (u32, u32) {
    let start = (index as u64 * extent as u64 / tiles as u64) as u32;
    let end = ((index as u64 + 1) * extent as u64 / tiles as u64) as u32;
    (start, end)
}

/// The two tile indices whose centres bracket `pos`, and the blend weight of
/// the second.
fn neighbours(pos: u32, tile_size: f64, tiles: u32) -> (u32, u32, f64) {
    let f = (pos as f64 + 0.5) / tile_size - 0.5;
    let lower = f.floor().clamp(0.0, (tiles - 1) as f64) as u32;
    let upper = (lower + 1).min(tiles - 1);
    let weight = (f - lower as f64).clamp(0.0, 1.0);
    (lower, upper, weight)
}

fn tile_lut(
    gray: &GrayImage,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
    clip_limit: f64,
) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in ys.clone() {
        for x in xs.clone() {
            hist[gray.get_pixel(x, y).0[0] as usize] += 1;
        }
    }
    let area = (xs.len() * ys.len()) as u32;
    let mut lut = [0u8; 256];
    if area == 0 {
        return lut;
    }

    let limit = ((clip_limit * area as f64 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let (per_bin, remainder) = (excess / 256, excess % 256);
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += per_bin + u32::from((i as u32) < remainder);
    }

    let mut cumulative = 0u32;
    for (i, bin) in hist.iter().enumerate() {
        cumulative += bin;
        lut[i] = (cumulative as f64 * 255.0 / area as f64).round().min(255.0) as u8;
    }
    lut
}
