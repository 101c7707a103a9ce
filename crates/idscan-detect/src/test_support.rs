// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic card scenes for pipeline tests.

use image::{GrayImage, Luma, RgbImage, Rgb};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

/// A white card with a grey outline on a light background.
#[derive(Debug, Clone, Copy)]
pub struct CardScene {
    pub width: u32,
    pub height: u32,
    pub card_x: u32,
    pub card_y: u32,
    pub card_width: u32,
    pub card_height: u32,
    pub background: u8,
    pub card: u8,
    pub outline: u8,
    /// Outline thickness, drawn inside the card.
    pub outline_width: u32,
}

impl Default for CardScene {
    /// A 427x270 card (ID-1 proportions) with a 100 px margin all round.
    fn default() -> Self {
        Self {
            width: 627,
            height: 470,
            card_x: 100,
            card_y: 100,
            card_width: 427,
            card_height: 270,
            background: 240,
            card: 255,
            outline: 180,
            outline_width: 3,
        }
    }
}

impl CardScene {
    pub fn render(&self) -> GrayImage {
        let (x0, y0) = (self.card_x, self.card_y);
        let (x1, y1) = (x0 + self.card_width, y0 + self.card_height);
        let band = self.outline_width;
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if x < x0 || x >= x1 || y < y0 || y >= y1 {
                Luma([self.background])
            } else if x - x0 < band || x1 - 1 - x < band || y - y0 < band || y1 - 1 - y < band {
                Luma([self.outline])
            } else {
                Luma([self.card])
            }
        })
    }

    /// Card corners on the pixel grid, clockwise from the top-left.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (x0, y0) = (self.card_x as f64, self.card_y as f64);
        let (x1, y1) = (x0 + self.card_width as f64, y0 + self.card_height as f64);
        [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
    }
}

/// Rotate about the frame centre, filling uncovered pixels with `fill`.
pub fn rotated(image: &GrayImage, degrees: f32, fill: u8) -> GrayImage {
    rotate_about_center(image, degrees.to_radians(), Interpolation::Bilinear, Luma([fill]))
}

pub fn blurred(image: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(image, sigma)
}

/// Exact 2x pixel replication.
pub fn upscaled_2x(image: &GrayImage) -> GrayImage {
    GrayImage::from_fn(image.width() * 2, image.height() * 2, |x, y| {
        *image.get_pixel(x / 2, y / 2)
    })
}

/// Expand to three identical channels.
pub fn to_rgb(image: &GrayImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}
