// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge-map preprocessing. Two policies turn a grayscale working image into a
// binary edge map: a static one driven entirely by the parameter profile,
// and an adaptive one that equalises local contrast and derives its blur,
// closing size and hysteresis thresholds from the image itself.

pub mod clahe;

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use idscan_core::ParameterProfile;
use idscan_core::config::PreprocessMode;
use serde::Serialize;
use tracing::debug;

use crate::luma::mean_std;

/// Blur kernel size of the static policy.
pub const STATIC_BLUR_KERNEL: u32 = 5;
/// Closing radius of the static policy (a 3x3 square).
pub const STATIC_CLOSE_RADIUS: u8 = 1;

/// Shorter-side pixels per blur kernel step in the adaptive policy.
const ADAPTIVE_BLUR_STEP: u32 = 400;
/// Shorter-side pixels per closing kernel step in the adaptive policy.
const ADAPTIVE_CLOSE_STEP: u32 = 800;

// Dynamic hysteresis thresholds as multiples of the intensity deviation.
const DYNAMIC_LOW_PER_STD: f64 = 2.5;
const DYNAMIC_HIGH_PER_STD: f64 = 5.0;
const DYNAMIC_LOW_RANGE: (f64, f64) = (15.0, 100.0);
const DYNAMIC_HIGH_RANGE: (f64, f64) = (40.0, 200.0);

/// Hysteresis bounds handed to the edge detector. Always `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeThresholds {
    pub low: f32,
    pub high: f32,
}

impl EdgeThresholds {
    pub fn new(low: f64, high: f64) -> Self {
        let (low, high) = (low.max(0.0), high.max(0.0));
        Self {
            low: low.min(high) as f32,
            high: low.max(high) as f32,
        }
    }

    pub fn from_profile(profile: &ParameterProfile) -> Self {
        Self::new(profile.canny_low, profile.canny_high)
    }

    /// Thresholds proportional to the intensity standard deviation, clamped
    /// to fixed windows. A flat image yields bounds no gradient can reach.
    pub fn from_deviation(std_dev: f64) -> Self {
        let low = (std_dev * DYNAMIC_LOW_PER_STD).clamp(DYNAMIC_LOW_RANGE.0, DYNAMIC_LOW_RANGE.1);
        let high =
            (std_dev * DYNAMIC_HIGH_PER_STD).clamp(DYNAMIC_HIGH_RANGE.0, DYNAMIC_HIGH_RANGE.1);
        Self::new(low, high)
    }
}

/// Gaussian sigma matching a `size` x `size` smoothing kernel.
pub fn sigma_for_kernel(size: u32) -> f32 {
    (0.3 * ((size.max(1) as f64 - 1.0) * 0.5 - 1.0) + 0.8) as f32
}

/// Odd blur kernel size for a frame whose shorter side is `min_side`.
pub fn adaptive_blur_kernel(min_side: u32) -> u32 {
    let size = (min_side / ADAPTIVE_BLUR_STEP).max(3);
    if size % 2 == 0 { size + 1 } else { size }
}

/// Closing radius for a frame whose shorter side is `min_side`.
pub fn adaptive_close_radius(min_side: u32) -> u8 {
    let kernel = (min_side / ADAPTIVE_CLOSE_STEP).max(2);
    (kernel / 2).clamp(1, u8::MAX as u32) as u8
}

/// Produces a binary edge map (edges 255, background 0) of the same size as
/// its input.
pub trait EdgePreprocessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn edge_map(&self, gray: &GrayImage, profile: &ParameterProfile) -> GrayImage;
}

/// Fixed 5x5 blur, the profile's thresholds, 3x3 closing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPreprocessor;

impl EdgePreprocessor for StaticPreprocessor {
    fn name(&self) -> &'static str {
        PreprocessMode::Static.as_str()
    }

    fn edge_map(&self, gray: &GrayImage, profile: &ParameterProfile) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, sigma_for_kernel(STATIC_BLUR_KERNEL));
        let thresholds = EdgeThresholds::from_profile(profile);
        debug!(low = thresholds.low, high = thresholds.high, "Static edge thresholds");
        let edges = canny(&blurred, thresholds.low, thresholds.high);
        close(&edges, Norm::LInf, STATIC_CLOSE_RADIUS)
    }
}

/// Contrast-equalised, resolution-scaled edge extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptivePreprocessor {
    /// Use the profile's thresholds instead of deriving them from the image.
    pub pinned_thresholds: bool,
}

impl EdgePreprocessor for AdaptivePreprocessor {
    fn name(&self) -> &'static str {
        PreprocessMode::Adaptive.as_str()
    }

    fn edge_map(&self, gray: &GrayImage, profile: &ParameterProfile) -> GrayImage {
        let min_side = gray.width().min(gray.height());
        let equalized = clahe::equalize(gray, clahe::DEFAULT_GRID, clahe::DEFAULT_CLIP_LIMIT);

        let kernel = adaptive_blur_kernel(min_side);
        let blurred = gaussian_blur_f32(&equalized, sigma_for_kernel(kernel));

        let thresholds = if self.pinned_thresholds {
            EdgeThresholds::from_profile(profile)
        } else {
            let (mean, std_dev) = mean_std(&blurred);
            debug!(mean, std_dev, "Intensity statistics");
            // Thresholds follow the spread alone; the mean is logged only.
            EdgeThresholds::from_deviation(std_dev)
        };
        let radius = adaptive_close_radius(min_side);
        debug!(
            kernel,
            radius,
            low = thresholds.low,
            high = thresholds.high,
            "Adaptive edge parameters"
        );

        let edges = canny(&blurred, thresholds.low, thresholds.high);
        close(&edges, Norm::LInf, radius)
    }
}

/// The preprocessor a configuration asks for.
pub fn for_mode(mode: PreprocessMode, pinned_thresholds: bool) -> Box<dyn EdgePreprocessor> {
    match mode {
        PreprocessMode::Static => Box::new(StaticPreprocessor),
        PreprocessMode::Adaptive => Box::new(AdaptivePreprocessor { pinned_thresholds }),
    }
}
