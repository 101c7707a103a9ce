// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parameter profiles: the per-call bundle of edge thresholds, area limits,
// approximation epsilon and aspect targets, and the resolution tiers that
// derive one from the working image's dimensions.

use serde::{Deserialize, Serialize};

use crate::error::{IdScanError, Result};

/// Width / height of an ISO/IEC 7810 ID-1 card (85.60 mm x 53.98 mm).
pub const ID1_ASPECT_RATIO: f64 = 1.586;

/// Tunable parameters for one detection call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterProfile {
    /// Hysteresis lower bound for the static edge policy.
    pub canny_low: f64,
    /// Hysteresis upper bound for the static edge policy.
    pub canny_high: f64,
    /// Smallest contour area accepted, as a fraction of the frame.
    pub min_area_ratio: f64,
    /// Largest contour area accepted, as a fraction of the frame.
    pub max_area_ratio: f64,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub epsilon_factor: f64,
    pub target_aspect_ratio: f64,
    /// Relative aspect deviation at which the aspect score reaches zero.
    pub aspect_tolerance: f64,
}

impl ParameterProfile {
    /// Check the invariants every pipeline stage relies on.
    pub fn validate(&self) -> Result<()> {
        let all_finite = [
            self.canny_low,
            self.canny_high,
            self.min_area_ratio,
            self.max_area_ratio,
            self.epsilon_factor,
            self.target_aspect_ratio,
            self.aspect_tolerance,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(invalid("profile", f64::NAN, "parameters must be finite"));
        }
        if self.canny_low < 0.0 || self.canny_low >= self.canny_high {
            return Err(invalid(
                "canny_threshold1",
                self.canny_low,
                format!(
                    "low threshold {} must be >= 0 and below high threshold {}",
                    self.canny_low, self.canny_high
                ),
            ));
        }
        if self.min_area_ratio <= 0.0
            || self.max_area_ratio > 1.0
            || self.min_area_ratio >= self.max_area_ratio
        {
            return Err(invalid(
                "min_area_ratio",
                self.min_area_ratio,
                format!(
                    "area range {}..{} must satisfy 0 < min < max <= 1",
                    self.min_area_ratio, self.max_area_ratio
                ),
            ));
        }
        if self.epsilon_factor <= 0.0 {
            return Err(invalid(
                "approx_epsilon",
                self.epsilon_factor,
                "epsilon factor must be positive",
            ));
        }
        if self.target_aspect_ratio <= 0.0 || self.aspect_tolerance <= 0.0 {
            return Err(invalid(
                "aspect_ratio_tolerance",
                self.aspect_tolerance,
                "aspect target and tolerance must be positive",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: f64, reason: impl Into<String>) -> IdScanError {
    IdScanError::invalid_config(key, value.to_string(), reason)
}

// -- Resolution tiers --------------------------------------------------------

/// Coarse size class of the working image, keyed on its shorter side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    Small,
    Medium,
    Large,
    Huge,
}

impl ResolutionTier {
    /// The baseline profile for this tier, before any wide-frame adjustment.
    pub fn profile(&self) -> ParameterProfile {
        let (canny_low, canny_high, min_area_ratio, max_area_ratio, epsilon_factor, aspect_tolerance) =
            match self {
                Self::Small => (30.0, 90.0, 0.05, 0.95, 0.02, 0.5),
                Self::Medium => (25.0, 75.0, 0.01, 0.90, 0.015, 0.4),
                Self::Large => (20.0, 60.0, 0.005, 0.85, 0.01, 0.35),
                Self::Huge => (15.0, 45.0, 0.002, 0.80, 0.008, 0.3),
            };
        ParameterProfile {
            canny_low,
            canny_high,
            min_area_ratio,
            max_area_ratio,
            epsilon_factor,
            target_aspect_ratio: ID1_ASPECT_RATIO,
            aspect_tolerance,
        }
    }
}

/// Tier boundaries and the wide-frame relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionTiers {
    /// Shorter side below this is [`ResolutionTier::Small`].
    pub small_below: u32,
    /// Shorter side below this is [`ResolutionTier::Medium`].
    pub medium_below: u32,
    /// Shorter side below this is [`ResolutionTier::Large`]; at or above, `Huge`.
    pub large_below: u32,
    /// Long/short side ratio above which the frame counts as wide.
    pub wide_frame_ratio: f64,
    /// Multiplier applied to the minimum area ratio of wide frames.
    pub wide_min_area_scale: f64,
    /// Multiplier applied to the aspect tolerance of wide frames.
    pub wide_tolerance_scale: f64,
}

impl Default for ResolutionTiers {
    fn default() -> Self {
        Self {
            small_below: 400,
            medium_below: 800,
            large_below: 1500,
            wide_frame_ratio: 2.5,
            wide_min_area_scale: 0.5,
            wide_tolerance_scale: 1.2,
        }
    }
}

impl ResolutionTiers {
    pub fn classify(&self, width: u32, height: u32) -> ResolutionTier {
        let min_side = width.min(height);
        if min_side < self.small_below {
            ResolutionTier::Small
        } else if min_side < self.medium_below {
            ResolutionTier::Medium
        } else if min_side < self.large_below {
            ResolutionTier::Large
        } else {
            ResolutionTier::Huge
        }
    }

    /// Whether the long side exceeds the short side by more than the wide ratio.
    pub fn is_wide(&self, width: u32, height: u32) -> bool {
        let (long, short) = (width.max(height), width.min(height));
        short > 0 && long as f64 / short as f64 > self.wide_frame_ratio
    }

    /// Select the tier profile for a `width` x `height` frame and relax it for
    /// wide frames.
    pub fn profile_for(&self, width: u32, height: u32) -> ParameterProfile {
        let mut profile = self.classify(width, height).profile();
        if self.is_wide(width, height) {
            profile.min_area_ratio *= self.wide_min_area_scale;
            profile.aspect_tolerance *= self.wide_tolerance_scale;
        }
        profile
    }
}
