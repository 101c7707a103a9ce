// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detector configuration: strategy selection, instance defaults, explicit
// overrides, scoring weights, and the string key/value surface used by
// foreign callers and the command line.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{IdScanError, Result};
use crate::profile::{ID1_ASPECT_RATIO, ParameterProfile, ResolutionTier, ResolutionTiers};

/// Default cap on the working image width.
pub const DEFAULT_MAX_WORKING_WIDTH: u32 = 1200;

// -- Strategy selection ------------------------------------------------------

/// How the edge map is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessMode {
    /// Fixed blur, profile thresholds, 3x3 closing.
    Static,
    /// Local contrast equalisation, resolution-scaled blur and closing,
    /// thresholds derived from image statistics.
    Adaptive,
}

impl PreprocessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Adaptive => "adaptive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "static" => Some(Self::Static),
            "adaptive" => Some(Self::Adaptive),
            _ => None,
        }
    }
}

/// How the winning candidate is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Weighted area / aspect / shape / position score.
    Weighted,
    /// Largest four-vertex approximation, falling back to the bounding box
    /// of the largest contour.
    LargestQuad,
}

impl ScoringMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weighted => "weighted",
            Self::LargestQuad => "largest_quad",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weighted" => Some(Self::Weighted),
            "largest_quad" | "largest" => Some(Self::LargestQuad),
            _ => None,
        }
    }
}

// -- Overrides ---------------------------------------------------------------

/// Explicitly configured profile values. Any value set here wins over both
/// the instance defaults and resolution adaptation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    pub canny_low: Option<f64>,
    pub canny_high: Option<f64>,
    pub min_area_ratio: Option<f64>,
    pub max_area_ratio: Option<f64>,
    /// Absolute minimum area in source-image pixels.
    pub min_area_px: Option<f64>,
    /// Absolute maximum area in source-image pixels.
    pub max_area_px: Option<f64>,
    pub epsilon_factor: Option<f64>,
    pub target_aspect_ratio: Option<f64>,
    pub aspect_tolerance: Option<f64>,
}

impl ProfileOverrides {
    /// Whether the caller pinned either hysteresis threshold.
    pub fn has_edge_thresholds(&self) -> bool {
        self.canny_low.is_some() || self.canny_high.is_some()
    }

    /// Write every set value into `profile`. Pixel areas are converted to
    /// ratios of `source_area` and take precedence over ratio overrides.
    pub fn apply(&self, profile: &mut ParameterProfile, source_area: f64) {
        let pairs = [
            (self.canny_low, &mut profile.canny_low),
            (self.canny_high, &mut profile.canny_high),
            (self.min_area_ratio, &mut profile.min_area_ratio),
            (self.max_area_ratio, &mut profile.max_area_ratio),
            (self.epsilon_factor, &mut profile.epsilon_factor),
            (self.target_aspect_ratio, &mut profile.target_aspect_ratio),
            (self.aspect_tolerance, &mut profile.aspect_tolerance),
        ];
        for (value, slot) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if source_area > 0.0 {
            if let Some(px) = self.min_area_px {
                profile.min_area_ratio = (px / source_area).min(1.0);
            }
            if let Some(px) = self.max_area_px {
                profile.max_area_ratio = (px / source_area).min(1.0);
            }
        }
    }
}

// -- Scoring -----------------------------------------------------------------

/// Weights and windows of the weighted candidate score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub area_weight: f64,
    pub aspect_weight: f64,
    pub shape_weight: f64,
    pub position_weight: f64,
    /// A winner must score strictly above this.
    pub min_score: f64,
    /// Area ratios in this window earn full area credit.
    pub optimal_area: (f64, f64),
    /// Area ratios above this earn `near_full_frame_score`.
    pub near_full_frame_area: f64,
    pub near_full_frame_score: f64,
    /// Credit for ratios inside `allowed_area` but outside the other windows.
    pub partial_area_score: f64,
    /// Area ratios outside this window score zero.
    pub allowed_area: (f64, f64),
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            area_weight: 0.25,
            aspect_weight: 0.4,
            shape_weight: 0.15,
            position_weight: 0.2,
            min_score: 0.1,
            optimal_area: (0.01, 0.7),
            near_full_frame_area: 0.85,
            near_full_frame_score: 0.9,
            partial_area_score: 0.5,
            allowed_area: (0.002, 0.99),
        }
    }
}

impl ScoringParams {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("area_weight", self.area_weight),
            ("aspect_weight", self.aspect_weight),
            ("shape_weight", self.shape_weight),
            ("position_weight", self.position_weight),
        ];
        for (key, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(IdScanError::invalid_config(
                    key,
                    weight.to_string(),
                    "weights must be finite and non-negative",
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(IdScanError::invalid_config(
                "min_score",
                self.min_score.to_string(),
                "minimum score must lie in 0..=1",
            ));
        }
        Ok(())
    }
}

// -- Detector configuration --------------------------------------------------

/// Full configuration of a detector instance.
///
/// A detector reads this once per call and derives a fresh
/// [`ParameterProfile`] from it; nothing here is mutated by detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub preprocessing: PreprocessMode,
    pub scoring: ScoringMode,
    /// Select the profile from the working image's resolution tier instead of
    /// using `base`.
    pub adapt_to_resolution: bool,
    /// Frames wider than this are downscaled before processing. 0 disables.
    pub max_working_width: u32,
    /// Instance defaults used when adaptation is off.
    pub base: ParameterProfile,
    pub overrides: ProfileOverrides,
    pub tiers: ResolutionTiers,
    pub scoring_params: ScoringParams,
    /// Keys the detector does not recognise, kept verbatim.
    pub extra: BTreeMap<String, String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::id1()
    }
}

impl DetectorConfig {
    /// Preset tuned for ID-1 cards: adaptive edges, weighted scoring, tiered
    /// profiles.
    pub fn id1() -> Self {
        Self {
            preprocessing: PreprocessMode::Adaptive,
            scoring: ScoringMode::Weighted,
            adapt_to_resolution: true,
            max_working_width: DEFAULT_MAX_WORKING_WIDTH,
            base: ResolutionTier::Medium.profile(),
            overrides: ProfileOverrides::default(),
            tiers: ResolutionTiers::default(),
            scoring_params: ScoringParams::default(),
            extra: BTreeMap::new(),
        }
    }

    /// Preset for arbitrary rectangular documents: static edges, largest
    /// quadrilateral, fixed 10 000..500 000 px area window.
    pub fn generic() -> Self {
        Self {
            preprocessing: PreprocessMode::Static,
            scoring: ScoringMode::LargestQuad,
            adapt_to_resolution: false,
            base: ParameterProfile {
                canny_low: 50.0,
                canny_high: 150.0,
                min_area_ratio: 0.001,
                max_area_ratio: 1.0,
                epsilon_factor: 0.02,
                target_aspect_ratio: ID1_ASPECT_RATIO,
                aspect_tolerance: 0.5,
            },
            overrides: ProfileOverrides {
                min_area_px: Some(10_000.0),
                max_area_px: Some(500_000.0),
                ..ProfileOverrides::default()
            },
            ..Self::id1()
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "id1" | "iso_id1" => Some(Self::id1()),
            "generic" => Some(Self::generic()),
            _ => None,
        }
    }

    /// Derive the profile for one call.
    ///
    /// `working` is the size of the (possibly downscaled) image the pipeline
    /// runs on; `source_area` is the pixel count of the caller's frame, used
    /// to convert absolute area overrides. A frame too small to hold the
    /// configured minimum pixel area yields `NoDocumentFound`.
    pub fn resolve_profile(&self, working: (u32, u32), source_area: f64) -> Result<ParameterProfile> {
        let (width, height) = working;
        let mut profile = if self.adapt_to_resolution {
            self.tiers.profile_for(width, height)
        } else {
            self.base
        };
        if let Some(min_px) = self.overrides.min_area_px {
            let window_open = self.overrides.max_area_px.is_none_or(|max_px| max_px > min_px);
            if window_open && min_px >= source_area {
                debug!(min_px, source_area, "Frame smaller than the minimum contour area");
                return Err(IdScanError::NoDocumentFound(format!(
                    "a {source_area} px frame cannot hold the {min_px} px minimum contour area"
                )));
            }
        }
        self.overrides.apply(&mut profile, source_area);
        profile.validate()?;
        debug!(
            width,
            height,
            adapted = self.adapt_to_resolution,
            min_area_ratio = profile.min_area_ratio,
            max_area_ratio = profile.max_area_ratio,
            epsilon = profile.epsilon_factor,
            "Parameter profile resolved"
        );
        Ok(profile)
    }

    // -- Key/value surface ----------------------------------------------------

    /// Set one value by name.
    ///
    /// Returns `Ok(true)` when the key drives the detector, `Ok(false)` when
    /// it is unrecognised (stored in `extra` and otherwise ignored), and an
    /// error when a recognised key gets an unusable value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool> {
        match key {
            "canny_threshold1" => {
                self.overrides.canny_low = Some(parse_number(key, value, Bound::NonNegative)?)
            }
            "canny_threshold2" => {
                self.overrides.canny_high = Some(parse_number(key, value, Bound::Positive)?)
            }
            "min_contour_area" => {
                self.overrides.min_area_px = Some(parse_number(key, value, Bound::Positive)?)
            }
            "max_contour_area" => {
                self.overrides.max_area_px = Some(parse_number(key, value, Bound::Positive)?)
            }
            "min_area_ratio" => {
                self.overrides.min_area_ratio = Some(parse_number(key, value, Bound::UnitInterval)?)
            }
            "max_area_ratio" => {
                self.overrides.max_area_ratio = Some(parse_number(key, value, Bound::UnitInterval)?)
            }
            "approx_epsilon" => {
                self.overrides.epsilon_factor = Some(parse_number(key, value, Bound::Positive)?)
            }
            "target_aspect_ratio" => {
                self.overrides.target_aspect_ratio = Some(parse_number(key, value, Bound::Positive)?)
            }
            "aspect_ratio_tolerance" => {
                self.overrides.aspect_tolerance = Some(parse_number(key, value, Bound::Positive)?)
            }
            "min_score" => {
                self.scoring_params.min_score = parse_number(key, value, Bound::ClosedUnit)?
            }
            "preprocessing" => {
                self.preprocessing = PreprocessMode::parse(value).ok_or_else(|| {
                    IdScanError::invalid_config(key, value, "expected static or adaptive")
                })?
            }
            "scoring" => {
                self.scoring = ScoringMode::parse(value).ok_or_else(|| {
                    IdScanError::invalid_config(key, value, "expected weighted or largest_quad")
                })?
            }
            "adapt_to_resolution" => {
                self.adapt_to_resolution = value.trim().parse().map_err(|_| {
                    IdScanError::invalid_config(key, value, "expected true or false")
                })?
            }
            "max_working_width" => {
                self.max_working_width = value.trim().parse().map_err(|_| {
                    IdScanError::invalid_config(key, value, "expected a pixel width")
                })?
            }
            _ => {
                warn!(key, "Unrecognised configuration key stored but ignored");
                self.extra.insert(key.to_string(), value.to_string());
                return Ok(false);
            }
        }
        debug!(key, value, "Configuration updated");
        Ok(true)
    }

    /// Read one value by name.
    ///
    /// Profile keys return `None` until explicitly set, since their effective
    /// value depends on each image.
    pub fn get(&self, key: &str) -> Option<String> {
        let number = |v: Option<f64>| v.map(|v| v.to_string());
        match key {
            "canny_threshold1" => number(self.overrides.canny_low),
            "canny_threshold2" => number(self.overrides.canny_high),
            "min_contour_area" => number(self.overrides.min_area_px),
            "max_contour_area" => number(self.overrides.max_area_px),
            "min_area_ratio" => number(self.overrides.min_area_ratio),
            "max_area_ratio" => number(self.overrides.max_area_ratio),
            "approx_epsilon" => number(self.overrides.epsilon_factor),
            "target_aspect_ratio" => number(self.overrides.target_aspect_ratio),
            "aspect_ratio_tolerance" => number(self.overrides.aspect_tolerance),
            "min_score" => Some(self.scoring_params.min_score.to_string()),
            "preprocessing" => Some(self.preprocessing.as_str().to_string()),
            "scoring" => Some(self.scoring.as_str().to_string()),
            "adapt_to_resolution" => Some(self.adapt_to_resolution.to_string()),
            "max_working_width" => Some(self.max_working_width.to_string()),
            _ => self.extra.get(key).cloned(),
        }
    }

    // -- Persistence ----------------------------------------------------------

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file written by [`DetectorConfig::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    NonNegative,
    Positive,
    /// `0 < v <= 1`
    UnitInterval,
    /// `0 <= v <= 1`
    ClosedUnit,
}

fn parse_number(key: &str, value: &str, bound: Bound) -> Result<f64> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| IdScanError::invalid_config(key, value, "not a number"))?;
    let ok = parsed.is_finite()
        && match bound {
            Bound::NonNegative => parsed >= 0.0,
            Bound::Positive => parsed > 0.0,
            Bound::UnitInterval => parsed > 0.0 && parsed <= 1.0,
            Bound::ClosedUnit => (0.0..=1.0).contains(&parsed),
        };
    if !ok {
        return Err(IdScanError::invalid_config(
            key,
            value,
            format!("out of range ({bound:?})"),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_is_the_id1_preset() {
        let config = DetectorConfig::default();
        assert_eq!(config.preprocessing, PreprocessMode::Adaptive);
        assert_eq!(config.scoring, ScoringMode::Weighted);
        assert!(config.adapt_to_resolution);
        assert_eq!(config, DetectorConfig::id1());
    }

    #[test]
    fn known_keys_are_applied_and_read_back() {
        let mut config = DetectorConfig::id1();
        assert!(config.set("canny_threshold1", "20").unwrap());
        assert!(config.set("canny_threshold2", "70").unwrap());
        assert!(config.set("preprocessing", "static").unwrap());
        assert_eq!(config.get("canny_threshold1").as_deref(), Some("20"));
        assert_eq!(config.get("preprocessing").as_deref(), Some("static"));
        assert_eq!(config.overrides.canny_high, Some(70.0));
    }

    #[test]
    fn unknown_keys_are_stored_but_ignored() {
        let mut config = DetectorConfig::id1();
        let before = config.resolve_profile((640, 480), 640.0 * 480.0).unwrap();
        assert!(!config.set("ocr_language", "deu").unwrap());
        assert_eq!(config.get("ocr_language").as_deref(), Some("deu"));
        let after = config.resolve_profile((640, 480), 640.0 * 480.0).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn bad_values_are_rejected_without_mutation() {
        let mut config = DetectorConfig::id1();
        assert!(config.set("approx_epsilon", "abc").is_err());
        assert!(config.set("approx_epsilon", "-0.1").is_err());
        assert!(config.set("max_area_ratio", "1.5").is_err());
        assert!(config.set("scoring", "random").is_err());
        assert_eq!(config, DetectorConfig::id1());
    }

    #[test]
    fn overrides_win_over_resolution_adaptation() {
        let mut config = DetectorConfig::id1();
        config.set("approx_epsilon", "0.05").unwrap();
        let profile = config.resolve_profile((2000, 1600), 2000.0 * 1600.0).unwrap();
        assert_relative_eq!(profile.epsilon_factor, 0.05);
        // Untouched fields still follow the Huge tier.
        assert_relative_eq!(profile.min_area_ratio, 0.002);
    }

    #[test]
    fn pixel_areas_convert_against_source_area() {
        let config = DetectorConfig::generic();
        let profile = config.resolve_profile((600, 400), 1200.0 * 800.0).unwrap();
        assert_relative_eq!(profile.min_area_ratio, 10_000.0 / 960_000.0);
        assert_relative_eq!(profile.max_area_ratio, 500_000.0 / 960_000.0);

        // A frame smaller than the maximum area clamps to the whole frame.
        let small = config.resolve_profile((400, 300), 120_000.0).unwrap();
        assert_relative_eq!(small.max_area_ratio, 1.0);
    }

    #[test]
    fn frame_below_minimum_pixel_area_finds_nothing() {
        let config = DetectorConfig::generic();
        let err = config.resolve_profile((90, 100), 9_000.0).unwrap_err();
        assert!(err.is_not_found(), "{err:?}");
        let err = config.resolve_profile((100, 100), 10_000.0).unwrap_err();
        assert!(err.is_not_found(), "{err:?}");
        assert!(config.resolve_profile((101, 100), 10_100.0).is_ok());

        // An inverted pixel window is still a configuration mistake.
        let mut inverted = DetectorConfig::generic();
        inverted.set("max_contour_area", "5000").unwrap();
        let err = inverted.resolve_profile((90, 100), 9_000.0).unwrap_err();
        assert!(matches!(err, IdScanError::InvalidConfig { .. }), "{err:?}");
    }

    #[test]
    fn conflicting_thresholds_fail_at_resolution() {
        let mut config = DetectorConfig::id1();
        config.set("canny_threshold1", "200").unwrap();
        let err = config.resolve_profile((640, 480), 307_200.0).unwrap_err();
        assert!(matches!(err, IdScanError::InvalidConfig { .. }));
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(DetectorConfig::preset("generic"), Some(DetectorConfig::generic()));
        assert_eq!(DetectorConfig::preset("ID1"), Some(DetectorConfig::id1()));
        assert!(DetectorConfig::preset("passport").is_none());
    }

    #[test]
    fn json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detector.json");

        let mut config = DetectorConfig::generic();
        config.set("custom_flag", "on").unwrap();
        config.save(&path).unwrap();

        let loaded = DetectorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = DetectorConfig::from_json_str(r#"{ "scoring": "largest_quad" }"#).unwrap();
        assert_eq!(config.scoring, ScoringMode::LargestQuad);
        assert_eq!(config.preprocessing, PreprocessMode::Adaptive);
    }

    #[test]
    fn scoring_params_reject_negative_weights() {
        let params = ScoringParams {
            aspect_weight: -1.0,
            ..ScoringParams::default()
        };
        assert!(params.validate().is_err());
        ScoringParams::default().validate().unwrap();
    }
}
