// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document detector: runs the full boundary pipeline on one frame:
// luma conversion, working-width downscale, profile resolution, edge
// preprocessing, contour filtering, candidate scoring, corner recovery and
// ordering, then normalisation back onto the caller's frame.

use image::{DynamicImage, GrayImage};
use idscan_core::{DetectorConfig, DocumentBounds, IdScanError, ImageView, ParameterProfile, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::scoring::ScoreBreakdown;
use crate::{bounds, contour, corners, luma, preprocess, scoring};

/// Recovered quadrilaterals smaller than this (in working pixels) are
/// treated as collinear.
const MIN_QUAD_AREA: f64 = 1.0;

/// A successful detection together with the diagnostics that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub bounds: DocumentBounds,
    pub score: ScoreBreakdown,
    /// Candidates that survived contour filtering.
    pub candidates: usize,
    /// Working-image scale relative to the source (`<= 1.0`).
    pub scale: f64,
    pub profile: ParameterProfile,
    /// Ordered corners in source-image pixels.
    pub corners_px: [(f64, f64); 4],
}

/// Locates a card-shaped document in still frames.
///
/// Holds only configuration; every call derives its own profile and scratch
/// images, so one detector may serve many threads through `&self`.
/// Reconfiguring takes `&mut self` and so cannot overlap a detection.
#[derive(Debug, Clone, Default)]
pub struct DocumentDetector {
    config: DetectorConfig,
}

impl DocumentDetector {
    // -- Construction ---------------------------------------------------------

    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Detector tuned for ID-1 cards.
    pub fn id1() -> Self {
        Self::new(DetectorConfig::id1())
    }

    /// Detector for generic rectangular documents.
    pub fn generic() -> Self {
        Self::new(DetectorConfig::generic())
    }

    // -- Configuration --------------------------------------------------------

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DetectorConfig {
        &mut self.config
    }

    /// See [`DetectorConfig::set`].
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<bool> {
        self.config.set(key, value)
    }

    pub fn get_config(&self, key: &str) -> Option<String> {
        self.config.get(key)
    }

    // -- Detection ------------------------------------------------------------

    /// Detect the document in a raw caller frame.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height(), format = ?image.format()))]
    pub fn detect(&self, image: &ImageView<'_>) -> Result<DocumentBounds> {
        self.detect_with_report(image).map(|d| d.bounds)
    }

    /// Like [`DocumentDetector::detect`], returning scores and intermediate
    /// measurements as well.
    pub fn detect_with_report(&self, image: &ImageView<'_>) -> Result<Detection> {
        let gray = luma::to_luma(image)?;
        self.run(gray)
    }

    /// Detect the document in an already-decoded grayscale image.
    #[instrument(skip(self, gray), fields(width = gray.width(), height = gray.height()))]
    pub fn detect_luma(&self, gray: &GrayImage) -> Result<Detection> {
        self.run(gray.clone())
    }

    /// Detect the document in any decoded image.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn detect_dynamic(&self, image: &DynamicImage) -> Result<Detection> {
        self.run(image.to_luma8())
    }

    fn run(&self, gray: GrayImage) -> Result<Detection> {
        let (source_w, source_h) = gray.dimensions();
        if source_w == 0 || source_h == 0 {
            return Err(IdScanError::InvalidInput(format!(
                "image dimensions must be non-zero, got {source_w}x{source_h}"
            )));
        }
        let config = &self.config;
        config.scoring_params.validate()?;

        let (working, scale) = luma::downscale(gray, config.max_working_width);
        let frame = working.dimensions();
        let profile = config.resolve_profile(frame, source_w as f64 * source_h as f64)?;

        let preprocessor =
            preprocess::for_mode(config.preprocessing, config.overrides.has_edge_thresholds());
        let edges = preprocessor.edge_map(&working, &profile);
        debug!(preprocessing = preprocessor.name(), "Edge map ready");

        self.locate(&edges, profile, (source_w, source_h), scale)
    }

    /// Contour filtering through normalisation, on an edge map of the working
    /// image. `source` is the caller's frame and `scale` the working-image
    /// scale relative to it.
    fn locate(
        &self,
        edges: &GrayImage,
        profile: ParameterProfile,
        source: (u32, u32),
        scale: f64,
    ) -> Result<Detection> {
        let frame = edges.dimensions();
        let candidates = contour::extract_candidates(edges, &profile);
        if candidates.is_empty() {
            debug!("No contour passed filtering");
            return Err(IdScanError::NoDocumentFound(
                "no contour passed the area filter".into(),
            ));
        }

        let scorer = scoring::for_mode(self.config.scoring, self.config.scoring_params);
        let best = scorer.select(&candidates, frame, &profile).ok_or_else(|| {
            IdScanError::NoDocumentFound(format!(
                "none of {} candidates cleared the {} score floor",
                candidates.len(),
                scorer.name()
            ))
        })?;

        let quad = corners::recover_quad(&best.polygon).ok_or_else(|| {
            IdScanError::NoDocumentFound(format!(
                "corner recovery left {} vertices",
                best.polygon.len()
            ))
        })?;
        let ordered = corners::order_corners(quad.map(|p| (p.x as f64, p.y as f64)));
        if corners::quad_area(&ordered) < MIN_QUAD_AREA {
            return Err(IdScanError::NoDocumentFound(
                "recovered corners are collinear".into(),
            ));
        }

        let corners_px = bounds::unscale(ordered, scale);
        let bounds = bounds::normalize(corners_px, source, best.score.total)?;

        info!(
            confidence = bounds.confidence,
            candidates = candidates.len(),
            scale,
            "Document detected"
        );
        Ok(Detection {
            bounds,
            score: best.score,
            candidates: candidates.len(),
            scale,
            profile,
            corners_px,
        })
    }
}
