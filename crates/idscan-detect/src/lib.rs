// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// idscan-detect: Locates an ID-1 card in a still frame and reports its four
// corners in normalised coordinates with a confidence score.
//
// Pipeline: luma conversion and downscale (`luma`), edge map (`preprocess`),
// external contours and filtering (`contour`), candidate scoring
// (`scoring`), corner recovery and ordering (`corners`), normalisation
// (`bounds`). `DocumentDetector` drives the stages.

pub mod bounds;
pub mod contour;
pub mod corners;
pub mod detector;
pub mod geometry;
pub mod luma;
pub mod preprocess;
pub mod scoring;

#[cfg(test)]
mod test_support;

pub use detector::{Detection, DocumentDetector};
pub use preprocess::{AdaptivePreprocessor, EdgePreprocessor, StaticPreprocessor};
pub use scoring::{CandidateScorer, LargestQuadScorer, ScoreBreakdown, WeightedScorer};
