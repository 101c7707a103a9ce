// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate scoring and selection.
//
// `WeightedScorer` rates each candidate on area, aspect, shape and position
// and keeps the best one above the score floor. `LargestQuadScorer` keeps the
// largest four-vertex approximation and falls back to the bounding box of the
// largest contour.

use imageproc::geometry::contour_area;
use imageproc::point::Point;
use idscan_core::ParameterProfile;
use idscan_core::config::{ScoringMode, ScoringParams};
use serde::Serialize;
use tracing::debug;

use crate::contour::Candidate;
use crate::geometry::{BoundingBox, approximate_closed, distance, min_enclosing_circle};

/// Per-component scores of the winning candidate, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub area: f64,
    pub aspect: f64,
    pub shape: f64,
    pub position: f64,
    pub total: f64,
}

/// The selected candidate's approximated polygon and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// Index into the candidate slice.
    pub index: usize,
    pub polygon: Vec<Point<i32>>,
    pub score: ScoreBreakdown,
}

pub trait CandidateScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Pick the best candidate, or `None` when nothing clears the floor.
    fn select(
        &self,
        candidates: &[Candidate],
        frame: (u32, u32),
        profile: &ParameterProfile,
    ) -> Option<ScoredCandidate>;
}

/// The scorer a configuration asks for.
pub fn for_mode(mode: ScoringMode, params: ScoringParams) -> Box<dyn CandidateScorer> {
    match mode {
        ScoringMode::Weighted => Box::new(WeightedScorer { params }),
        ScoringMode::LargestQuad => Box::new(LargestQuadScorer {
            min_score: params.min_score,
        }),
    }
}

// -- Weighted ----------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer {
    pub params: ScoringParams,
}

impl WeightedScorer {
    /// Approximate `candidate` and rate the result.
    pub fn score(
        &self,
        candidate: &Candidate,
        frame: (u32, u32),
        profile: &ParameterProfile,
    ) -> (Vec<Point<i32>>, ScoreBreakdown) {
        let polygon = approximate_closed(&candidate.points, profile.epsilon_factor);
        if polygon.len() < 4 {
            return (polygon, ScoreBreakdown::default());
        }
        let Some(bounds) = BoundingBox::of(&polygon) else {
            return (polygon, ScoreBreakdown::default());
        };

        let frame_area = frame.0 as f64 * frame.1 as f64;
        let area = self.area_score(contour_area(&polygon) / frame_area);
        let aspect = aspect_score(bounds.aspect_ratio(), profile);
        let shape = shape_score(polygon.len());
        let position = position_score(&polygon, frame);

        let p = &self.params;
        let total = (area * p.area_weight
            + aspect * p.aspect_weight
            + shape * p.shape_weight
            + position * p.position_weight)
            .clamp(0.0, 1.0);

        let breakdown = ScoreBreakdown {
            area,
            aspect,
            shape,
            position,
            total,
        };
        (polygon, breakdown)
    }

    pub fn area_score(&self, ratio: f64) -> f64 {
        let p = &self.params;
        if ratio < p.allowed_area.0 || ratio > p.allowed_area.1 {
            0.0
        } else if ratio >= p.optimal_area.0 && ratio <= p.optimal_area.1 {
            1.0
        } else if ratio > p.near_full_frame_area {
            p.near_full_frame_score
        } else {
            p.partial_area_score
        }
    }
}

/// Linear falloff from 1 at the target aspect to 0 at the tolerance.
pub fn aspect_score(aspect: f64, profile: &ParameterProfile) -> f64 {
    let deviation = (aspect - profile.target_aspect_ratio).abs() / profile.target_aspect_ratio;
    if deviation <= profile.aspect_tolerance {
        1.0 - deviation / profile.aspect_tolerance
    } else {
        0.0
    }
}

pub fn shape_score(vertices: usize) -> f64 {
    match vertices {
        4 => 1.0,
        5..=8 => 0.8,
        9..=12 => 0.5,
        _ => 0.0,
    }
}

/// 1 at the frame centre, falling to 0 at a corner.
pub fn position_score(polygon: &[Point<i32>], frame: (u32, u32)) -> f64 {
    let Some(circle) = min_enclosing_circle(polygon) else {
        return 0.0;
    };
    let centre = (frame.0 as f64 / 2.0, frame.1 as f64 / 2.0);
    let max_distance = centre.0.hypot(centre.1);
    if max_distance <= 0.0 {
        return 0.0;
    }
    (1.0 - distance(circle.center, centre) / max_distance).max(0.0)
}

impl CandidateScorer for WeightedScorer {
    fn name(&self) -> &'static str {
        ScoringMode::Weighted.as_str()
    }

    fn select(
        &self,
        candidates: &[Candidate],
        frame: (u32, u32),
        profile: &ParameterProfile,
    ) -> Option<ScoredCandidate> {
        let mut best: Option<ScoredCandidate> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            let (polygon, score) = self.score(candidate, frame, profile);
            debug!(
                index,
                vertices = polygon.len(),
                area = score.area,
                aspect = score.aspect,
                shape = score.shape,
                position = score.position,
                total = score.total,
                "Candidate scored"
            );
            if best.as_ref().is_none_or(|b| score.total > b.score.total) {
                best = Some(ScoredCandidate {
                    index,
                    polygon,
                    score,
                });
            }
        }
        best.filter(|b| b.score.total > self.params.min_score)
    }
}

// -- Largest quadrilateral ---------------------------------------------------

/// Approximation tolerance used when grading the winner's shape.
const CONFIDENCE_EPSILON: f64 = 0.02;
/// Area ratio of a typical document shot, and the window that earns credit.
const CONFIDENCE_AREA_PEAK: f64 = 0.4;
const CONFIDENCE_AREA_RANGE: (f64, f64) = (0.1, 0.8);

#[derive(Debug, Clone, Copy)]
pub struct LargestQuadScorer {
    pub min_score: f64,
}

impl Default for LargestQuadScorer {
    fn default() -> Self {
        Self {
            min_score: ScoringParams::default().min_score,
        }
    }
}

impl LargestQuadScorer {
    /// Mean of an area-plausibility and a shape-plausibility grade.
    pub fn confidence(polygon: &[Point<i32>], frame: (u32, u32)) -> ScoreBreakdown {
        let frame_area = frame.0 as f64 * frame.1 as f64;
        let ratio = contour_area(polygon) / frame_area;
        let area = if (CONFIDENCE_AREA_RANGE.0..=CONFIDENCE_AREA_RANGE.1).contains(&ratio) {
            1.0 - (CONFIDENCE_AREA_PEAK - ratio).abs() / CONFIDENCE_AREA_PEAK
        } else {
            0.0
        };
        let shape = match approximate_closed(polygon, CONFIDENCE_EPSILON).len() {
            4 => 1.0,
            3..=6 => 0.7,
            _ => 0.3,
        };
        ScoreBreakdown {
            area,
            shape,
            total: (area + shape) / 2.0,
            ..ScoreBreakdown::default()
        }
    }
}

impl CandidateScorer for LargestQuadScorer {
    fn name(&self) -> &'static str {
        ScoringMode::LargestQuad.as_str()
    }

    fn select(
        &self,
        candidates: &[Candidate],
        frame: (u32, u32),
        profile: &ParameterProfile,
    ) -> Option<ScoredCandidate> {
        let mut best_quad: Option<(usize, Vec<Point<i32>>, f64)> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            let polygon = approximate_closed(&candidate.points, profile.epsilon_factor);
            if polygon.len() != 4 {
                continue;
            }
            let area = contour_area(&polygon);
            if best_quad.as_ref().is_none_or(|(_, _, best)| area > *best) {
                best_quad = Some((index, polygon, area));
            }
        }

        let (index, polygon, score) = match best_quad {
            Some((index, polygon, _)) => {
                let score = Self::confidence(&polygon, frame);
                (index, polygon, score)
            }
            None => {
                let (index, largest) = candidates
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.area.total_cmp(&b.1.area))?;
                debug!(index, "No quadrilateral; using bounding box of largest contour");
                let approx = approximate_closed(&largest.points, profile.epsilon_factor);
                let score = Self::confidence(&approx, frame);
                (index, largest.bounds.corners().to_vec(), score)
            }
        };

        debug!(index, total = score.total, "Largest-quad selection");
        (score.total > self.min_score).then_some(ScoredCandidate {
            index,
            polygon,
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use idscan_core::profile::ResolutionTier;

    fn candidate(points: &[(i32, i32)]) -> Candidate {
        Candidate::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap()
    }

    /// Axis-aligned rectangle with ID-1 proportions centred in a 627x470 frame.
    fn centred_card() -> Candidate {
        candidate(&[(100, 100), (526, 100), (526, 369), (100, 369)])
    }

    #[test]
    fn area_windows() {
        let scorer = WeightedScorer::default();
        assert_eq!(scorer.area_score(0.001), 0.0);
        assert_eq!(scorer.area_score(0.005), 0.5);
        assert_eq!(scorer.area_score(0.4), 1.0);
        assert_eq!(scorer.area_score(0.8), 0.5);
        assert_eq!(scorer.area_score(0.9), 0.9);
        assert_eq!(scorer.area_score(0.995), 0.0);
    }

    #[test]
    fn aspect_falls_off_linearly() {
        let profile = ResolutionTier::Medium.profile();
        assert_abs_diff_eq!(aspect_score(1.586, &profile), 1.0, epsilon = 1e-9);
        // Half the tolerance away scores one half.
        let half = 1.586 * (1.0 + profile.aspect_tolerance / 2.0);
        assert_abs_diff_eq!(aspect_score(half, &profile), 0.5, epsilon = 1e-9);
        assert_eq!(aspect_score(0.9, &profile), 0.0);
    }

    #[test]
    fn shape_grades_by_vertex_count() {
        assert_eq!(shape_score(4), 1.0);
        assert_eq!(shape_score(6), 0.8);
        assert_eq!(shape_score(12), 0.5);
        assert_eq!(shape_score(3), 0.0);
        assert_eq!(shape_score(13), 0.0);
    }

    #[test]
    fn centred_polygon_has_full_position_score() {
        let polygon = centred_card().points;
        assert_abs_diff_eq!(position_score(&polygon, (626, 469)), 1.0, epsilon = 1e-9);
        let corner = [Point::new(0, 0), Point::new(10, 0), Point::new(10, 10), Point::new(0, 10)];
        assert!(position_score(&corner, (626, 469)) < 0.05);
    }

    #[test]
    fn centred_card_scores_high() {
        let scorer = WeightedScorer::default();
        let profile = ResolutionTier::Medium.profile();
        let (polygon, score) = scorer.score(&centred_card(), (627, 470), &profile);
        assert_eq!(polygon.len(), 4);
        assert_eq!(score.area, 1.0);
        assert_eq!(score.shape, 1.0);
        assert!(score.aspect > 0.99, "aspect {}", score.aspect);
        assert!(score.total > 0.95, "total {}", score.total);
    }

    #[test]
    fn cropped_full_frame_octagon_gets_near_full_frame_credit() {
        let octagon = candidate(&[
            (40, 0),
            (276, 0),
            (316, 40),
            (316, 159),
            (276, 199),
            (40, 199),
            (0, 159),
            (0, 40),
        ]);
        let scorer = WeightedScorer::default();
        let (polygon, score) = scorer.score(&octagon, (317, 200), &ResolutionTier::Small.profile());
        assert_eq!(polygon.len(), 8);
        assert_eq!(score.area, 0.9);
        assert_eq!(score.shape, 0.8);
        assert!(score.aspect > 0.99);
        assert!(score.total > 0.9);
    }

    #[test]
    fn weighted_selection_prefers_card_over_square() {
        let square = candidate(&[(20, 20), (220, 20), (220, 220), (20, 220)]);
        let candidates = [square, centred_card()];
        let best = WeightedScorer::default()
            .select(&candidates, (627, 470), &ResolutionTier::Medium.profile())
            .unwrap();
        assert_eq!(best.index, 1);
    }

    #[test]
    fn weighted_selection_respects_floor() {
        let triangle = candidate(&[(10, 10), (200, 10), (100, 150)]);
        let scorer = WeightedScorer::default();
        assert!(scorer.select(&[triangle], (627, 470), &ResolutionTier::Medium.profile()).is_none());
        assert!(scorer.select(&[], (627, 470), &ResolutionTier::Medium.profile()).is_none());
    }

    #[test]
    fn largest_quad_prefers_bigger_quadrilateral() {
        let small = candidate(&[(10, 10), (60, 10), (60, 50), (10, 50)]);
        let big = centred_card();
        let best = LargestQuadScorer::default()
            .select(&[small, big], (627, 470), &ResolutionTier::Medium.profile())
            .unwrap();
        assert_eq!(best.index, 1);
        assert_eq!(best.score.shape, 1.0);
        // 427 * 270 / (627 * 470) is close to the 0.4 peak.
        assert!(best.score.area > 0.95);
    }

    #[test]
    fn largest_quad_falls_back_to_bounding_box() {
        let triangle = candidate(&[(100, 100), (500, 100), (300, 400)]);
        let best = LargestQuadScorer::default()
            .select(&[triangle], (627, 470), &ResolutionTier::Medium.profile())
            .unwrap();
        assert_eq!(
            best.polygon,
            vec![
                Point::new(100, 100),
                Point::new(500, 100),
                Point::new(500, 400),
                Point::new(100, 400)
            ]
        );
        assert_eq!(best.score.shape, 0.7);
    }
}
