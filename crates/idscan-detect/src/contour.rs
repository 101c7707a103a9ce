// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour extraction and filtering: trace the outermost borders of the edge
// map and keep the ones whose size and framing could be a card.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::contour_area;
use imageproc::point::Point;
use idscan_core::ParameterProfile;
use tracing::debug;

use crate::geometry::BoundingBox;

/// Aspect window for contours whose bounding box is the whole frame. Such a
/// contour is usually the frame border itself, unless the card was cropped
/// tightly and fills the shot.
pub const FULL_FRAME_ASPECT_RANGE: (f64, f64) = (1.2, 2.2);

/// A retained contour together with the measurements later stages reuse.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub points: Vec<Point<i32>>,
    /// Enclosed area in pixels.
    pub area: f64,
    pub bounds: BoundingBox,
}

impl Candidate {
    /// Measure a traced contour. Returns `None` for degenerate contours
    /// (fewer than three points).
    pub fn new(points: Vec<Point<i32>>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let bounds = BoundingBox::of(&points)?;
        let area = contour_area(&points);
        Some(Self {
            points,
            area,
            bounds,
        })
    }
}

/// Outer borders that are not nested inside any other border.
pub fn external_contours(edges: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Keep contours whose area ratio lies within the profile's range, dropping
/// full-frame contours whose aspect is implausible for a card.
pub fn filter_candidates(
    contours: Vec<Vec<Point<i32>>>,
    frame: (u32, u32),
    profile: &ParameterProfile,
) -> Vec<Candidate> {
    let (width, height) = frame;
    let frame_area = width as f64 * height as f64;
    let total = contours.len();

    let kept: Vec<Candidate> = contours
        .into_iter()
        .filter_map(Candidate::new)
        .filter(|c| {
            let ratio = c.area / frame_area;
            ratio >= profile.min_area_ratio && ratio <= profile.max_area_ratio
        })
        .filter(|c| {
            if !c.bounds.covers_frame(width, height) {
                return true;
            }
            let aspect = c.bounds.aspect_ratio();
            aspect >= FULL_FRAME_ASPECT_RANGE.0 && aspect <= FULL_FRAME_ASPECT_RANGE.1
        })
        .collect();

    debug!(total, kept = kept.len(), "Contours filtered");
    kept
}

/// Trace and filter in one step.
pub fn extract_candidates(
    edges: &GrayImage,
    profile: &ParameterProfile,
) -> Vec<Candidate> {
    filter_candidates(external_contours(edges), edges.dimensions(), profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use idscan_core::profile::ResolutionTier;
    use image::Luma;
    use imageproc::drawing::draw_hollow_rect_mut;
    use imageproc::rect::Rect;

    fn corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    fn profile(min: f64, max: f64) -> ParameterProfile {
        ParameterProfile {
            min_area_ratio: min,
            max_area_ratio: max,
            ..ResolutionTier::Small.profile()
        }
    }

    #[test]
    fn nested_borders_are_not_external() {
        let mut edges = GrayImage::new(100, 80);
        draw_hollow_rect_mut(&mut edges, Rect::at(10, 10).of_size(80, 60), Luma([255u8]));
        draw_hollow_rect_mut(&mut edges, Rect::at(30, 30).of_size(20, 20), Luma([255u8]));
        let contours = external_contours(&edges);
        assert_eq!(contours.len(), 1);
        let bbox = BoundingBox::of(&contours[0]).unwrap();
        assert_eq!(bbox, BoundingBox { x: 10, y: 10, width: 80, height: 60 });
    }

    #[test]
    fn area_exactly_at_minimum_is_kept_and_just_below_is_dropped() {
        // 100x100 frame, minimum 5% = 500 px.
        let at_min = corners(10, 10, 35, 30); // 25 x 20
        let below = corners(10, 10, 35, 29); // 25 x 19
        let kept = filter_candidates(vec![at_min.clone(), below], (100, 100), &profile(0.05, 0.95));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].points, at_min);
        assert_eq!(kept[0].area, 500.0);
    }

    #[test]
    fn oversized_contours_are_dropped() {
        let huge = corners(0, 0, 98, 98);
        assert!(filter_candidates(vec![huge], (100, 100), &profile(0.05, 0.9)).is_empty());
    }

    #[test]
    fn full_frame_contours_need_a_card_like_aspect() {
        // Octagon spanning a 317x200 frame: corners cut 40 px deep.
        let octagon = vec![
            Point::new(40, 0),
            Point::new(276, 0),
            Point::new(316, 40),
            Point::new(316, 159),
            Point::new(276, 199),
            Point::new(40, 199),
            Point::new(0, 159),
            Point::new(0, 40),
        ];
        let kept = filter_candidates(vec![octagon.clone()], (317, 200), &profile(0.05, 0.95));
        assert_eq!(kept.len(), 1);
        assert!(kept[0].bounds.covers_frame(317, 200));

        // Same shape in a square frame has aspect 1.0 and is the frame border.
        let square: Vec<Point<i32>> = octagon
            .iter()
            .map(|p| Point::new(p.x * 200 / 317, p.y))
            .collect();
        let width = BoundingBox::of(&square).unwrap().width as u32;
        assert!(filter_candidates(vec![square], (width, 200), &profile(0.05, 0.95)).is_empty());
    }

    #[test]
    fn degenerate_contours_are_skipped() {
        let line = vec![Point::new(1, 1), Point::new(50, 1)];
        assert!(Candidate::new(line).is_none());
    }
}
