// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner recovery and canonical ordering.

use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use tracing::{debug, warn};

use crate::geometry::approximate_closed;

/// Hull simplification tolerance as a fraction of hull perimeter.
pub const HULL_EPSILON: f64 = 0.02;

/// Reduce an approximated polygon to exactly four corners.
///
/// Quadrilaterals pass through. Larger polygons go through their convex hull,
/// a coarser simplification of the hull, and finally the four axis-extremal
/// hull points. Returns `None` when fewer than four distinct corners remain.
pub fn recover_quad(polygon: &[Point<i32>]) -> Option<[Point<i32>; 4]> {
    if polygon.len() < 4 {
        return None;
    }
    if let Ok(quad) = <[Point<i32>; 4]>::try_from(polygon) {
        return Some(quad);
    }

    let mut reduced = convex_hull(polygon.to_vec());
    if reduced.len() > 4 {
        reduced = approximate_closed(&reduced, HULL_EPSILON);
    }
    if reduced.len() > 4 {
        debug!(vertices = reduced.len(), "Falling back to extremal hull points");
        reduced = extremal_points(&reduced);
    }

    let recovered = <[Point<i32>; 4]>::try_from(reduced.as_slice()).ok();
    if recovered.is_none() {
        warn!(vertices = reduced.len(), "Corner recovery left no quadrilateral");
    }
    recovered
}

/// Leftmost, rightmost, topmost and bottommost points, duplicates removed.
fn extremal_points(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let picks = [
        points.iter().min_by_key(|p| p.x),
        points.iter().max_by_key(|p| p.x),
        points.iter().min_by_key(|p| p.y),
        points.iter().max_by_key(|p| p.y),
    ];
    let mut out: Vec<Point<i32>> = Vec::with_capacity(4);
    for p in picks.into_iter().flatten() {
        if !out.contains(p) {
            out.push(*p);
        }
    }
    out
}

/// Order four corners as top-left, top-right, bottom-right, bottom-left.
///
/// Corners are sorted by angle about their centroid, which walks the quad
/// clockwise on screen (y grows downward), and the cycle is rotated so the
/// corner nearest the origin comes first. Ties on distance go to the smaller
/// y, then the smaller x.
pub fn order_corners(corners: [(f64, f64); 4]) -> [(f64, f64); 4] {
    let cx = corners.iter().map(|c| c.0).sum::<f64>() / 4.0;
    let cy = corners.iter().map(|c| c.1).sum::<f64>() / 4.0;

    let mut sorted = corners;
    sorted.sort_by(|a, b| {
        let angle_a = (a.1 - cy).atan2(a.0 - cx);
        let angle_b = (b.1 - cy).atan2(b.0 - cx);
        angle_a.total_cmp(&angle_b)
    });

    let first = (0..4)
        .min_by(|&i, &j| {
            let (a, b) = (sorted[i], sorted[j]);
            (a.0 * a.0 + a.1 * a.1)
                .total_cmp(&(b.0 * b.0 + b.1 * b.1))
                .then(a.1.total_cmp(&b.1))
                .then(a.0.total_cmp(&b.0))
        })
        .unwrap_or(0);
    sorted.rotate_left(first);
    sorted
}

/// Area of a quadrilateral given in order (shoelace formula).
pub fn quad_area(corners: &[(f64, f64); 4]) -> f64 {
    let mut twice_area = 0.0;
    for i in 0..4 {
        let j = (i + 1) % 4;
        twice_area += corners[i].0 * corners[j].1 - corners[j].0 * corners[i].1;
    }
    twice_area.abs() / 2.0
}
