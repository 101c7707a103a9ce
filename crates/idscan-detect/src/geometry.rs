// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon helpers on integer contour points: guarded Douglas-Peucker
// approximation, bounding boxes, and the minimum enclosing circle.

use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use serde::Serialize;

/// Simplify a closed contour with tolerance `epsilon_factor` x perimeter.
///
/// The loop is split at two mutually distant points (the point farthest from
/// the trace start, then the point farthest from that one) and each arc
/// between them is simplified on its own. The seam vertices are extreme
/// points of the curve, so the trace start is never forced into the result.
/// Curves with fewer than three points, or a non-positive tolerance, are
/// returned unchanged.
pub fn approximate_closed(points: &[Point<i32>], epsilon_factor: f64) -> Vec<Point<i32>> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let epsilon = epsilon_factor * arc_length(points, true);
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return points.to_vec();
    }

    let (first, _) = farthest_from(points, points[0]);
    let (second, spread) = farthest_from(points, points[first]);
    if spread == 0 {
        return points.to_vec();
    }
    let (lo, hi) = (first.min(second), first.max(second));

    let mut wrapping = points[hi..].to_vec();
    wrapping.extend_from_slice(&points[..=lo]);

    let mut simplified = approximate_polygon_dp(&points[lo..=hi], epsilon, false);
    simplified.pop();
    let mut tail = approximate_polygon_dp(&wrapping, epsilon, false);
    tail.pop();
    simplified.extend(tail);
    simplified
}

/// Index of the point farthest from `origin` and its squared distance.
/// Ties keep the later point.
fn farthest_from(points: &[Point<i32>], origin: Point<i32>) -> (usize, i64) {
    points
        .iter()
        .map(|p| {
            let (dx, dy) = ((p.x - origin.x) as i64, (p.y - origin.y) as i64);
            dx * dx + dy * dy
        })
        .enumerate()
        .max_by_key(|&(_, d)| d)
        .unwrap_or((0, 0))
}

/// Axis-aligned bounding box in pixel units. `width` and `height` count
/// pixels, so a single point has size 1x1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn of(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// True when the box is exactly the `frame_width` x `frame_height` frame.
    pub fn covers_frame(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x == 0
            && self.y == 0
            && self.width as i64 == frame_width as i64
            && self.height as i64 == frame_height as i64
    }

    /// The four box corners, clockwise from the top-left, on the outermost
    /// pixel centres.
    pub fn corners(&self) -> [Point<i32>; 4] {
        let (right, bottom) = (self.x + self.width - 1, self.y + self.height - 1);
        [
            Point::new(self.x, self.y),
            Point::new(right, self.y),
            Point::new(right, bottom),
            Point::new(self.x, bottom),
        ]
    }
}

// -- Minimum enclosing circle ------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: (f64, f64),
    pub radius: f64,
}

impl Circle {
    fn contains(&self, p: (f64, f64)) -> bool {
        distance(self.center, p) <= self.radius * (1.0 + 1e-9) + 1e-9
    }

    fn from_diameter(a: (f64, f64), b: (f64, f64)) -> Self {
        let center = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
        Self {
            center,
            radius: distance(a, b) / 2.0,
        }
    }

    /// Circumcircle of three points; collinear triples fall back to the circle
    /// on their farthest pair.
    fn through(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Self {
        let d = 2.0 * (a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1));
        if d.abs() < 1e-12 {
            let pairs = [(a, b), (b, c), (a, c)];
            let (p, q) = pairs
                .into_iter()
                .max_by(|x, y| distance(x.0, x.1).total_cmp(&distance(y.0, y.1)))
                .unwrap_or((a, b));
            return Self::from_diameter(p, q);
        }
        let (a2, b2, c2) = (
            a.0 * a.0 + a.1 * a.1,
            b.0 * b.0 + b.1 * b.1,
            c.0 * c.0 + c.1 * c.1,
        );
        let ux = (a2 * (b.1 - c.1) + b2 * (c.1 - a.1) + c2 * (a.1 - b.1)) / d;
        let uy = (a2 * (c.0 - b.0) + b2 * (a.0 - c.0) + c2 * (b.0 - a.0)) / d;
        Self {
            center: (ux, uy),
            radius: distance((ux, uy), a),
        }
    }
}

/// Smallest circle enclosing every point (incremental Welzl construction).
/// Returns `None` for an empty slice.
pub fn min_enclosing_circle(points: &[Point<i32>]) -> Option<Circle> {
    let pts: Vec<(f64, f64)> = points.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let first = *pts.first()?;
    let mut circle = Circle {
        center: first,
        radius: 0.0,
    };
    for i in 1..pts.len() {
        if circle.contains(pts[i]) {
            continue;
        }
        circle = Circle {
            center: pts[i],
            radius: 0.0,
        };
        for j in 0..i {
            if circle.contains(pts[j]) {
                continue;
            }
            circle = Circle::from_diameter(pts[i], pts[j]);
            for k in 0..j {
                if !circle.contains(pts[k]) {
                    circle = Circle::through(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    Some(circle)
}

pub(crate) fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rect_outline(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point<i32>> {
        let mut pts = Vec::new();
        for x in x0..=x1 {
            pts.push(Point::new(x, y0));
        }
        for y in y0 + 1..=y1 {
            pts.push(Point::new(x1, y));
        }
        for x in (x0..x1).rev() {
            pts.push(Point::new(x, y1));
        }
        for y in (y0 + 1..y1).rev() {
            pts.push(Point::new(x0, y));
        }
        pts
    }

    #[test]
    fn approximation_reduces_traced_rectangle_to_four_vertices() {
        let outline = rect_outline(10, 20, 90, 70);
        let approx = approximate_closed(&outline, 0.02);
        assert_eq!(approx.len(), 4, "got {approx:?}");
        for corner in [(10, 20), (90, 20), (90, 70), (10, 70)] {
            assert!(approx.contains(&Point::new(corner.0, corner.1)));
        }
    }

    /// A trace that starts in the middle of an edge must not leave that
    /// start point behind as an extra vertex.
    #[test]
    fn approximation_ignores_a_mid_edge_trace_start() {
        let mut outline = rect_outline(10, 20, 90, 70);
        let start = outline.iter().position(|p| *p == Point::new(50, 20)).unwrap();
        outline.rotate_left(start);

        let approx = approximate_closed(&outline, 0.02);
        assert_eq!(approx.len(), 4, "got {approx:?}");
        for corner in [(10, 20), (90, 20), (90, 70), (10, 70)] {
            assert!(approx.contains(&Point::new(corner.0, corner.1)), "missing {corner:?} in {approx:?}");
        }
    }

    /// A rounded corner traced from its top edge still reduces to four
    /// vertices, each close to a true corner.
    #[test]
    fn approximation_of_chamfered_rectangle_started_on_top_edge() {
        let mut outline = Vec::new();
        for x in 14..=90 {
            outline.push(Point::new(x, 20));
        }
        for y in 21..=70 {
            outline.push(Point::new(90, y));
        }
        for x in (10..90).rev() {
            outline.push(Point::new(x, 70));
        }
        for y in (24..70).rev() {
            outline.push(Point::new(10, y));
        }
        for i in 1..4 {
            outline.push(Point::new(10 + i, 24 - i));
        }

        let approx = approximate_closed(&outline, 0.02);
        assert_eq!(approx.len(), 4, "got {approx:?}");
        assert!(
            approx.iter().any(|p| (p.x - 10).abs() <= 4 && (p.y - 20).abs() <= 4),
            "no top-left vertex in {approx:?}"
        );
    }

    #[test]
    fn approximation_keeps_every_vertex_of_a_quadrilateral() {
        let quad = vec![
            Point::new(100, 100),
            Point::new(526, 100),
            Point::new(526, 369),
            Point::new(100, 369),
        ];
        assert_eq!(approximate_closed(&quad, 0.015), quad);
    }

    #[test]
    fn approximation_leaves_degenerate_curves_alone() {
        let two = vec![Point::new(0, 0), Point::new(5, 5)];
        assert_eq!(approximate_closed(&two, 0.02), two);
        let outline = rect_outline(0, 0, 4, 4);
        assert_eq!(approximate_closed(&outline, 0.0), outline);
    }

    #[test]
    fn bounding_box_counts_pixels() {
        let bbox = BoundingBox::of(&rect_outline(0, 0, 9, 4)).unwrap();
        assert_eq!(bbox, BoundingBox { x: 0, y: 0, width: 10, height: 5 });
        assert!(bbox.covers_frame(10, 5));
        assert!(!bbox.covers_frame(11, 5));
        assert_abs_diff_eq!(bbox.aspect_ratio(), 2.0);
        assert_eq!(bbox.corners()[2], Point::new(9, 4));
        assert!(BoundingBox::of(&[]).is_none());
    }

    #[test]
    fn enclosing_circle_of_rectangle_is_centred() {
        let corners = [
            Point::new(0, 0),
            Point::new(8, 0),
            Point::new(8, 6),
            Point::new(0, 6),
        ];
        let circle = min_enclosing_circle(&corners).unwrap();
        assert_abs_diff_eq!(circle.center.0, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(circle.center.1, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(circle.radius, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn enclosing_circle_of_obtuse_triangle_uses_longest_side() {
        let pts = [Point::new(0, 0), Point::new(10, 0), Point::new(5, 1)];
        let circle = min_enclosing_circle(&pts).unwrap();
        assert_abs_diff_eq!(circle.radius, 5.0, epsilon = 1e-9);
        for p in pts {
            assert!(distance(circle.center, (p.x as f64, p.y as f64)) <= circle.radius + 1e-9);
        }
    }
}
