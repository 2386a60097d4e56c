//! Geometry kernel adapter: the curve operations the cutting engine consumes.
//!
//! The engine only talks to [`GeometryKernel`]; [`PolylineKernel`] is the
//! built-in implementation for straight-segment profiles lying in the XY plane.

use crate::errors::KernelError;
use crate::geometry::{Point, Vector};

/// Parameter distance under which two curve parameters are treated as equal.
const PARAM_TOLERANCE: f64 = 1.0e-9;

/// Distance under which consecutive polyline points are merged.
const POINT_TOLERANCE: f64 = 1.0e-9;

/// An ordered point sequence. Closed polylines repeat their first point at the end.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polyline {
    /// Vertices in order.
    points: Vec<Point>,
}

impl Polyline {
    /// Wrap a point sequence as-is.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build a closed polyline through `corners`, appending the closing point when missing.
    #[must_use]
    pub fn closed(mut corners: Vec<Point>) -> Self {
        if let (Some(first), Some(last)) = (corners.first().copied(), corners.last()) {
            if corners.len() > 1 && nalgebra::distance(&first, last) > POINT_TOLERANCE {
                corners.push(first);
            } else if corners.len() == 1 {
                corners.push(first);
            }
        }
        Self { points: corners }
    }

    /// All vertices, including the closing duplicate of a closed polyline.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Distinct corners: the vertices without the closing duplicate.
    #[must_use]
    pub fn corners(&self) -> &[Point] {
        if self.is_closed() {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    /// Whether the last vertex repeats the first.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 2 => {
                nalgebra::distance(first, last) <= POINT_TOLERANCE
            }
            _ => false,
        }
    }

    /// Number of straight segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Total length of all segments.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| nalgebra::distance(&pair[0], &pair[1]))
            .sum()
    }

    /// Signed area of the corners projected onto the XY plane (shoelace formula).
    ///
    /// Positive for counter-clockwise, negative for clockwise.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        signed_area_2d(self.corners())
    }

    /// Whether `target` lies inside or within `tolerance` of the boundary, in the XY plane.
    #[must_use]
    pub fn contains(&self, target: &Point, tolerance: f64) -> bool {
        let corners = self.corners();
        if corners.len() < 3 {
            return false;
        }
        if self.boundary_distance(target) <= tolerance {
            return true;
        }
        crossing_number(corners, target) % 2 == 1
    }

    /// Whether `target` lies inside and farther than `tolerance` from the boundary.
    #[must_use]
    pub fn strictly_contains(&self, target: &Point, tolerance: f64) -> bool {
        let corners = self.corners();
        corners.len() >= 3
            && self.boundary_distance(target) > tolerance
            && crossing_number(corners, target) % 2 == 1
    }

    /// Smallest XY distance from `target` to any segment of the closed outline.
    #[must_use]
    pub fn boundary_distance(&self, target: &Point) -> f64 {
        let corners = self.corners();
        (0..corners.len())
            .map(|i| {
                let a = corners[i];
                let b = corners[(i + 1) % corners.len()];
                point_segment_distance_2d(target, &a, &b)
            })
            .fold(f64::INFINITY, f64::min)
    }
}

/// Signed area of a polygon in the XY plane.
#[must_use]
pub fn signed_area_2d(corners: &[Point]) -> f64 {
    let n = corners.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += corners[i].x * corners[j].y - corners[j].x * corners[i].y;
    }
    sum * 0.5
}

/// Crossing number of a horizontal ray from `target` against the closed outline `corners`.
fn crossing_number(corners: &[Point], target: &Point) -> usize {
    let mut crossings = 0;
    for i in 0..corners.len() {
        let a = corners[i];
        let b = corners[(i + 1) % corners.len()];
        if (a.y <= target.y) != (b.y <= target.y) {
            let t = (target.y - a.y) / (b.y - a.y);
            if target.x < a.x + t * (b.x - a.x) {
                crossings += 1;
            }
        }
    }
    crossings
}

/// XY distance from `target` to the segment `a`–`b`.
fn point_segment_distance_2d(target: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < 1e-20 {
        return (target.x - a.x).hypot(target.y - a.y);
    }
    let t = (((target.x - a.x) * dx + (target.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    (target.x - (a.x + t * dx)).hypot(target.y - (a.y + t * dy))
}

/// Curve operations consumed by the joint-cutting engine.
///
/// Curves are closed [`Polyline`]s whose parameter domain is `[0, 1]`.
pub trait GeometryKernel {
    /// All intersection points between two curves within `tolerance`, without duplicates.
    fn intersect(&self, a: &Polyline, b: &Polyline, tolerance: f64) -> Vec<Point>;

    /// Split a closed curve at the given parameters.
    ///
    /// `k` distinct parameters produce `k` pieces in cyclic order, each running
    /// forward from one split parameter to the next.
    fn split(&self, curve: &Polyline, params: &[f64]) -> Vec<Polyline>;

    /// Parameter of the point on `curve` nearest to `target`.
    fn closest_param(&self, curve: &Polyline, target: &Point) -> f64;

    /// Build a closed curve of the given degree through ordered points.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError`] when the degree is unsupported or the points are too few.
    fn interpolate_closed(&self, points: &[Point], degree: usize) -> Result<Polyline, KernelError>;

    /// Curve length.
    fn length(&self, curve: &Polyline) -> f64;

    /// Vertex sequence of a polyline curve.
    fn polyline_points(&self, curve: &Polyline) -> Vec<Point>;
}

/// [`GeometryKernel`] for straight-segment polylines in the XY plane.
///
/// Parameters are normalized vertex indices: segment `i` of `n` spans `[i/n, (i+1)/n]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolylineKernel;

impl PolylineKernel {
    /// Point at parameter `t` of `curve`.
    fn point_at(curve: &Polyline, t: f64) -> Point {
        let points = curve.points();
        let segments = curve.segment_count();
        if segments == 0 {
            return points.first().copied().unwrap_or_else(Point::origin);
        }
        let scaled = t.clamp(0.0, 1.0) * segments as f64;
        let index = (scaled.floor() as usize).min(segments - 1);
        let local = scaled - index as f64;
        points[index] + (points[index + 1] - points[index]) * local
    }

    /// Piece of a closed curve running forward from `start` to `start + span` (cyclically).
    fn piece(curve: &Polyline, start: f64, span: f64) -> Polyline {
        let segments = curve.segment_count();
        let mut offsets: Vec<(f64, Point)> = (0..segments)
            .map(|k| {
                let param = k as f64 / segments as f64;
                ((param - start).rem_euclid(1.0), curve.points()[k])
            })
            .filter(|(offset, _)| *offset > PARAM_TOLERANCE && *offset < span - PARAM_TOLERANCE)
            .collect();
        offsets.sort_by(|a, b| a.0.total_cmp(&b.0));

        let end = (start + span).rem_euclid(1.0);
        let mut points = Vec::with_capacity(offsets.len() + 2);
        push_distinct(&mut points, Self::point_at(curve, start));
        for (_, vertex) in offsets {
            push_distinct(&mut points, vertex);
        }
        push_distinct(&mut points, Self::point_at(curve, end));
        Polyline::new(points)
    }
}

/// Append `candidate` unless it repeats the last point.
fn push_distinct(points: &mut Vec<Point>, candidate: Point) {
    if points
        .last()
        .map_or(true, |last| nalgebra::distance(last, &candidate) > POINT_TOLERANCE)
    {
        points.push(candidate);
    }
}

/// Bounded segment/segment intersections in the XY plane.
///
/// Crossing segments yield one point; collinear overlapping segments yield the
/// endpoints of the overlap.
fn segment_intersections(a0: &Point, a1: &Point, b0: &Point, b1: &Point, tolerance: f64) -> Vec<Point> {
    let da = Vector::new(a1.x - a0.x, a1.y - a0.y, 0.0);
    let db = Vector::new(b1.x - b0.x, b1.y - b0.y, 0.0);
    let cross = da.x * db.y - da.y * db.x;
    let len_a = da.norm();
    let len_b = db.norm();
    if len_a < POINT_TOLERANCE || len_b < POINT_TOLERANCE {
        return Vec::new();
    }

    if cross.abs() < PARAM_TOLERANCE * len_a * len_b {
        // Parallel: only collinear overlaps intersect.
        if point_segment_distance_2d(b0, a0, a1).min(point_segment_distance_2d(b1, a0, a1)) > tolerance
            && point_segment_distance_2d(a0, b0, b1).min(point_segment_distance_2d(a1, b0, b1))
                > tolerance
        {
            return Vec::new();
        }
        let mut hits = Vec::new();
        for (candidate, s0, s1) in [(b0, a0, a1), (b1, a0, a1), (a0, b0, b1), (a1, b0, b1)] {
            if point_segment_distance_2d(candidate, s0, s1) <= tolerance {
                hits.push(*candidate);
            }
        }
        return hits;
    }

    let dx = b0.x - a0.x;
    let dy = b0.y - a0.y;
    let t = (dx * db.y - dy * db.x) / cross;
    let u = (dx * da.y - dy * da.x) / cross;
    let slack_a = tolerance / len_a;
    let slack_b = tolerance / len_b;
    if t >= -slack_a && t <= 1.0 + slack_a && u >= -slack_b && u <= 1.0 + slack_b {
        let t = t.clamp(0.0, 1.0);
        vec![a0 + (a1 - a0) * t]
    } else {
        Vec::new()
    }
}

impl GeometryKernel for PolylineKernel {
    fn intersect(&self, a: &Polyline, b: &Polyline, tolerance: f64) -> Vec<Point> {
        let mut hits: Vec<Point> = Vec::new();
        for sa in a.points().windows(2) {
            for sb in b.points().windows(2) {
                for hit in segment_intersections(&sa[0], &sa[1], &sb[0], &sb[1], tolerance) {
                    if hits.iter().all(|known| nalgebra::distance(known, &hit) > tolerance) {
                        hits.push(hit);
                    }
                }
            }
        }
        hits
    }

    fn split(&self, curve: &Polyline, params: &[f64]) -> Vec<Polyline> {
        if curve.segment_count() == 0 {
            return Vec::new();
        }
        let mut sorted: Vec<f64> = params.iter().map(|t| t.clamp(0.0, 1.0) % 1.0).collect();
        sorted.sort_by(f64::total_cmp);
        sorted.dedup_by(|b, a| (*b - *a).abs() < PARAM_TOLERANCE);
        if sorted.len() > 1 {
            if let (Some(first), Some(last)) = (sorted.first().copied(), sorted.last().copied()) {
                if first + 1.0 - last < PARAM_TOLERANCE {
                    sorted.pop();
                }
            }
        }

        match sorted.as_slice() {
            [] => vec![curve.clone()],
            [only] => vec![Self::piece(curve, *only, 1.0)],
            _ => (0..sorted.len())
                .map(|i| {
                    let start = sorted[i];
                    let next = sorted[(i + 1) % sorted.len()];
                    Self::piece(curve, start, (next - start).rem_euclid(1.0))
                })
                .collect(),
        }
    }

    fn closest_param(&self, curve: &Polyline, target: &Point) -> f64 {
        let segments = curve.segment_count();
        if segments == 0 {
            return 0.0;
        }
        let mut best = (f64::INFINITY, 0.0);
        for (index, pair) in curve.points().windows(2).enumerate() {
            let direction = pair[1] - pair[0];
            let length_sq = direction.norm_squared();
            let t = if length_sq < 1e-20 {
                0.0
            } else {
                ((target - pair[0]).dot(&direction) / length_sq).clamp(0.0, 1.0)
            };
            let distance = nalgebra::distance(&(pair[0] + direction * t), target);
            if distance < best.0 - 1e-12 {
                best = (distance, (index as f64 + t) / segments as f64);
            }
        }
        best.1
    }

    fn interpolate_closed(&self, points: &[Point], degree: usize) -> Result<Polyline, KernelError> {
        if degree != 1 {
            return Err(KernelError::UnsupportedDegree(degree));
        }
        let mut corners: Vec<Point> = Vec::with_capacity(points.len() + 1);
        for point in points {
            push_distinct(&mut corners, *point);
        }
        while corners.len() > 1
            && corners
                .first()
                .zip(corners.last())
                .is_some_and(|(first, last)| nalgebra::distance(first, last) <= POINT_TOLERANCE)
        {
            corners.pop();
        }
        if corners.len() < 3 {
            return Err(KernelError::TooFewPoints(corners.len()));
        }
        Ok(Polyline::closed(corners))
    }

    fn length(&self, curve: &Polyline) -> f64 {
        curve.length()
    }

    fn polyline_points(&self, curve: &Polyline) -> Vec<Point> {
        curve.points().to_vec()
    }
}
