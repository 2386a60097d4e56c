//! Fundamental geometric types for truss modelling.

use std::f64::consts::TAU;

use nalgebra::{Point3, Vector3};

/// Position in three dimensional space.
pub type Point = Point3<f64>;

/// Direction or displacement in three dimensional space.
pub type Vector = Vector3<f64>;

/// Fixed vertical reference used to build horizontal perpendiculars and beam frames.
#[must_use]
pub fn vertical() -> Vector {
    Vector::new(0.0, 0.0, 1.0)
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use trusscut::point;
///
/// let origin = point(0.0, 0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub fn point(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

/// A directed straight segment, used as the centreline of a beam.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    /// Start of the segment.
    pub from: Point,
    /// End of the segment.
    pub to: Point,
}

impl Line {
    /// Create a [`Line`] between two points.
    #[must_use]
    pub const fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    /// Vector from `from` to `to`.
    #[must_use]
    pub fn direction(&self) -> Vector {
        self.to - self.from
    }

    /// Length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Unit direction, or `None` when the segment is shorter than `tolerance`.
    #[must_use]
    pub fn unit_direction(&self, tolerance: f64) -> Option<Vector> {
        let direction = self.direction();
        let length = direction.norm();
        (length >= tolerance).then(|| direction / length)
    }

    /// Midpoint of the segment.
    #[must_use]
    pub fn midpoint(&self) -> Point {
        nalgebra::center(&self.from, &self.to)
    }

    /// Parameter in `[0, 1]` of the point on the segment closest to `target`.
    #[must_use]
    pub fn closest_parameter(&self, target: &Point) -> f64 {
        let direction = self.direction();
        let length_sq = direction.norm_squared();
        if length_sq < f64::EPSILON {
            return 0.0;
        }
        ((target - self.from).dot(&direction) / length_sq).clamp(0.0, 1.0)
    }

    /// Point on the segment at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point {
        self.from + self.direction() * t
    }
}

/// An oriented plane described by an origin and two in-plane axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Origin of the plane.
    pub origin: Point,
    /// First in-plane axis (unit length).
    pub xaxis: Vector,
    /// Second in-plane axis (unit length, perpendicular to `xaxis`).
    pub yaxis: Vector,
}

impl Plane {
    /// Create a [`Plane`] from an origin and two axes.
    #[must_use]
    pub const fn new(origin: Point, xaxis: Vector, yaxis: Vector) -> Self {
        Self {
            origin,
            xaxis,
            yaxis,
        }
    }

    /// The world XY plane at `origin`.
    #[must_use]
    pub fn world_xy(origin: Point) -> Self {
        Self::new(origin, Vector::x(), Vector::y())
    }

    /// Plane normal, `xaxis × yaxis`.
    #[must_use]
    pub fn normal(&self) -> Vector {
        self.xaxis.cross(&self.yaxis)
    }

    /// Coordinates of `target` in this plane's (x, y) system.
    #[must_use]
    pub fn to_local(&self, target: &Point) -> (f64, f64) {
        let offset = target - self.origin;
        (offset.dot(&self.xaxis), offset.dot(&self.yaxis))
    }

    /// World position of the local coordinates `(u, v)`.
    #[must_use]
    pub fn to_world(&self, u: f64, v: f64) -> Point {
        self.origin + self.xaxis * u + self.yaxis * v
    }
}

/// Horizontal vector perpendicular to `direction`, pointing to its right (`direction × Z`).
///
/// Returns `None` for vertical or zero directions.
#[must_use]
pub fn horizontal_perpendicular(direction: &Vector) -> Option<Vector> {
    direction.cross(&vertical()).try_normalize(f64::EPSILON)
}

/// Planar angle of `target` seen from `origin`, normalized to `[0, 2π)`.
#[must_use]
pub fn planar_angle(origin: &Point, target: &Point) -> f64 {
    (target.y - origin.y).atan2(target.x - origin.x).rem_euclid(TAU)
}

/// Intersection in the XY plane of the lines `p1 + t * d1` and `p2 + u * d2`.
///
/// The returned point keeps the `z` of `p1`. Returns `None` for parallel lines.
#[must_use]
pub fn line_line_intersect_2d(p1: &Point, d1: &Vector, p2: &Point, d2: &Vector) -> Option<Point> {
    let cross = d1.x * d2.y - d1.y * d2.x;
    if cross.abs() < f64::EPSILON {
        return None;
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let t = (dx * d2.y - dy * d2.x) / cross;
    Some(Point::new(p1.x + d1.x * t, p1.y + d1.y * t, p1.z))
}
