//! Saw planes and label placements derived from a beam's final cut profile.

use std::f64::consts::{FRAC_PI_2, TAU};

use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use crate::beam::Beam;
use crate::errors::{CutError, DegenerateJointError, DegenerateReason};
use crate::geometry::{vertical, Plane, Point};

/// Blade planes supplied by the saw setup, one per beam end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladeReference {
    /// Blade plane for the start end of the beam (negative local x).
    pub side_a: Plane,
    /// Blade plane for the end of the beam (positive local x).
    pub side_b: Plane,
}

impl Default for BladeReference {
    fn default() -> Self {
        let world = Plane::world_xy(Point::origin());
        Self {
            side_a: world,
            side_b: world,
        }
    }
}

/// Planes a saw aligns to when cutting one beam, plus where to put its labels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutPlanes {
    /// Two cut planes at the start end.
    pub side_a: [Plane; 2],
    /// Two cut planes at the far end.
    pub side_b: [Plane; 2],
    /// Label placements on the top face, start half then end half.
    pub labels: [Plane; 2],
}

/// Local profile corner, `(x, y)` in the beam frame.
type Corner = (f64, f64);

/// Derive cut planes from `beam`'s cut profile.
///
/// `ends` are the beam's start and end nodes, used to attribute a degenerate side.
pub(crate) fn cut_planes(
    beam: &Beam,
    id: EdgeIndex,
    ends: (NodeIndex, NodeIndex),
    blade: &BladeReference,
) -> Result<CutPlanes, CutError> {
    let frame = beam.frame();
    let (mut start_side, mut end_side): (Vec<Corner>, Vec<Corner>) = beam
        .cut_polyline()
        .corners()
        .iter()
        .map(|corner| frame.to_local(corner))
        .partition(|(x, _)| *x < 0.0);

    // Both sides start at the local -y axis: the end side runs counter-clockwise,
    // the start side clockwise.
    end_side.sort_by(|a, b| ccw_key(a).total_cmp(&ccw_key(b)));
    start_side.sort_by(|a, b| cw_key(a).total_cmp(&cw_key(b)));

    let side_a = side_planes(&start_side, &blade.side_a, id, ends.0)?;
    let side_b = side_planes(&end_side, &blade.side_b, id, ends.1)?;

    let quarter = beam.length() / 4.0;
    let lift = vertical() * (beam.height() / 2.0);
    let label = |offset: f64| Plane::new(frame.to_world(offset, 0.0) + lift, frame.xaxis, frame.yaxis);

    Ok(CutPlanes {
        side_a,
        side_b,
        labels: [label(-quarter), label(quarter)],
    })
}

/// Counter-clockwise angle from the local -y axis.
fn ccw_key((x, y): &Corner) -> f64 {
    (y.atan2(*x) + FRAC_PI_2).rem_euclid(TAU)
}

/// Clockwise angle from the local -y axis.
fn cw_key((x, y): &Corner) -> f64 {
    (-FRAC_PI_2 - y.atan2(*x)).rem_euclid(TAU)
}

/// First and last consecutive corner pairs of one side, mapped into the blade plane.
fn side_planes(
    corners: &[Corner],
    blade: &Plane,
    beam: EdgeIndex,
    node: NodeIndex,
) -> Result<[Plane; 2], CutError> {
    let degenerate = || DegenerateJointError {
        node,
        beam,
        reason: DegenerateReason::UnbalancedSides(corners.len()),
    };
    let n = corners.len();
    if n < 2 {
        return Err(degenerate().into());
    }
    let first = segment_plane(&corners[0], &corners[1], blade).ok_or_else(degenerate)?;
    let last = segment_plane(&corners[n - 2], &corners[n - 1], blade).ok_or_else(degenerate)?;
    Ok([first, last])
}

/// Cut plane through one corner pair, or `None` when the corners coincide.
fn segment_plane(start: &Corner, end: &Corner, blade: &Plane) -> Option<Plane> {
    let from = blade.to_world(start.0, start.1);
    let to = blade.to_world(end.0, end.1);
    let xaxis = (to - from).try_normalize(f64::EPSILON)?;
    Some(Plane::new(nalgebra::center(&from, &to), xaxis, blade.normal()))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::{point, Line, Vector};
    use crate::kernel::Polyline;

    fn ends() -> (NodeIndex, NodeIndex) {
        (NodeIndex::new(0), NodeIndex::new(1))
    }

    #[test]
    fn square_ends_give_square_cuts() {
        let beam = Beam::new(Line::new(point(0.0, 0.0, 0.0), point(10.0, 0.0, 0.0)), 2.0, 1.0)
            .expect("valid beam");
        let planes = cut_planes(&beam, EdgeIndex::new(0), ends(), &BladeReference::default())
            .expect("rectangle has two corners per side");

        for plane in planes.side_b {
            assert_relative_eq!(plane.origin, point(5.0, 0.0, 0.0), epsilon = 1e-12);
            assert_relative_eq!(plane.xaxis, Vector::y(), epsilon = 1e-12);
            assert_relative_eq!(plane.yaxis, vertical(), epsilon = 1e-12);
        }
        for plane in planes.side_a {
            assert_relative_eq!(plane.origin, point(-5.0, 0.0, 0.0), epsilon = 1e-12);
            assert_relative_eq!(plane.xaxis, Vector::y(), epsilon = 1e-12);
        }
        assert_relative_eq!(planes.labels[0].origin, point(2.5, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(planes.labels[1].origin, point(7.5, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(planes.labels[1].xaxis, Vector::x(), epsilon = 1e-12);
    }

    #[test]
    fn blade_plane_positions_the_cut() {
        let beam = Beam::new(Line::new(point(0.0, 0.0, 0.0), point(0.0, 4.0, 0.0)), 1.0, 1.0)
            .expect("valid beam");
        let blade = BladeReference {
            side_a: Plane::world_xy(point(0.0, 0.0, 0.0)),
            side_b: Plane::new(point(100.0, 0.0, 0.0), Vector::x(), Vector::z()),
        };
        let planes = cut_planes(&beam, EdgeIndex::new(0), ends(), &blade).expect("planes");
        assert_relative_eq!(planes.side_b[0].origin, point(102.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(planes.side_b[0].xaxis, Vector::z(), epsilon = 1e-12);
        assert_relative_eq!(planes.side_b[0].yaxis, -Vector::y(), epsilon = 1e-12);
    }

    #[test]
    fn one_sided_profile_is_rejected() {
        let mut beam = Beam::new(Line::new(point(0.0, 0.0, 0.0), point(10.0, 0.0, 0.0)), 1.0, 1.0)
            .expect("valid beam");
        let id = EdgeIndex::new(4);
        beam.replace_cut(
            id,
            Polyline::closed(vec![
                point(6.0, -0.5, 0.0),
                point(10.0, -0.5, 0.0),
                point(10.0, 0.5, 0.0),
            ]),
        )
        .expect("unfabricated beam accepts a new cut");
        let error = cut_planes(&beam, id, ends(), &BladeReference::default())
            .expect_err("no corners on the start side");
        assert_eq!(
            error,
            CutError::DegenerateJoint(DegenerateJointError {
                node: NodeIndex::new(0),
                beam: id,
                reason: DegenerateReason::UnbalancedSides(0),
            })
        );
    }
}
