//! Per-node joint cutting.
//!
//! Beams meeting at a node are ordered by planar angle and trimmed pairwise
//! against their cyclic neighbours: the two profiles are intersected, each is
//! split between the node and the farthest intersection, and the longer piece
//! is kept. Joints whose gap between neighbours exceeds half a turn are then
//! corrected so that both beams meet along the gap's bisector.
//!
//! The engine works on a snapshot of the joint ([`JointBeam`]) and never
//! touches the truss directly; the caller writes the resulting profiles back.

use std::f64::consts::{PI, TAU};

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use tracing::{debug, warn};

use crate::beam::Beam;
use crate::config::CutConfig;
use crate::errors::{CutError, DegenerateJointError, DegenerateReason};
use crate::geometry::{line_line_intersect_2d, planar_angle, Point, Vector};
use crate::kernel::{GeometryKernel, Polyline};

/// A pair of neighbouring beams that was left untrimmed because their
/// profiles did not overlap enough.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairSkip {
    /// Node being cut.
    pub node: NodeIndex,
    /// First beam of the pair in angular order.
    pub first: EdgeIndex,
    /// Second beam of the pair.
    pub second: EdgeIndex,
    /// Number of profile intersections found (fewer than two).
    pub intersections: usize,
}

/// Outcome of cutting the beams at one node.
#[derive(Clone, Debug, PartialEq)]
pub struct JointReport {
    /// Node that was cut.
    pub node: NodeIndex,
    /// Number of beam pairs trimmed against each other.
    pub trimmed_pairs: usize,
    /// Number of beam profiles corrected at reflex gaps.
    pub reflex_fixes: usize,
    /// Pairs left untrimmed.
    pub skipped: Vec<PairSkip>,
    /// Beams whose reflex correction moved a corner farther from the node
    /// than the beam is long. The bisector heuristic is unreliable there.
    pub extended: Vec<EdgeIndex>,
    /// Failures local to a pair or a reflex correction.
    pub errors: Vec<CutError>,
}

impl JointReport {
    /// Empty report for `node`.
    #[must_use]
    pub fn new(node: NodeIndex) -> Self {
        Self {
            node,
            trimmed_pairs: 0,
            reflex_fixes: 0,
            skipped: Vec::new(),
            extended: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Whether every step at this node succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of a full recompute over every node of a truss.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CutReport {
    /// Nodes with at least two beams that were cut.
    pub nodes_processed: usize,
    /// Total beam pairs trimmed.
    pub pairs_trimmed: usize,
    /// Total reflex corrections.
    pub reflex_fixes: usize,
    /// All pairs left untrimmed.
    pub skipped: Vec<PairSkip>,
    /// Every beam flagged by a reflex correction that overshot its length.
    pub extended: Vec<EdgeIndex>,
    /// Every failure collected during the pass.
    pub errors: Vec<CutError>,
}

impl CutReport {
    /// Fold one node's report into the totals.
    pub fn absorb(&mut self, joint: JointReport) {
        self.nodes_processed += 1;
        self.pairs_trimmed += joint.trimmed_pairs;
        self.reflex_fixes += joint.reflex_fixes;
        self.skipped.extend(joint.skipped);
        self.extended.extend(joint.extended);
        self.errors.extend(joint.errors);
    }

    /// `true` when no failure was collected, so the cut profiles can be trusted.
    ///
    /// # Examples
    /// ```
    /// use trusscut::CutReport;
    ///
    /// assert!(CutReport::default().is_complete());
    /// ```
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Snapshot of one beam as seen from the node being cut.
#[derive(Clone, Debug)]
pub(crate) struct JointBeam {
    /// Beam id.
    pub(crate) id: EdgeIndex,
    /// Planar angle of the far endpoint around the node, in `[0, 2π)`.
    pub(crate) angle: f64,
    /// Horizontal unit direction from the node towards the far endpoint.
    pub(crate) direction: Vector,
    /// Copied fabrication flag.
    pub(crate) fabricated: bool,
    /// Copied new-beam flag.
    pub(crate) is_new: bool,
    /// Current width.
    pub(crate) width: f64,
    /// Width at last fabrication.
    pub(crate) reference_width: f64,
    /// Axis length.
    pub(crate) length: f64,
    /// Working copy of the cut profile.
    pub(crate) profile: Polyline,
}

/// Snapshot the beams at a node and sort them by planar angle.
///
/// The sort is stable, so beams at identical angles keep their input order.
pub(crate) fn organize<'a>(
    node: NodeIndex,
    position: &Point,
    beams: impl IntoIterator<Item = (EdgeIndex, Option<&'a Beam>)>,
    tolerance: f64,
) -> Result<Vec<JointBeam>, CutError> {
    let mut joint = Vec::new();
    for (id, beam) in beams {
        let beam = beam.ok_or(CutError::DetachedBeam { node, beam: id })?;
        let axis = beam.axis();
        let at_from = nalgebra::distance(&axis.from, position) <= tolerance;
        let at_to = nalgebra::distance(&axis.to, position) <= tolerance;
        let far = match (at_from, at_to) {
            (true, false) => axis.to,
            (false, true) => axis.from,
            (true, true) => {
                return Err(degenerate(node, id, DegenerateReason::ZeroLengthDirection).into())
            }
            (false, false) => return Err(CutError::DetachedBeam { node, beam: id }),
        };
        let direction = Vector::new(far.x - position.x, far.y - position.y, 0.0)
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| degenerate(node, id, DegenerateReason::ZeroLengthDirection))?;
        joint.push(JointBeam {
            id,
            angle: planar_angle(position, &far),
            direction,
            fabricated: beam.is_fabricated(),
            is_new: beam.is_new(),
            width: beam.width(),
            reference_width: beam.reference_width(),
            length: beam.length(),
            profile: beam.cut_polyline().clone(),
        });
    }
    joint.sort_by(|a, b| a.angle.total_cmp(&b.angle));
    Ok(joint)
}

/// Shorthand for a [`DegenerateJointError`].
fn degenerate(node: NodeIndex, beam: EdgeIndex, reason: DegenerateReason) -> DegenerateJointError {
    DegenerateJointError { node, beam, reason }
}

/// Trim partners for a joint: every consecutive pair of the angular order,
/// followed by the extra pairs that tie a new beam to a fabricated one.
///
/// When a new beam's neighbour is not fabricated, the new beam is also cut
/// against the nearest fabricated beam on that side. Extra pairs that repeat a
/// neighbour pair are dropped.
pub(crate) fn plan_pairs(beams: &[JointBeam]) -> Vec<(usize, usize)> {
    let n = beams.len();
    if n < 2 {
        return Vec::new();
    }
    let mut pairs: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
    for i in 0..n {
        let next = (i + 1) % n;
        let extra = if beams[i].is_new && !beams[next].fabricated {
            (1..n)
                .map(|step| (i + step) % n)
                .find(|&j| beams[j].fabricated)
                .map(|fabricated| (i, fabricated))
        } else if beams[next].is_new && !beams[i].fabricated {
            (1..n)
                .map(|step| (next + n - step) % n)
                .find(|&j| beams[j].fabricated)
                .map(|fabricated| (fabricated, next))
        } else {
            None
        };
        if let Some((first, second)) = extra {
            let repeated = pairs
                .iter()
                .any(|&pair| pair == (first, second) || pair == (second, first));
            if first != second && !repeated {
                pairs.push((first, second));
            }
        }
    }
    pairs
}

/// Cuts the beams meeting at one node.
pub(crate) struct JointCutter<'a, K: GeometryKernel + ?Sized> {
    /// Node being cut.
    pub(crate) node: NodeIndex,
    /// Node position.
    pub(crate) position: Point,
    /// Tolerances.
    pub(crate) config: &'a CutConfig,
    /// Curve operations.
    pub(crate) kernel: &'a K,
}

impl<K: GeometryKernel + ?Sized> JointCutter<'_, K> {
    /// Run the pairwise trim and the reflex correction over an organized joint.
    pub(crate) fn cut(&self, beams: &mut [JointBeam]) -> JointReport {
        let mut report = JointReport::new(self.node);
        for (first, second) in plan_pairs(beams) {
            match self.trim_pair(beams, first, second) {
                Ok(Some(skip)) => report.skipped.push(skip),
                Ok(None) => report.trimmed_pairs += 1,
                Err(error) => {
                    warn!(node = self.node.index(), %error, "pair trim failed");
                    report.errors.push(error);
                }
            }
        }
        self.fix_reflex_gaps(beams, &mut report);
        report
    }

    /// Trim one pair. Returns the skip record when the profiles do not overlap.
    fn trim_pair(
        &self,
        beams: &mut [JointBeam],
        first: usize,
        second: usize,
    ) -> Result<Option<PairSkip>, CutError> {
        let hits = self.kernel.intersect(
            &beams[first].profile,
            &beams[second].profile,
            self.config.intersection_tolerance,
        );
        let far = hits.iter().copied().max_by(|a, b| {
            nalgebra::distance(a, &self.position).total_cmp(&nalgebra::distance(b, &self.position))
        });
        let far = match far {
            Some(far) if hits.len() >= 2 => far,
            _ => {
                debug!(
                    node = self.node.index(),
                    first = beams[first].id.index(),
                    second = beams[second].id.index(),
                    intersections = hits.len(),
                    "profiles do not overlap; pair left untrimmed"
                );
                return Ok(Some(PairSkip {
                    node: self.node,
                    first: beams[first].id,
                    second: beams[second].id,
                    intersections: hits.len(),
                }));
            }
        };

        let first_profile = self.trimmed_profile(&beams[first], &beams[second], &far)?;
        let second_profile = self.trimmed_profile(&beams[second], &beams[first], &far)?;
        if let Some(profile) = first_profile {
            beams[first].profile = profile;
        }
        if let Some(profile) = second_profile {
            beams[second].profile = profile;
        }
        debug!(
            node = self.node.index(),
            first = beams[first].id.index(),
            second = beams[second].id.index(),
            "pair trimmed"
        );
        Ok(None)
    }

    /// New profile for `beam` trimmed between the node and `far`, or `None` for a fabricated beam.
    fn trimmed_profile(
        &self,
        beam: &JointBeam,
        partner: &JointBeam,
        far: &Point,
    ) -> Result<Option<Polyline>, CutError> {
        if beam.fabricated {
            return Ok(None);
        }
        let near_param = self.kernel.closest_param(&beam.profile, &self.position);
        let far_param = self.kernel.closest_param(&beam.profile, far);
        let pieces = self.kernel.split(&beam.profile, &[near_param, far_param]);
        if pieces.len() < 2 {
            return Err(degenerate(self.node, beam.id, DegenerateReason::SplitFailed).into());
        }
        let kept = pieces
            .iter()
            .max_by(|a, b| self.kernel.length(a).total_cmp(&self.kernel.length(b)))
            .ok_or_else(|| degenerate(self.node, beam.id, DegenerateReason::SplitFailed))?;
        let mut points = self.kernel.polyline_points(kept);

        if partner.fabricated && beam.width > beam.reference_width + self.config.width_growth_tolerance {
            let inserted = accommodate_corners(&mut points, partner.profile.corners(), self.config.node_tolerance);
            if inserted > 0 {
                debug!(beam = beam.id.index(), inserted, "kept fabricated corners in grown profile");
            }
        }

        self.kernel
            .interpolate_closed(&points, self.config.interpolation_degree)
            .map(Some)
            .map_err(|source| CutError::Kernel { beam: beam.id, source })
    }

    /// Correct every consecutive pair whose angular gap exceeds half a turn.
    fn fix_reflex_gaps(&self, beams: &mut [JointBeam], report: &mut JointReport) {
        let n = beams.len();
        if n < 2 {
            return;
        }
        for i in 0..n {
            let j = (i + 1) % n;
            let gap = (beams[j].angle - beams[i].angle).rem_euclid(TAU);
            if gap <= PI + self.config.reflex_angle_tolerance {
                continue;
            }
            let bisector_angle = beams[i].angle + gap / 2.0;
            let bisector = Vector::new(bisector_angle.cos(), bisector_angle.sin(), 0.0);
            debug!(
                node = self.node.index(),
                gap_degrees = gap.to_degrees(),
                "reflex gap between neighbours"
            );
            for index in [i, j] {
                if beams[index].fabricated {
                    continue;
                }
                match self.project_onto_bisector(&beams[index], &bisector) {
                    Ok((profile, reach)) => {
                        if reach > beams[index].length {
                            warn!(
                                node = self.node.index(),
                                beam = beams[index].id.index(),
                                reach,
                                length = beams[index].length,
                                "reflex correction reaches past the beam's length"
                            );
                            report.extended.push(beams[index].id);
                        }
                        beams[index].profile = profile;
                        report.reflex_fixes += 1;
                    }
                    Err(error) => {
                        warn!(node = self.node.index(), %error, "reflex correction failed");
                        report.errors.push(error);
                    }
                }
            }
        }
    }

    /// Move the second-closest corner of `beam` along the beam direction onto the bisector.
    ///
    /// Returns the new profile and the plan distance from the node to the moved corner.
    fn project_onto_bisector(
        &self,
        beam: &JointBeam,
        bisector: &Vector,
    ) -> Result<(Polyline, f64), CutError> {
        let mut corners = beam.profile.corners().to_vec();
        let too_few = || degenerate(self.node, beam.id, DegenerateReason::TooFewCorners(corners.len()));
        let mut ranked: Vec<(usize, f64)> = corners
            .iter()
            .enumerate()
            .map(|(index, corner)| (index, nalgebra::distance(corner, &self.position)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (closest, _) = *ranked.first().ok_or_else(too_few)?;
        let (second, _) = *ranked
            .iter()
            .skip(1)
            .find(|(index, _)| {
                nalgebra::distance(&corners[*index], &corners[closest]) > self.config.node_tolerance
            })
            .ok_or_else(too_few)?;

        let projected = line_line_intersect_2d(&corners[second], &beam.direction, &self.position, bisector)
            .ok_or_else(|| degenerate(self.node, beam.id, DegenerateReason::ParallelBisector))?;
        let reach = (projected.x - self.position.x).hypot(projected.y - self.position.y);
        corners[second] = projected;
        self.kernel
            .interpolate_closed(&corners, self.config.interpolation_degree)
            .map(|profile| (profile, reach))
            .map_err(|source| CutError::Kernel { beam: beam.id, source })
    }
}

/// Insert every corner of a fabricated neighbour that lies strictly inside the
/// trimmed outline `points`, each where it lengthens the outline least.
///
/// Returns how many corners were inserted.
fn accommodate_corners(points: &mut Vec<Point>, neighbour: &[Point], tolerance: f64) -> usize {
    let mut inserted = 0;
    for corner in neighbour {
        if points.len() < 3 {
            break;
        }
        let outline = Polyline::closed(points.clone());
        if !outline.strictly_contains(corner, tolerance) {
            continue;
        }
        let n = points.len();
        let best = (0..n).min_by(|&a, &b| {
            insertion_cost(points, a, corner).total_cmp(&insertion_cost(points, b, corner))
        });
        if let Some(after) = best {
            points.insert(after + 1, *corner);
            inserted += 1;
        }
    }
    inserted
}

/// Perimeter increase from inserting `corner` between `points[index]` and its successor.
fn insertion_cost(points: &[Point], index: usize, corner: &Point) -> f64 {
    let a = &points[index];
    let b = &points[(index + 1) % points.len()];
    nalgebra::distance(a, corner) + nalgebra::distance(corner, b) - nalgebra::distance(a, b)
}
