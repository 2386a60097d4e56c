//! Truss topology and the operations that edit and cut it.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use tracing::{debug, info, warn};

use crate::beam::Beam;
use crate::config::CutConfig;
use crate::cutting::{self, CutReport, JointBeam, JointCutter, JointReport};
use crate::errors::{BeamDimensionError, CutError, TrussEditError};
use crate::fabrication::{self, BladeReference, CutPlanes};
use crate::geometry::{Line, Point};
use crate::kernel::{GeometryKernel, PolylineKernel};
use crate::node::Node;
use crate::shapes::{self, ClosedShape};

/// A timber truss: nodes joined by straight beams.
///
/// Nodes and beams are identified by their graph indices, which stay valid
/// when other beams are removed.
#[derive(Debug, Default)]
pub struct Truss {
    /// Nodes and beams; each edge runs from a beam's start node to its end node.
    graph: StableDiGraph<Node, Beam>,
    /// Tolerances for matching and cutting.
    config: CutConfig,
}

impl Truss {
    /// Create an empty truss with default tolerances.
    ///
    /// # Examples
    /// ```
    /// use trusscut::Truss;
    ///
    /// let truss = Truss::new();
    /// assert_eq!(truss.node_count(), 0);
    /// assert_eq!(truss.beam_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CutConfig::default())
    }

    /// Create an empty truss with the given tolerances.
    #[must_use]
    pub fn with_config(config: CutConfig) -> Self {
        Self {
            graph: StableDiGraph::default(),
            config,
        }
    }

    /// Tolerances in use.
    #[must_use]
    pub fn config(&self) -> &CutConfig {
        &self.config
    }

    /// Return the number of nodes in the truss.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of beams in the truss.
    #[must_use]
    pub fn beam_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, node: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(node)
    }

    /// Look up a beam.
    #[must_use]
    pub fn beam(&self, beam: EdgeIndex) -> Option<&Beam> {
        self.graph.edge_weight(beam)
    }

    /// Start and end node of a beam.
    #[must_use]
    pub fn beam_endpoints(&self, beam: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(beam)
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.graph
            .node_indices()
            .filter_map(move |index| self.graph.node_weight(index).map(|node| (index, node)))
    }

    /// All beams in index order.
    pub fn beams(&self) -> impl Iterator<Item = (EdgeIndex, &Beam)> + '_ {
        self.graph
            .edge_indices()
            .filter_map(move |index| self.graph.edge_weight(index).map(|beam| (index, beam)))
    }

    /// Node within tolerance of `position`, if any.
    #[must_use]
    pub fn find_node(&self, position: &Point) -> Option<NodeIndex> {
        self.nodes()
            .find(|(_, node)| nalgebra::distance(node.position(), position) <= self.config.node_tolerance)
            .map(|(index, _)| index)
    }

    /// Beam joining `a` and `b` in either direction, if any.
    #[must_use]
    pub fn find_beam(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b).or_else(|| self.graph.find_edge(b, a))
    }

    /// Add a node, or return the existing node within tolerance of `position`.
    ///
    /// # Examples
    /// ```
    /// use trusscut::{point, Truss};
    ///
    /// let mut truss = Truss::new();
    /// let a = truss.add_node(point(0.0, 0.0, 0.0));
    /// let b = truss.add_node(point(0.0, 0.0, 5.0e-7));
    /// assert_eq!(a, b);
    /// assert_eq!(truss.node_count(), 1);
    /// ```
    pub fn add_node(&mut self, position: Point) -> NodeIndex {
        if let Some(existing) = self.find_node(&position) {
            return existing;
        }
        self.graph.add_node(Node::new(position))
    }

    /// Connect two nodes with a beam, or return the beam already joining them.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownNode`] when either node is missing,
    /// [`TrussEditError::ZeroLengthAxis`] when the nodes coincide in plan and
    /// [`TrussEditError::InvalidBeamDimensions`] for non-positive dimensions.
    ///
    /// # Examples
    /// ```
    /// use trusscut::{point, Truss};
    ///
    /// let mut truss = Truss::new();
    /// let a = truss.add_node(point(0.0, 0.0, 0.0));
    /// let b = truss.add_node(point(3.0, 0.0, 0.0));
    /// let beam = truss.add_beam(a, b, 0.2, 0.1).expect("valid beam");
    /// assert_eq!(truss.add_beam(b, a, 0.2, 0.1), Ok(beam));
    /// assert_eq!(truss.beam_count(), 1);
    /// ```
    pub fn add_beam(
        &mut self,
        start: NodeIndex,
        end: NodeIndex,
        height: f64,
        width: f64,
    ) -> Result<EdgeIndex, TrussEditError> {
        let from = *self.position_of(start)?;
        let to = *self.position_of(end)?;
        if let Some(existing) = self.find_beam(start, end) {
            return Ok(existing);
        }
        let beam = Beam::new(Line::new(from, to), height, width)?;
        Ok(self.insert_beam(start, end, beam))
    }

    /// Add a beam whose axis endpoints must both coincide with existing nodes.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::NoNodeAtEndpoint`] when an axis endpoint has
    /// no node within tolerance, plus the errors of [`Truss::add_beam`].
    pub fn add_beam_on_axis(
        &mut self,
        axis: Line,
        height: f64,
        width: f64,
    ) -> Result<EdgeIndex, TrussEditError> {
        let start = self
            .find_node(&axis.from)
            .ok_or(TrussEditError::NoNodeAtEndpoint(axis.from))?;
        let end = self
            .find_node(&axis.to)
            .ok_or(TrussEditError::NoNodeAtEndpoint(axis.to))?;
        self.add_beam(start, end, height, width)
    }

    /// Remove a beam and detach it from both of its nodes.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownBeam`] when `beam` is not part of this truss.
    pub fn remove_beam(&mut self, beam: EdgeIndex) -> Result<Beam, TrussEditError> {
        let (start, end) = self
            .graph
            .edge_endpoints(beam)
            .ok_or(TrussEditError::UnknownBeam(beam))?;
        let removed = self
            .graph
            .remove_edge(beam)
            .ok_or(TrussEditError::UnknownBeam(beam))?;
        for node in [start, end] {
            if let Some(node) = self.graph.node_weight_mut(node) {
                node.detach(beam);
            }
        }
        debug!(beam = beam.index(), "beam removed");
        Ok(removed)
    }

    /// Relocate a node and rebuild the geometry of every beam attached to it.
    ///
    /// Attached beams are flagged new; their unfabricated cut profiles are reset.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownNode`] for a missing node,
    /// [`TrussEditError::NodeCollision`] when another node already sits at
    /// `position`, [`TrussEditError::FabricatedBeam`] when an attached beam is
    /// already cut and [`TrussEditError::ZeroLengthAxis`] when an attached beam
    /// would collapse. The truss is unchanged on error.
    pub fn move_node(&mut self, node: NodeIndex, position: Point) -> Result<(), TrussEditError> {
        let connected = self
            .graph
            .node_weight(node)
            .ok_or(TrussEditError::UnknownNode(node))?
            .connected_beams()
            .to_vec();
        if let Some(other) = self.find_node(&position).filter(|other| *other != node) {
            return Err(TrussEditError::NodeCollision(other));
        }

        let mut moved = Vec::with_capacity(connected.len());
        for beam in connected {
            let weight = self.graph.edge_weight(beam).ok_or(TrussEditError::UnknownBeam(beam))?;
            if weight.is_fabricated() {
                return Err(TrussEditError::FabricatedBeam(beam));
            }
            let mut updated = weight.clone();
            let (start, end) = self
                .graph
                .edge_endpoints(beam)
                .ok_or(TrussEditError::UnknownBeam(beam))?;
            let from = if start == node { position } else { *self.position_of(start)? };
            let to = if end == node { position } else { *self.position_of(end)? };
            updated.set_axis(Line::new(from, to))?;
            updated.set_new(true);
            moved.push((beam, updated));
        }

        if let Some(weight) = self.graph.node_weight_mut(node) {
            weight.relocate(position);
        }
        for (beam, updated) in moved {
            if let Some(weight) = self.graph.edge_weight_mut(beam) {
                *weight = updated;
            }
        }
        debug!(node = node.index(), "node moved");
        Ok(())
    }

    /// Split a beam in two at the point of its axis closest to `position`.
    ///
    /// Returns the new node and the two new beams, both flagged new.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownBeam`] for a missing beam,
    /// [`TrussEditError::FabricatedBeam`] for a fabricated one and
    /// [`TrussEditError::SplitAtEndpoint`] when the snapped point is an axis endpoint.
    pub fn split_beam(
        &mut self,
        beam: EdgeIndex,
        position: Point,
    ) -> Result<(NodeIndex, [EdgeIndex; 2]), TrussEditError> {
        let original = self.graph.edge_weight(beam).ok_or(TrussEditError::UnknownBeam(beam))?;
        if original.is_fabricated() {
            return Err(TrussEditError::FabricatedBeam(beam));
        }
        let (start, end) = self
            .graph
            .edge_endpoints(beam)
            .ok_or(TrussEditError::UnknownBeam(beam))?;
        let axis = *original.axis();
        let snapped = axis.point_at(axis.closest_parameter(&position));
        let tolerance = self.config.node_tolerance;
        if nalgebra::distance(&snapped, &axis.from) <= tolerance
            || nalgebra::distance(&snapped, &axis.to) <= tolerance
        {
            return Err(TrussEditError::SplitAtEndpoint(beam));
        }
        if let Some(other) = self.find_node(&snapped) {
            return Err(TrussEditError::NodeCollision(other));
        }

        let (height, width) = (original.height(), original.width());
        let mut first = Beam::new(Line::new(axis.from, snapped), height, width)?;
        let mut second = Beam::new(Line::new(snapped, axis.to), height, width)?;
        first.set_new(true);
        second.set_new(true);

        self.remove_beam(beam)?;
        let middle = self.graph.add_node(Node::new(snapped));
        let halves = [
            self.insert_beam(start, middle, first),
            self.insert_beam(middle, end, second),
        ];
        debug!(beam = beam.index(), node = middle.index(), "beam split");
        Ok((middle, halves))
    }

    /// Minimal closed shapes formed by the beams, viewed from above.
    ///
    /// # Examples
    /// ```
    /// use trusscut::{point, Truss};
    ///
    /// let mut truss = Truss::new();
    /// let a = truss.add_node(point(0.0, 0.0, 0.0));
    /// let b = truss.add_node(point(4.0, 0.0, 0.0));
    /// let c = truss.add_node(point(0.0, 3.0, 0.0));
    /// for (start, end) in [(a, b), (b, c), (c, a)] {
    ///     truss.add_beam(start, end, 0.2, 0.1).expect("valid beam");
    /// }
    /// let shapes = truss.closed_shapes();
    /// assert_eq!(shapes.len(), 1);
    /// assert_eq!(shapes[0].nodes.len(), 3);
    /// ```
    #[must_use]
    pub fn closed_shapes(&self) -> Vec<ClosedShape> {
        shapes::closed_shapes(self)
    }

    /// Add a node inside a closed shape and connect it to every node of that shape.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::NoEnclosingShape`] when no closed shape
    /// contains `position`, [`TrussEditError::NodeCollision`] when a node
    /// already sits there and [`TrussEditError::InvalidBeamDimensions`] for
    /// non-positive dimensions.
    pub fn insert_node_in_shape(
        &mut self,
        position: Point,
        height: f64,
        width: f64,
    ) -> Result<(NodeIndex, Vec<EdgeIndex>), TrussEditError> {
        BeamDimensionError::check(height, width)?;
        if let Some(other) = self.find_node(&position) {
            return Err(TrussEditError::NodeCollision(other));
        }
        let shape = self
            .closed_shapes()
            .into_iter()
            .find(|shape| shape.outline.strictly_contains(&position, self.config.node_tolerance))
            .ok_or(TrussEditError::NoEnclosingShape(position))?;

        let mut spokes = Vec::with_capacity(shape.nodes.len());
        for corner in &shape.nodes {
            let mut beam = Beam::new(Line::new(position, *self.position_of(*corner)?), height, width)?;
            beam.set_new(true);
            spokes.push((*corner, beam));
        }
        let centre = self.graph.add_node(Node::new(position));
        let beams = spokes
            .into_iter()
            .map(|(corner, beam)| self.insert_beam(centre, corner, beam))
            .collect();
        debug!(node = centre.index(), "node inserted in closed shape");
        Ok((centre, beams))
    }

    /// Record that a beam has been physically cut with its current profile.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownBeam`] when `beam` is not part of this truss.
    pub fn mark_fabricated(&mut self, beam: EdgeIndex) -> Result<(), TrussEditError> {
        self.graph
            .edge_weight_mut(beam)
            .ok_or(TrussEditError::UnknownBeam(beam))?
            .mark_fabricated();
        Ok(())
    }

    /// Change the width of an unfabricated beam. The reference width is kept.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownBeam`], [`TrussEditError::FabricatedBeam`]
    /// or [`TrussEditError::InvalidBeamDimensions`].
    pub fn set_beam_width(&mut self, beam: EdgeIndex, width: f64) -> Result<(), TrussEditError> {
        self.graph
            .edge_weight_mut(beam)
            .ok_or(TrussEditError::UnknownBeam(beam))?
            .set_width(beam, width)
    }

    /// Mark every beam fabricated and clear the moved flag of every node.
    pub fn finish_fabrication_round(&mut self) {
        let beams: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for beam in beams {
            if let Some(weight) = self.graph.edge_weight_mut(beam) {
                weight.mark_fabricated();
            }
        }
        let nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        for node in nodes {
            if let Some(weight) = self.graph.node_weight_mut(node) {
                weight.set_moved(false);
            }
        }
        info!(beams = self.beam_count(), "fabrication round finished");
    }

    /// Sort the beams at a node by the planar angle of their far endpoints.
    ///
    /// The order is stored on the node and returned.
    ///
    /// # Errors
    ///
    /// Returns [`CutError::UnknownNode`] for a missing node and
    /// [`CutError::DetachedBeam`] when a listed beam does not end at the node.
    pub fn organize_beams(&mut self, node: NodeIndex) -> Result<Vec<EdgeIndex>, CutError> {
        let (_, joint) = self.snapshot(node)?;
        Ok(joint.iter().map(|beam| beam.id).collect())
    }

    /// Cut the beams meeting at `node` with the built-in polyline kernel.
    ///
    /// # Errors
    ///
    /// See [`Truss::cut_beams_with`].
    pub fn cut_beams(&mut self, node: NodeIndex) -> Result<JointReport, CutError> {
        self.cut_beams_with(node, &PolylineKernel)
    }

    /// Cut the beams meeting at `node`.
    ///
    /// Failures of individual pairs are collected in the report; only
    /// node-level problems are returned as errors.
    ///
    /// # Errors
    ///
    /// Returns [`CutError::UnknownNode`] for a missing node and
    /// [`CutError::DetachedBeam`] or [`CutError::DegenerateJoint`] when the
    /// beams at the node cannot be ordered.
    pub fn cut_beams_with<K: GeometryKernel + ?Sized>(
        &mut self,
        node: NodeIndex,
        kernel: &K,
    ) -> Result<JointReport, CutError> {
        let (position, mut joint) = self.snapshot(node)?;
        if joint.len() < 2 {
            return Ok(JointReport::new(node));
        }
        let cutter = JointCutter {
            node,
            position,
            config: &self.config,
            kernel,
        };
        let mut report = cutter.cut(&mut joint);
        for beam in joint.into_iter().filter(|beam| !beam.fabricated) {
            if let Some(weight) = self.graph.edge_weight_mut(beam.id) {
                if let Err(error) = weight.replace_cut(beam.id, beam.profile) {
                    report.errors.push(error);
                }
            }
        }
        Ok(report)
    }

    /// Recompute every cut with the built-in polyline kernel.
    ///
    /// # Examples
    /// ```
    /// use trusscut::{point, Truss};
    ///
    /// let mut truss = Truss::new();
    /// let joint = truss.add_node(point(0.0, 0.0, 0.0));
    /// let east = truss.add_node(point(10.0, 0.0, 0.0));
    /// let north = truss.add_node(point(0.0, 10.0, 0.0));
    /// truss.add_beam(joint, east, 1.0, 1.0).expect("valid beam");
    /// truss.add_beam(joint, north, 1.0, 1.0).expect("valid beam");
    ///
    /// let report = truss.cut_all_beams();
    /// assert!(report.is_complete());
    /// assert_eq!(report.nodes_processed, 1);
    /// ```
    pub fn cut_all_beams(&mut self) -> CutReport {
        self.cut_all_beams_with(&PolylineKernel)
    }

    /// Reset every unfabricated cut to its uncut profile, then cut every node in index order.
    ///
    /// A node that fails is recorded in the report and the pass continues.
    pub fn cut_all_beams_with<K: GeometryKernel + ?Sized>(&mut self, kernel: &K) -> CutReport {
        let beams: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for beam in beams {
            if let Some(weight) = self.graph.edge_weight_mut(beam) {
                weight.reset_cut();
            }
        }

        let mut report = CutReport::default();
        let nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        for node in nodes {
            let attached = self
                .graph
                .node_weight(node)
                .map_or(0, |weight| weight.connected_beams().len());
            if attached < 2 {
                continue;
            }
            match self.cut_beams_with(node, kernel) {
                Ok(joint) => report.absorb(joint),
                Err(error) => {
                    warn!(node = node.index(), %error, "node could not be cut");
                    report.errors.push(error);
                }
            }
        }
        info!(
            nodes = report.nodes_processed,
            pairs = report.pairs_trimmed,
            reflex = report.reflex_fixes,
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "cut pass finished"
        );
        report
    }

    /// Saw planes and label placements for a beam's current cut profile.
    ///
    /// # Errors
    ///
    /// Returns [`CutError::UnknownBeam`] for a missing beam and
    /// [`CutError::DegenerateJoint`] when one end of the profile has fewer
    /// than two corners.
    pub fn cut_planes(&self, beam: EdgeIndex, blade: &BladeReference) -> Result<CutPlanes, CutError> {
        let weight = self.graph.edge_weight(beam).ok_or(CutError::UnknownBeam(beam))?;
        let ends = self
            .graph
            .edge_endpoints(beam)
            .ok_or(CutError::UnknownBeam(beam))?;
        fabrication::cut_planes(weight, beam, ends, blade)
    }

    /// Add a restored node without deduplication.
    pub(crate) fn restore_node(&mut self, position: Point, has_moved: bool) -> NodeIndex {
        let mut node = Node::new(position);
        node.set_moved(has_moved);
        self.graph.add_node(node)
    }

    /// Add a beam edge and attach it to both nodes.
    pub(crate) fn insert_beam(&mut self, start: NodeIndex, end: NodeIndex, beam: Beam) -> EdgeIndex {
        let index = self.graph.add_edge(start, end, beam);
        for node in [start, end] {
            if let Some(weight) = self.graph.node_weight_mut(node) {
                weight.attach(index);
            }
        }
        debug!(beam = index.index(), start = start.index(), end = end.index(), "beam added");
        index
    }

    /// Position of a node or an edit error.
    fn position_of(&self, node: NodeIndex) -> Result<&Point, TrussEditError> {
        self.graph
            .node_weight(node)
            .map(Node::position)
            .ok_or(TrussEditError::UnknownNode(node))
    }

    /// Organize the beams at a node and store the order on it.
    fn snapshot(&mut self, node: NodeIndex) -> Result<(Point, Vec<JointBeam>), CutError> {
        let weight = self.graph.node_weight(node).ok_or(CutError::UnknownNode(node))?;
        let position = *weight.position();
        let joint = cutting::organize(
            node,
            &position,
            weight
                .connected_beams()
                .iter()
                .map(|beam| (*beam, self.graph.edge_weight(*beam))),
            self.config.node_tolerance,
        )?;
        if let Some(weight) = self.graph.node_weight_mut(node) {
            weight.set_order(joint.iter().map(|beam| beam.id).collect());
        }
        Ok((position, joint))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;

    fn square_with_diagonal() -> (Truss, [NodeIndex; 4]) {
        let mut truss = Truss::new();
        let a = truss.add_node(point(0.0, 0.0, 0.0));
        let b = truss.add_node(point(4.0, 0.0, 0.0));
        let c = truss.add_node(point(4.0, 4.0, 0.0));
        let d = truss.add_node(point(0.0, 4.0, 0.0));
        for (start, end) in [(a, b), (b, c), (c, d), (d, a), (a, c)] {
            truss.add_beam(start, end, 0.2, 0.1).expect("valid beam");
        }
        (truss, [a, b, c, d])
    }

    #[test]
    fn mutators_return_error_for_unknown_indices() {
        let mut truss = Truss::new();
        let a = truss.add_node(point(0.0, 0.0, 0.0));
        let b = truss.add_node(point(1.0, 0.0, 0.0));
        let stale = truss.add_beam(a, b, 0.2, 0.1).expect("valid beam");
        truss.remove_beam(stale).expect("initial removal succeeds");

        assert_eq!(truss.remove_beam(stale), Err(TrussEditError::UnknownBeam(stale)));
        assert_eq!(truss.mark_fabricated(stale), Err(TrussEditError::UnknownBeam(stale)));
        assert_eq!(
            truss.set_beam_width(stale, 0.3),
            Err(TrussEditError::UnknownBeam(stale))
        );
        assert!(truss.node(a).expect("node kept").connected_beams().is_empty());

        let missing = NodeIndex::new(17);
        assert_eq!(
            truss.add_beam(a, missing, 0.2, 0.1),
            Err(TrussEditError::UnknownNode(missing))
        );
        assert_eq!(
            truss.move_node(missing, point(3.0, 3.0, 0.0)),
            Err(TrussEditError::UnknownNode(missing))
        );
        assert_eq!(truss.cut_beams(missing), Err(CutError::UnknownNode(missing)));
    }

    #[test]
    fn beams_are_deduplicated_in_either_direction() {
        let mut truss = Truss::new();
        let a = truss.add_node(point(0.0, 0.0, 0.0));
        let b = truss.add_node(point(2.0, 1.0, 0.0));
        let forward = truss.add_beam(a, b, 0.2, 0.1).expect("valid beam");
        let backward = truss.add_beam(b, a, 0.2, 0.1).expect("valid beam");
        let on_axis = truss
            .add_beam_on_axis(Line::new(point(2.0, 1.0, 0.0), point(0.0, 0.0, 1.0e-7)), 0.2, 0.1)
            .expect("endpoints resolve to nodes");
        assert_eq!(forward, backward);
        assert_eq!(forward, on_axis);
        assert_eq!(truss.beam_count(), 1);
        assert_eq!(truss.node(a).expect("node").connected_beams(), &[forward]);
    }

    #[test]
    fn beam_on_axis_requires_nodes() {
        let mut truss = Truss::new();
        truss.add_node(point(0.0, 0.0, 0.0));
        let stray = point(5.0, 0.0, 0.0);
        assert_eq!(
            truss.add_beam_on_axis(Line::new(point(0.0, 0.0, 0.0), stray), 0.2, 0.1),
            Err(TrussEditError::NoNodeAtEndpoint(stray))
        );
        assert_eq!(truss.beam_count(), 0);
    }

    #[test]
    fn invalid_beams_leave_truss_unchanged() {
        let mut truss = Truss::new();
        let a = truss.add_node(point(0.0, 0.0, 0.0));
        let b = truss.add_node(point(1.0, 0.0, 0.0));
        let above = truss.add_node(point(0.0, 0.0, 2.0));
        assert!(matches!(
            truss.add_beam(a, b, -1.0, 0.1),
            Err(TrussEditError::InvalidBeamDimensions(
                BeamDimensionError::NonPositiveHeight { .. }
            ))
        ));
        assert!(matches!(
            truss.add_beam(a, above, 1.0, 0.1),
            Err(TrussEditError::ZeroLengthAxis { .. })
        ));
        assert_eq!(truss.beam_count(), 0);
    }

    #[test]
    fn moving_a_node_rebuilds_attached_beams() {
        let mut truss = Truss::new();
        let a = truss.add_node(point(0.0, 0.0, 0.0));
        let b = truss.add_node(point(4.0, 0.0, 0.0));
        let c = truss.add_node(point(0.0, 4.0, 0.0));
        let ab = truss.add_beam(a, b, 1.0, 1.0).expect("valid beam");
        let ac = truss.add_beam(a, c, 1.0, 1.0).expect("valid beam");
        truss.cut_all_beams();

        truss.move_node(b, point(6.0, 0.0, 0.0)).expect("move accepted");
        let node = truss.node(b).expect("node");
        assert!(node.has_moved());
        let beam = truss.beam(ab).expect("beam");
        assert_relative_eq!(beam.length(), 6.0);
        assert!(beam.is_new());
        assert_eq!(beam.cut_polyline(), beam.uncut_polyline());
        assert!(!truss.beam(ac).expect("beam").is_new());

        assert_eq!(
            truss.move_node(b, point(0.0, 4.0, 0.0)),
            Err(TrussEditError::NodeCollision(c))
        );
        assert!(matches!(
            truss.move_node(b, point(0.0, 0.0, 3.0)),
            Err(TrussEditError::ZeroLengthAxis { .. })
        ));
        assert_eq!(truss.node(b).expect("node").position(), &point(6.0, 0.0, 0.0));

        truss.mark_fabricated(ac).expect("known beam");
        let frozen = truss.beam(ac).expect("beam").clone();
        assert_eq!(
            truss.move_node(a, point(-1.0, 0.0, 0.0)),
            Err(TrussEditError::FabricatedBeam(ac))
        );
        assert_eq!(truss.node(a).expect("node").position(), &point(0.0, 0.0, 0.0));
        assert!(!truss.node(a).expect("node").has_moved());
        assert_eq!(truss.beam(ac).expect("beam"), &frozen);
        assert_relative_eq!(truss.beam(ab).expect("beam").length(), 6.0);
    }

    #[test]
    fn splitting_snaps_onto_the_axis() {
        let mut truss = Truss::new();
        let a = truss.add_node(point(0.0, 0.0, 0.0));
        let b = truss.add_node(point(4.0, 0.0, 0.0));
        let beam = truss.add_beam(a, b, 1.0, 0.5).expect("valid beam");

        assert_eq!(
            truss.split_beam(beam, point(-1.0, 2.0, 0.0)),
            Err(TrussEditError::SplitAtEndpoint(beam))
        );
        let (middle, [first, second]) = truss
            .split_beam(beam, point(1.0, 2.0, 0.0))
            .expect("split accepted");
        assert_eq!(truss.node(middle).expect("node").position(), &point(1.0, 0.0, 0.0));
        assert!(truss.find_beam(a, b).is_none());
        assert_eq!(truss.beam_count(), 2);
        assert_eq!(truss.beam_endpoints(first), Some((a, middle)));
        assert_eq!(truss.beam_endpoints(second), Some((middle, b)));
        assert!(truss.beam(first).expect("beam").is_new());
        assert_relative_eq!(truss.beam(second).expect("beam").width(), 0.5);
        assert_eq!(truss.node(a).expect("node").connected_beams(), &[first]);
    }

    #[test]
    fn fabricated_beams_cannot_be_split_or_resized() {
        let mut truss = Truss::new();
        let a = truss.add_node(point(0.0, 0.0, 0.0));
        let b = truss.add_node(point(4.0, 0.0, 0.0));
        let beam = truss.add_beam(a, b, 1.0, 0.5).expect("valid beam");
        truss.mark_fabricated(beam).expect("known beam");
        assert_eq!(
            truss.split_beam(beam, point(2.0, 0.0, 0.0)),
            Err(TrussEditError::FabricatedBeam(beam))
        );
        assert_eq!(
            truss.set_beam_width(beam, 0.7),
            Err(TrussEditError::FabricatedBeam(beam))
        );
    }

    #[test]
    fn closed_shapes_of_a_braced_square() {
        let (truss, [a, b, c, d]) = square_with_diagonal();
        let shapes = truss.closed_shapes();
        assert_eq!(shapes.len(), 2);
        for shape in &shapes {
            assert_eq!(shape.nodes.len(), 3);
            assert_eq!(shape.beams.len(), 3);
            assert_relative_eq!(shape.outline.signed_area(), 8.0, epsilon = 1e-12);
            assert!(shape.nodes.contains(&a));
            assert!(shape.nodes.contains(&c));
        }
        assert!(shapes.iter().any(|shape| shape.nodes.contains(&b)));
        assert!(shapes.iter().any(|shape| shape.nodes.contains(&d)));
    }

    #[test]
    fn insert_node_connects_the_enclosing_shape() {
        let (mut truss, [a, b, c, _]) = square_with_diagonal();
        let (centre, spokes) = truss
            .insert_node_in_shape(point(3.0, 1.0, 0.0), 0.2, 0.1)
            .expect("inside the lower triangle");
        assert_eq!(spokes.len(), 3);
        for corner in [a, b, c] {
            assert!(truss.find_beam(centre, corner).is_some());
        }
        assert_eq!(truss.closed_shapes().len(), 4);
        assert_eq!(
            truss.insert_node_in_shape(point(9.0, 9.0, 0.0), 0.2, 0.1),
            Err(TrussEditError::NoEnclosingShape(point(9.0, 9.0, 0.0)))
        );
    }

    #[test]
    fn finishing_a_round_freezes_everything() {
        let (mut truss, [a, ..]) = square_with_diagonal();
        truss.move_node(a, point(0.0, -1.0, 0.0)).expect("move accepted");
        truss.cut_all_beams();
        truss.finish_fabrication_round();
        assert!(truss.beams().all(|(_, beam)| beam.is_fabricated() && !beam.is_new()));
        assert!(truss.nodes().all(|(_, node)| !node.has_moved()));
    }
}
