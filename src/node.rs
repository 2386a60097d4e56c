//! Truss nodes: joints where beams meet.

use petgraph::stable_graph::EdgeIndex;

use crate::geometry::Point;

/// A joint of the truss.
///
/// `connected_beams` lists the beams with an axis endpoint at this node. After
/// [`Truss::organize_beams`](crate::Truss::organize_beams) it is sorted by the
/// planar angle of each beam around the node.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Location of the joint.
    position: Point,
    /// Set once the node is relocated after placement.
    has_moved: bool,
    /// Beams meeting here.
    connected_beams: Vec<EdgeIndex>,
}

impl Node {
    /// Create an unconnected node.
    pub(crate) fn new(position: Point) -> Self {
        Self {
            position,
            has_moved: false,
            connected_beams: Vec::new(),
        }
    }

    /// Location of the joint.
    #[must_use]
    pub fn position(&self) -> &Point {
        &self.position
    }

    /// Whether the node was relocated since the last fabrication round.
    #[must_use]
    pub fn has_moved(&self) -> bool {
        self.has_moved
    }

    /// Beams meeting at this node, in angular order once organized.
    #[must_use]
    pub fn connected_beams(&self) -> &[EdgeIndex] {
        &self.connected_beams
    }

    pub(crate) fn relocate(&mut self, position: Point) {
        self.position = position;
        self.has_moved = true;
    }

    pub(crate) fn set_moved(&mut self, has_moved: bool) {
        self.has_moved = has_moved;
    }

    pub(crate) fn attach(&mut self, beam: EdgeIndex) {
        if !self.connected_beams.contains(&beam) {
            self.connected_beams.push(beam);
        }
    }

    pub(crate) fn detach(&mut self, beam: EdgeIndex) {
        self.connected_beams.retain(|connected| *connected != beam);
    }

    /// Replace the beam list with an ordering of the same beams.
    pub(crate) fn set_order(&mut self, order: Vec<EdgeIndex>) {
        self.connected_beams = order;
    }
}
