//! Closed shapes (faces) of a planar truss.
//!
//! Every beam contributes two half-edges. Walking a half-edge `u -> v` continues
//! from `v` along the neighbour that precedes `u` in `v`'s counter-clockwise
//! order, which keeps the face on the left. Bounded faces come out
//! counter-clockwise; the unbounded outer face comes out clockwise and is dropped.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use crate::geometry::planar_angle;
use crate::kernel::Polyline;
use crate::truss::Truss;

/// A minimal closed loop of beams.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosedShape {
    /// Nodes around the shape, counter-clockwise.
    pub nodes: Vec<NodeIndex>,
    /// Beams around the shape; beam `i` joins node `i` to node `i + 1`.
    pub beams: Vec<EdgeIndex>,
    /// Closed outline through the node positions.
    pub outline: Polyline,
}

/// Trace every bounded face of `truss`.
pub(crate) fn closed_shapes(truss: &Truss) -> Vec<ClosedShape> {
    let mut neighbours: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
    let mut half_edges = Vec::new();
    for (beam, _) in truss.beams() {
        if let Some((start, end)) = truss.beam_endpoints(beam) {
            neighbours.entry(start).or_default().push(end);
            neighbours.entry(end).or_default().push(start);
            half_edges.push((start, end));
            half_edges.push((end, start));
        }
    }
    for (node, around) in &mut neighbours {
        let Some(origin) = truss.node(*node).map(|n| *n.position()) else {
            continue;
        };
        let angle = |other: &NodeIndex| {
            truss
                .node(*other)
                .map_or(0.0, |n| planar_angle(&origin, n.position()))
        };
        around.sort_by(|a, b| angle(a).total_cmp(&angle(b)));
    }

    let mut visited = HashSet::new();
    let mut shapes = Vec::new();
    for &start in &half_edges {
        if visited.contains(&start) {
            continue;
        }
        let mut nodes = Vec::new();
        let mut current = start;
        for _ in 0..half_edges.len() {
            visited.insert(current);
            nodes.push(current.0);
            let Some(next) = turn(&neighbours, current) else {
                break;
            };
            current = (current.1, next);
            if current == start {
                break;
            }
        }
        if current != start {
            continue;
        }
        if let Some(shape) = build_shape(truss, nodes) {
            shapes.push(shape);
        }
    }
    shapes
}

/// Node reached after arriving at `to` from `from`.
fn turn(neighbours: &HashMap<NodeIndex, Vec<NodeIndex>>, (from, to): (NodeIndex, NodeIndex)) -> Option<NodeIndex> {
    let around = neighbours.get(&to)?;
    let index = around.iter().position(|n| *n == from)?;
    Some(around[(index + around.len() - 1) % around.len()])
}

/// Keep loops with positive area that visit each node once.
fn build_shape(truss: &Truss, nodes: Vec<NodeIndex>) -> Option<ClosedShape> {
    let unique: HashSet<_> = nodes.iter().collect();
    if unique.len() != nodes.len() || nodes.len() < 3 {
        return None;
    }
    let corners = nodes
        .iter()
        .map(|node| truss.node(*node).map(|n| *n.position()))
        .collect::<Option<Vec<_>>>()?;
    let outline = Polyline::closed(corners);
    if outline.signed_area() <= truss.config().node_tolerance {
        return None;
    }
    let beams = (0..nodes.len())
        .map(|i| truss.find_beam(nodes[i], nodes[(i + 1) % nodes.len()]))
        .collect::<Option<Vec<_>>>()?;
    Some(ClosedShape {
        nodes,
        beams,
        outline,
    })
}
