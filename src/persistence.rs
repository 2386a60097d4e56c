//! JSON documents that carry a truss between sessions.
//!
//! A document holds topology, geometry, fabrication flags and every cut
//! profile. Loading trusts the stored start/end node ids for adjacency and
//! never re-derives it from positions, so fabricated profiles come back exactly
//! as written.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::beam::Beam;
use crate::config::CutConfig;
use crate::errors::PersistenceError;
use crate::geometry::{Line, Point};
use crate::kernel::Polyline;
use crate::truss::Truss;

/// Serialized form of a whole truss.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrussDocument {
    /// Nodes in id order.
    pub nodes: Vec<NodeRecord>,
    /// Beams in id order.
    pub beams: Vec<BeamRecord>,
}

/// Serialized node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Document-local id.
    pub id: usize,
    /// `[x, y, z]`.
    pub position: [f64; 3],
    /// Whether the node moved since the last fabrication round.
    #[serde(default)]
    pub has_moved: bool,
}

/// Serialized beam axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRecord {
    /// Start point.
    pub from: [f64; 3],
    /// End point.
    pub to: [f64; 3],
}

/// Serialized beam.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamRecord {
    /// Document-local id.
    pub id: usize,
    /// Id of the node at the axis start.
    pub start_node: usize,
    /// Id of the node at the axis end.
    pub end_node: usize,
    /// Centreline.
    pub axis: AxisRecord,
    /// Cross-section height.
    pub height: f64,
    /// Cross-section width.
    pub width: f64,
    /// Width at last fabrication; defaults to `width` when absent.
    #[serde(default)]
    pub reference_width: Option<f64>,
    /// Whether the beam is physically cut.
    #[serde(default)]
    pub fabricated: bool,
    /// Whether the beam is new since the last fabrication round.
    #[serde(default)]
    pub is_new: bool,
    /// Closed cut profile, first point repeated at the end.
    #[serde(default)]
    pub cut_polyline: Vec<[f64; 3]>,
}

/// `[x, y, z]` of a point.
fn to_array(point: &Point) -> [f64; 3] {
    [point.x, point.y, point.z]
}

/// Point from `[x, y, z]`.
fn to_point(coordinates: &[f64; 3]) -> Point {
    Point::new(coordinates[0], coordinates[1], coordinates[2])
}

impl Truss {
    /// Snapshot the truss as a document. Ids are assigned compactly in index order.
    #[must_use]
    pub fn to_document(&self) -> TrussDocument {
        let ids: HashMap<NodeIndex, usize> = self
            .nodes()
            .enumerate()
            .map(|(id, (index, _))| (index, id))
            .collect();
        let nodes = self
            .nodes()
            .enumerate()
            .map(|(id, (_, node))| NodeRecord {
                id,
                position: to_array(node.position()),
                has_moved: node.has_moved(),
            })
            .collect();
        let beams = self
            .beams()
            .enumerate()
            .filter_map(|(id, (index, beam))| {
                let (start, end) = self.beam_endpoints(index)?;
                Some(BeamRecord {
                    id,
                    start_node: *ids.get(&start)?,
                    end_node: *ids.get(&end)?,
                    axis: AxisRecord {
                        from: to_array(&beam.axis().from),
                        to: to_array(&beam.axis().to),
                    },
                    height: beam.height(),
                    width: beam.width(),
                    reference_width: Some(beam.reference_width()),
                    fabricated: beam.is_fabricated(),
                    is_new: beam.is_new(),
                    cut_polyline: beam.cut_polyline().points().iter().map(to_array).collect(),
                })
            })
            .collect();
        TrussDocument { nodes, beams }
    }

    /// Rebuild a truss with default tolerances.
    ///
    /// # Errors
    ///
    /// See [`Truss::from_document_with_config`].
    pub fn from_document(document: &TrussDocument) -> Result<Self, PersistenceError> {
        Self::from_document_with_config(document, CutConfig::default())
    }

    /// Rebuild a truss from a document.
    ///
    /// The whole document is validated; no truss is returned when any record is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] for duplicate ids, dangling node references,
    /// duplicate beams, axes that do not end at their nodes, invalid beam
    /// geometry or unusable cut profiles.
    pub fn from_document_with_config(
        document: &TrussDocument,
        config: CutConfig,
    ) -> Result<Self, PersistenceError> {
        let mut truss = Self::with_config(config);
        let mut nodes: HashMap<usize, NodeIndex> = HashMap::with_capacity(document.nodes.len());
        for record in &document.nodes {
            if nodes.contains_key(&record.id) {
                return Err(PersistenceError::DuplicateNodeId(record.id));
            }
            let index = truss.restore_node(to_point(&record.position), record.has_moved);
            nodes.insert(record.id, index);
        }

        let mut beam_ids = HashSet::with_capacity(document.beams.len());
        for record in &document.beams {
            if !beam_ids.insert(record.id) {
                return Err(PersistenceError::DuplicateBeamId(record.id));
            }
            let lookup = |node: usize| {
                nodes.get(&node).copied().ok_or(PersistenceError::UnknownNode {
                    beam: record.id,
                    node,
                })
            };
            let start = lookup(record.start_node)?;
            let end = lookup(record.end_node)?;
            if truss.find_beam(start, end).is_some() {
                return Err(PersistenceError::DuplicateBeam {
                    beam: record.id,
                    start: record.start_node,
                    end: record.end_node,
                });
            }
            let tolerance = truss.config().node_tolerance;
            for (node, id, endpoint) in [
                (start, record.start_node, &record.axis.from),
                (end, record.end_node, &record.axis.to),
            ] {
                let on_node = truss.node(node).is_some_and(|weight| {
                    nalgebra::distance(weight.position(), &to_point(endpoint)) <= tolerance
                });
                if !on_node {
                    return Err(PersistenceError::AxisOffNode {
                        beam: record.id,
                        node: id,
                    });
                }
            }
            let beam = restore_beam(record)?;
            truss.insert_beam(start, end, beam);
        }
        info!(
            nodes = truss.node_count(),
            beams = truss.beam_count(),
            "truss document loaded"
        );
        Ok(truss)
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Json`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    /// Parse a truss from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Json`] for malformed text, plus the
    /// validation errors of [`Truss::from_document_with_config`].
    ///
    /// # Examples
    /// ```
    /// use trusscut::Truss;
    ///
    /// let text = r#"{
    ///   "nodes": [
    ///     { "id": 0, "position": [0.0, 0.0, 0.0], "has_moved": false },
    ///     { "id": 1, "position": [2.0, 0.0, 0.0], "has_moved": false }
    ///   ],
    ///   "beams": [
    ///     { "id": 0, "start_node": 0, "end_node": 1,
    ///       "axis": { "from": [0.0, 0.0, 0.0], "to": [2.0, 0.0, 0.0] },
    ///       "height": 0.2, "width": 0.1, "reference_width": 0.1,
    ///       "fabricated": false, "is_new": false, "cut_polyline": [] }
    ///   ]
    /// }"#;
    /// let truss = Truss::from_json_str(text).expect("valid document");
    /// assert_eq!(truss.beam_count(), 1);
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, PersistenceError> {
        let document: TrussDocument = serde_json::from_str(text)?;
        Self::from_document(&document)
    }

    /// Write the truss to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] when the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let text = self.to_json_string()?;
        std::fs::write(path, text).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a truss from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] when the file cannot be read, plus the
    /// errors of [`Truss::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

/// Validate one beam record and build the beam it describes.
fn restore_beam(record: &BeamRecord) -> Result<Beam, PersistenceError> {
    let cut = match record.cut_polyline.len() {
        0 if !record.fabricated => None,
        n if n < 4 => {
            return Err(PersistenceError::InvalidProfile {
                beam: record.id,
                points: n,
            })
        }
        n => {
            let profile = Polyline::new(record.cut_polyline.iter().map(to_point).collect());
            if !profile.is_closed() {
                return Err(PersistenceError::InvalidProfile {
                    beam: record.id,
                    points: n,
                });
            }
            Some(profile)
        }
    };
    Beam::restore(
        Line::new(to_point(&record.axis.from), to_point(&record.axis.to)),
        record.height,
        record.width,
        record.reference_width.unwrap_or(record.width),
        record.fabricated,
        record.is_new,
        cut,
    )
    .map_err(|source| PersistenceError::InvalidBeam {
        beam: record.id,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TrussEditError;
    use crate::geometry::point;

    fn two_node_document() -> TrussDocument {
        let mut truss = Truss::new();
        let a = truss.add_node(point(0.0, 0.0, 0.0));
        let b = truss.add_node(point(2.0, 0.0, 0.0));
        truss.add_beam(a, b, 0.2, 0.1).expect("valid beam");
        truss.to_document()
    }

    #[test]
    fn records_use_compact_ids() {
        let document = two_node_document();
        assert_eq!(document.nodes.len(), 2);
        assert_eq!(document.beams[0].start_node, 0);
        assert_eq!(document.beams[0].end_node, 1);
        assert_eq!(document.beams[0].cut_polyline.len(), 5);
        assert_eq!(document.beams[0].reference_width, Some(0.1));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut document = two_node_document();
        document.nodes[1].id = 0;
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::DuplicateNodeId(0))
        ));

        let mut document = two_node_document();
        let mut copy = document.beams[0].clone();
        copy.start_node = 1;
        copy.end_node = 0;
        document.beams.push(copy);
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::DuplicateBeamId(0))
        ));
        document.beams[1].id = 1;
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::DuplicateBeam { beam: 1, start: 1, end: 0 })
        ));
    }

    #[test]
    fn dangling_and_invalid_beams_are_rejected() {
        let mut document = two_node_document();
        document.beams[0].end_node = 9;
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::UnknownNode { beam: 0, node: 9 })
        ));

        let mut document = two_node_document();
        document.beams[0].width = 0.0;
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::InvalidBeam {
                beam: 0,
                source: TrussEditError::InvalidBeamDimensions(_)
            })
        ));
    }

    #[test]
    fn profiles_are_validated() {
        let mut document = two_node_document();
        document.beams[0].cut_polyline.truncate(3);
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::InvalidProfile { beam: 0, points: 3 })
        ));

        let mut document = two_node_document();
        document.beams[0].cut_polyline.clear();
        let truss = Truss::from_document(&document).expect("empty profile falls back to uncut");
        let (_, beam) = truss.beams().next().expect("one beam");
        assert_eq!(beam.cut_polyline(), beam.uncut_polyline());

        document.beams[0].fabricated = true;
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::InvalidProfile { beam: 0, points: 0 })
        ));

        let mut document = two_node_document();
        document.beams[0].fabricated = true;
        document.beams[0].cut_polyline.pop();
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::InvalidProfile { beam: 0, points: 4 })
        ));
    }

    #[test]
    fn axes_must_end_at_their_nodes() {
        let mut document = two_node_document();
        document.beams[0].axis.to = [2.0, 0.5, 0.0];
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::AxisOffNode { beam: 0, node: 1 })
        ));

        let mut document = two_node_document();
        document.beams[0].axis.from = [20.0, 20.0, 0.0];
        document.beams[0].axis.to = [21.0, 20.0, 0.0];
        assert!(matches!(
            Truss::from_document(&document),
            Err(PersistenceError::AxisOffNode { beam: 0, node: 0 })
        ));

        let mut document = two_node_document();
        document.beams[0].axis.to = [2.0, 0.0, 5.0e-7];
        Truss::from_document(&document).expect("within node tolerance");
    }

    #[test]
    fn missing_reference_width_defaults_to_width() {
        let mut document = two_node_document();
        document.beams[0].reference_width = None;
        document.beams[0].width = 0.3;
        document.beams[0].cut_polyline.clear();
        let truss = Truss::from_document(&document).expect("valid document");
        let (_, beam) = truss.beams().next().expect("one beam");
        assert_eq!(beam.reference_width(), 0.3);
    }
}
