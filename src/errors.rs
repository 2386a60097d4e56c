//! Error types produced while editing, cutting or persisting trusses.

use std::path::PathBuf;

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use thiserror::Error;

use crate::geometry::Point;

/// Error returned when a beam is given dimensions that are not physically meaningful.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum BeamDimensionError {
    /// Returned when the cross-section width is zero, negative or not finite.
    #[error("width must be positive (received {width})")]
    NonPositiveWidth {
        /// Rejected width.
        width: f64,
    },
    /// Returned when the cross-section height is zero, negative or not finite.
    #[error("height must be positive (received {height})")]
    NonPositiveHeight {
        /// Rejected height.
        height: f64,
    },
}

impl BeamDimensionError {
    /// Validate a `(height, width)` pair.
    ///
    /// # Errors
    ///
    /// Returns the first dimension that is not strictly positive and finite.
    pub fn check(height: f64, width: f64) -> Result<(), Self> {
        if !(width.is_finite() && width > 0.0) {
            return Err(Self::NonPositiveWidth { width });
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(Self::NonPositiveHeight { height });
        }
        Ok(())
    }
}

/// Error returned when editing a [`Truss`](crate::Truss) is rejected.
///
/// # Examples
///
/// ```
/// use petgraph::stable_graph::EdgeIndex;
/// use trusscut::{Truss, TrussEditError};
///
/// let mut truss = Truss::new();
/// let missing = EdgeIndex::new(42);
/// let error = truss.mark_fabricated(missing).expect_err("unknown beam is rejected");
/// assert_eq!(error, TrussEditError::UnknownBeam(missing));
/// ```
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TrussEditError {
    /// Returned when a node cannot be found in the truss.
    #[error("node {0:?} does not exist in this truss")]
    UnknownNode(NodeIndex),
    /// Returned when a beam cannot be found in the truss.
    #[error("beam {0:?} does not exist in this truss")]
    UnknownBeam(EdgeIndex),
    /// Returned when a beam axis endpoint has no node within tolerance.
    #[error("no node lies within tolerance of axis endpoint {0:?}")]
    NoNodeAtEndpoint(Point),
    /// Returned when a beam axis has no length in the horizontal plane.
    #[error("beam axis from {from:?} to {to:?} has no horizontal length")]
    ZeroLengthAxis {
        /// Axis start.
        from: Point,
        /// Axis end.
        to: Point,
    },
    /// Returned when the supplied beam dimensions are invalid.
    #[error("{0}")]
    InvalidBeamDimensions(#[from] BeamDimensionError),
    /// Returned when an edit would change a beam that is already fabricated.
    #[error("beam {0:?} is fabricated and cannot be edited")]
    FabricatedBeam(EdgeIndex),
    /// Returned when a node would be moved onto another node.
    #[error("position is already occupied by node {0:?}")]
    NodeCollision(NodeIndex),
    /// Returned when a split point snaps onto one of the beam's endpoints.
    #[error("split point snaps to an endpoint of beam {0:?}")]
    SplitAtEndpoint(EdgeIndex),
    /// Returned when no closed shape of the truss contains the requested position.
    #[error("no closed shape contains {0:?}")]
    NoEnclosingShape(Point),
}

/// Error returned by a [`GeometryKernel`](crate::GeometryKernel).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum KernelError {
    /// Returned when the kernel cannot build curves of the requested degree.
    #[error("interpolation degree {0} is not supported")]
    UnsupportedDegree(usize),
    /// Returned when a closed curve would have fewer than three distinct corners.
    #[error("a closed curve needs at least three distinct points (received {0})")]
    TooFewPoints(usize),
}

/// Why a joint could not be cut.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DegenerateReason {
    /// Both axis endpoints coincide with the node.
    #[error("beam axis has no direction away from the node")]
    ZeroLengthDirection,
    /// Splitting the profile did not produce two pieces.
    #[error("profile could not be split into two pieces")]
    SplitFailed,
    /// The profile does not have enough distinct corners.
    #[error("profile has only {0} distinct corners")]
    TooFewCorners(usize),
    /// The projected corner runs parallel to the joint bisector.
    #[error("projected corner is parallel to the joint bisector")]
    ParallelBisector,
    /// One side of the profile has fewer than two corners.
    #[error("profile side has only {0} corners")]
    UnbalancedSides(usize),
}

/// A beam profile at a node could not be trimmed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("degenerate joint at node {node:?} for beam {beam:?}: {reason}")]
pub struct DegenerateJointError {
    /// Node being cut.
    pub node: NodeIndex,
    /// Beam whose profile is degenerate.
    pub beam: EdgeIndex,
    /// What made the joint degenerate.
    pub reason: DegenerateReason,
}

/// Error returned while cutting beams at a node.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CutError {
    /// Returned when a node cannot be found in the truss.
    #[error("node {0:?} does not exist in this truss")]
    UnknownNode(NodeIndex),
    /// Returned when a beam cannot be found in the truss.
    #[error("beam {0:?} does not exist in this truss")]
    UnknownBeam(EdgeIndex),
    /// Returned when a connected beam has no axis endpoint at the node.
    #[error("beam {beam:?} has no axis endpoint at node {node:?}")]
    DetachedBeam {
        /// Node being cut.
        node: NodeIndex,
        /// Beam listed as connected.
        beam: EdgeIndex,
    },
    /// Returned when a joint configuration is degenerate.
    #[error(transparent)]
    DegenerateJoint(#[from] DegenerateJointError),
    /// Returned when the geometry kernel fails on a beam profile.
    #[error("geometry kernel failed on beam {beam:?}: {source}")]
    Kernel {
        /// Beam whose profile was being rebuilt.
        beam: EdgeIndex,
        /// Underlying kernel failure.
        #[source]
        source: KernelError,
    },
    /// Returned when a cut would alter a fabricated beam's profile.
    #[error("beam {0:?} is fabricated; its cut profile is fixed")]
    FabricatedBeam(EdgeIndex),
}

/// Error returned while reading or writing a truss document.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Returned when the document file cannot be read or written.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Returned when the document is not valid JSON for a truss.
    #[error("malformed truss document: {0}")]
    Json(#[from] serde_json::Error),
    /// Returned when two nodes share an id.
    #[error("node id {0} appears more than once")]
    DuplicateNodeId(usize),
    /// Returned when two beams share an id.
    #[error("beam id {0} appears more than once")]
    DuplicateBeamId(usize),
    /// Returned when a beam references a node id that is not in the document.
    #[error("beam {beam} references unknown node {node}")]
    UnknownNode {
        /// Offending beam id.
        beam: usize,
        /// Missing node id.
        node: usize,
    },
    /// Returned when two beams connect the same pair of nodes.
    #[error("beam {beam} duplicates an existing beam between nodes {start} and {end}")]
    DuplicateBeam {
        /// Offending beam id.
        beam: usize,
        /// Start node id.
        start: usize,
        /// End node id.
        end: usize,
    },
    /// Returned when a beam record cannot form a valid beam.
    #[error("beam {beam} is invalid: {source}")]
    InvalidBeam {
        /// Offending beam id.
        beam: usize,
        /// Why the beam was rejected.
        #[source]
        source: TrussEditError,
    },
    /// Returned when a beam's stored axis does not end at the node it references.
    #[error("beam {beam} axis does not end at node {node}")]
    AxisOffNode {
        /// Offending beam id.
        beam: usize,
        /// Node id the axis should end at.
        node: usize,
    },
    /// Returned when a stored cut profile is not a usable closed polyline.
    #[error("beam {beam} has an unusable cut profile with {points} points")]
    InvalidProfile {
        /// Offending beam id.
        beam: usize,
        /// Number of stored points.
        points: usize,
    },
}
