#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod beam;
mod config;
mod cutting;
mod errors;
mod fabrication;
mod geometry;
mod kernel;
mod node;
mod persistence;
mod shapes;
mod truss;

pub use beam::Beam;
pub use config::CutConfig;
pub use cutting::{CutReport, JointReport, PairSkip};
pub use errors::{
    BeamDimensionError, CutError, DegenerateJointError, DegenerateReason, KernelError,
    PersistenceError, TrussEditError,
};
pub use fabrication::{BladeReference, CutPlanes};
pub use geometry::{
    horizontal_perpendicular, line_line_intersect_2d, planar_angle, point, vertical, Line, Plane,
    Point, Vector,
};
pub use kernel::{signed_area_2d, GeometryKernel, Polyline, PolylineKernel};
pub use node::Node;
pub use persistence::{AxisRecord, BeamRecord, NodeRecord, TrussDocument};
pub use shapes::ClosedShape;
pub use truss::Truss;
