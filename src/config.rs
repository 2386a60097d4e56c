//! Tunable tolerances for topology matching and joint cutting.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::PersistenceError;

/// Tolerances used when building a truss and cutting its joints.
///
/// Every field has a default, so a configuration file only needs to list the
/// values it overrides.
///
/// # Examples
/// ```
/// use trusscut::CutConfig;
///
/// let config = CutConfig::from_json_str(r#"{ "node_tolerance": 1e-4 }"#).expect("valid config");
/// assert_eq!(config.node_tolerance, 1e-4);
/// assert_eq!(config.interpolation_degree, 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutConfig {
    /// Distance under which two node positions, or a node and an axis endpoint, coincide.
    pub node_tolerance: f64,
    /// Coincidence tolerance for profile/profile intersections.
    pub intersection_tolerance: f64,
    /// Degree of the curve rebuilt through trimmed profile points.
    pub interpolation_degree: usize,
    /// Angular slack in radians before a joint gap counts as reflex.
    pub reflex_angle_tolerance: f64,
    /// Amount by which a width must exceed its reference width to count as grown.
    pub width_growth_tolerance: f64,
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            node_tolerance: 1.0e-6,
            intersection_tolerance: 1.0e-6,
            interpolation_degree: 1,
            reflex_angle_tolerance: 1.0e-9,
            width_growth_tolerance: 1.0e-9,
        }
    }
}

impl CutConfig {
    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the parser error when the text is not a valid configuration object.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Read a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] when the file cannot be read and
    /// [`PersistenceError::Json`] when it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_json_str(&text)?)
    }
}
