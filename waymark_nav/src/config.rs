// Data-driven navmesh configuration.
//
// All tunable parameters live in `NavConfig`, loaded from JSON (missing
// fields take their defaults). The navmesh reads these from the config it was
// constructed with rather than from constants.
//
// `cell_size` does double duty: it is the bucket size of both spatial indices
// and the radius within which `connect` looks for visible neighbors. A mesh
// whose obstacles are spread wider than one cell apart will not link them;
// raise `cell_size` for sparse scenes.
//
// See also: `navmesh.rs` which validates and owns the config, `scene.rs`
// which embeds one in scene files.

use crate::error::{NavError, NavResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every tunable the navmesh reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Grid cell size shared by the node and polygon indices, in world
    /// units. Also the maximum length of a visibility edge found by a normal
    /// `connect` pass.
    pub cell_size: f32,
    /// Clearance used for scene obstacles that do not specify their own.
    pub default_margin: f32,
    /// A* expansion budget per path query.
    pub max_expansions: usize,
    /// Post-process found paths by skipping waypoints that a later waypoint
    /// can see directly.
    pub smooth_paths: bool,
    /// Boundary tolerance handed to the raycaster and containment tests.
    pub geometry_epsilon: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            cell_size: 256.0,
            default_margin: 10.0,
            max_expansions: 10_000,
            smooth_paths: false,
            geometry_epsilon: waymark_geom::polygon::GEOM_EPSILON,
        }
    }
}

impl NavConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> NavResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|source| NavError::Parse {
            what: "nav config",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> NavResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| NavError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> NavResult<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(NavError::config(format!(
                "cell_size must be positive and finite, got {}",
                self.cell_size
            )));
        }
        if !(self.default_margin.is_finite() && self.default_margin >= 0.0) {
            return Err(NavError::config(format!(
                "default_margin must be non-negative and finite, got {}",
                self.default_margin
            )));
        }
        if self.max_expansions == 0 {
            return Err(NavError::config("max_expansions must be at least 1"));
        }
        if !(self.geometry_epsilon.is_finite() && self.geometry_epsilon >= 0.0) {
            return Err(NavError::config(format!(
                "geometry_epsilon must be non-negative and finite, got {}",
                self.geometry_epsilon
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NavConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_expansions, 10_000);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = NavConfig::from_json(r#"{ "cell_size": 64.0, "smooth_paths": true }"#).unwrap();
        assert_eq!(config.cell_size, 64.0);
        assert!(config.smooth_paths);
        assert_eq!(config.default_margin, 10.0);
        assert_eq!(config.max_expansions, 10_000);
    }

    #[test]
    fn config_roundtrip() {
        let config = NavConfig {
            cell_size: 128.0,
            max_expansions: 42,
            ..NavConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(NavConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn rejects_bad_values() {
        for json in [
            r#"{ "cell_size": 0.0 }"#,
            r#"{ "cell_size": -5.0 }"#,
            r#"{ "default_margin": -1.0 }"#,
            r#"{ "max_expansions": 0 }"#,
        ] {
            assert!(
                matches!(NavConfig::from_json(json), Err(NavError::InvalidConfig { .. })),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            NavConfig::from_json("{ not json"),
            Err(NavError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            NavConfig::load("/definitely/not/here/nav.json"),
            Err(NavError::Io { .. })
        ));
    }
}
