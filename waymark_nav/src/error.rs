// Error taxonomy for the navmesh.
//
// Only construction-time problems are errors: bad geometry, bad margins, bad
// configuration, unreadable files. An unreachable path query is an expected
// outcome and is reported through `PathOutcome`, never through `NavError`.
// Removing an obstacle that was never added is a no-op, not an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("invalid margin {margin}: must be finite and non-negative")]
    InvalidMargin { margin: f32 },

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error(
        "spatial index cell sizes must match the config (nodes: {node_cell_size}, polygons: {polygon_cell_size}, config: {config_cell_size})"
    )]
    MismatchedCellSize {
        node_cell_size: f32,
        polygon_cell_size: f32,
        config_cell_size: f32,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NavError {
    pub(crate) fn geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Result alias for fallible navmesh operations.
pub type NavResult<T> = Result<T, NavError>;
