// JSON scene files: a config, a list of obstacle bodies, and optional path
// queries to run against them.
//
// Bodies use the wire shape clients already produce:
//
//   { "id": 3, "margin": 12.0,
//     "vertices": [[0, 0], [40, 0], [40, 40]],
//     "isCompound": false, "children": [] }
//
// A compound body sets `isCompound` and lists its parts under `children`
// (recursively); its own `vertices` are ignored. `margin` is optional and
// falls back to `config.default_margin`.
//
// See also: `config.rs` for the embedded `NavConfig`, the `waymark` binary
// which loads scenes from disk.

use crate::config::NavConfig;
use crate::error::{NavError, NavResult};
use crate::navmesh::NavMesh;
use crate::obstacle::{Obstacle, ObstacleShape};
use crate::types::ObstacleId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use waymark_geom::Vec2;

/// A body as written in scene files.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyDescription {
    #[serde(default)]
    pub vertices: Vec<Vec2>,
    #[serde(rename = "isCompound", default)]
    pub is_compound: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BodyDescription>,
}

impl From<&BodyDescription> for ObstacleShape {
    fn from(body: &BodyDescription) -> Self {
        if body.is_compound {
            ObstacleShape::compound(body.children.iter().map(ObstacleShape::from).collect())
        } else {
            ObstacleShape::simple(body.vertices.clone())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObstacle {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<f32>,
    #[serde(flatten)]
    pub body: BodyDescription,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathQuery {
    pub start: Vec2,
    pub end: Vec2,
}

/// A complete scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub config: NavConfig,
    pub obstacles: Vec<SceneObstacle>,
    pub queries: Vec<PathQuery>,
}

impl Scene {
    /// Parse a scene and validate its config. Obstacle geometry is checked
    /// when the mesh is built.
    pub fn from_json(json: &str) -> NavResult<Self> {
        let scene: Self = serde_json::from_str(json).map_err(|source| NavError::Parse {
            what: "scene",
            source,
        })?;
        scene.config.validate()?;
        Ok(scene)
    }

    pub fn load(path: impl AsRef<Path>) -> NavResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| NavError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Each body as an `Obstacle` with its effective margin.
    pub fn bodies(&self) -> Vec<(Obstacle, f32)> {
        self.obstacles
            .iter()
            .map(|o| {
                let obstacle = Obstacle::new(ObstacleId(o.id), ObstacleShape::from(&o.body));
                (obstacle, o.margin.unwrap_or(self.config.default_margin))
            })
            .collect()
    }

    /// A mesh with every body added, in file order.
    pub fn build(&self) -> NavResult<NavMesh> {
        let mut mesh = NavMesh::new(self.config.clone())?;
        for (obstacle, margin) in self.bodies() {
            mesh.add_obstacle(&obstacle, margin)?;
        }
        Ok(mesh)
    }
}
