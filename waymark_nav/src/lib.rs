// waymark_nav: navigation mesh over polygonal obstacles.
//
// Builds a visibility graph whose nodes sit on the corners of obstacles
// expanded by a clearance margin, keeps it up to date as obstacles are added
// and removed, and answers shortest-path queries between arbitrary points by
// inserting transient start/end nodes and running A*.
//
// Module overview:
// - `types.rs`:       Strongly-typed ids (`NodeId`, `ObstacleId`, `PolygonId`).
// - `error.rs`:       `NavError` / `NavResult`.
// - `config.rs`:      `NavConfig`, every tunable, loadable from JSON.
// - `obstacle.rs`:    `Obstacle` + `ObstacleShape` (simple or compound bodies).
// - `expand.rs`:      Outward polygon offsetting by a clearance margin.
// - `graph.rs`:       `NavGraph`, the node arena with symmetric adjacency.
// - `navmesh.rs`:     `NavMesh`: obstacles, polygons, spatial indices, edge
//                     discovery via raycasting.
// - `pathfinding.rs`: A* over the graph with per-query scratch state, plus the
//                     `NavMesh` path query entry points.
// - `scene.rs`:       JSON scene files (config + obstacles + queries).
//
// Geometry primitives, the spatial grid and the raycaster live in the
// companion crate `waymark_geom` and are re-exported here as `geom`.
//
// **Critical constraint: one query at a time.** Path queries insert and
// remove transient nodes, so they take `&mut NavMesh`. Callers that share a
// mesh across threads must serialize whole queries (e.g. behind a `Mutex`).

pub mod config;
pub mod error;
pub mod expand;
pub mod graph;
pub mod navmesh;
pub mod obstacle;
pub mod pathfinding;
pub mod scene;
pub mod types;

pub use waymark_geom as geom;

pub use config::NavConfig;
pub use error::{NavError, NavResult};
pub use navmesh::{NavMesh, NavPolygon, NavStats};
pub use obstacle::{Obstacle, ObstacleShape};
pub use pathfinding::{NavPath, PathOutcome};
pub use types::{NodeId, ObstacleId, PolygonId};
pub use waymark_geom::{Aabb, Vec2};
