// waymark_geom: 2D geometry support for the waymark navigation mesh.
//
// This crate holds everything the navmesh needs from the outside world but
// that is not navigation logic itself: plain value types, polygon predicates,
// a uniform-grid spatial index, and a segment raycaster. It has no knowledge
// of nodes, obstacles, or paths, and can be reused by anything that needs
// sub-linear neighbor queries over 2D points and boxes.
//
// Module overview:
// - `types.rs`:   `Vec2` and `Aabb` value types.
// - `polygon.rs`: Centroid, signed area, winding sign, strict point-in-polygon,
//                 proper segment crossing.
// - `grid.rs`:    `SpatialIndex` trait + `GridIndex` uniform bucket grid.
// - `raycast.rs`: `Raycaster` trait + `SegmentRaycaster`.
//
// **Critical constraint: determinism.** Query results come back sorted by key
// so that callers iterating them (graph construction, search) behave
// identically run to run. Hash maps here are `FxHashMap` (no random state)
// and are never iterated to produce output order.

pub mod grid;
pub mod polygon;
pub mod raycast;
pub mod types;

pub use grid::{CellKey, GridIndex, SpatialIndex};
pub use raycast::{Raycaster, SegmentRaycaster};
pub use types::{Aabb, Vec2};
