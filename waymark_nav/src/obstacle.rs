// Obstacle bodies fed into the navmesh.
//
// An `Obstacle` pairs a caller-chosen `ObstacleId` with an `ObstacleShape`,
// which is either a single polygon or a compound of sub-shapes (a concave
// body split into convex parts, say). Compounds are flattened depth-first by
// `ObstacleShape::parts()`; every leaf polygon becomes its own navigable
// polygon in the mesh, and all of them share the body's id.
//
// Winding is derived once per leaf polygon and cached on the `Obstacle`, so
// re-expanding the same body (for instance at a different margin) stays
// linear in its vertex count. The shape is only reachable through
// `shape()` / `set_shape()`, and replacing it clears the cache.
//
// See also: `expand.rs` which offsets the parts, `navmesh.rs` which registers
// them.

use crate::error::{NavError, NavResult};
use crate::types::ObstacleId;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use waymark_geom::polygon::{signed_area, winding_sign};
use waymark_geom::{Aabb, Vec2};

/// Geometry of an obstacle body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObstacleShape {
    /// One closed polygon, either winding.
    Simple { vertices: Vec<Vec2> },
    /// A body made of several parts, each expanded separately.
    Compound { parts: Vec<ObstacleShape> },
}

impl ObstacleShape {
    pub fn simple(vertices: impl Into<Vec<Vec2>>) -> Self {
        Self::Simple {
            vertices: vertices.into(),
        }
    }

    pub fn compound(parts: Vec<ObstacleShape>) -> Self {
        Self::Compound { parts }
    }

    /// Axis-aligned rectangle, counter-clockwise from `min`.
    pub fn rectangle(min: Vec2, max: Vec2) -> Self {
        Self::simple(vec![
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ])
    }

    /// Leaf polygons in depth-first order.
    pub fn parts(&self) -> Vec<&[Vec2]> {
        let mut out = Vec::new();
        self.collect_parts(&mut out);
        out
    }

    fn collect_parts<'a>(&'a self, out: &mut Vec<&'a [Vec2]>) {
        match self {
            Self::Simple { vertices } => out.push(vertices),
            Self::Compound { parts } => {
                for part in parts {
                    part.collect_parts(out);
                }
            }
        }
    }
}

/// An obstacle body: identity plus shape, with cached per-part winding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    shape: ObstacleShape,
    #[serde(skip)]
    windings: OnceCell<Vec<f32>>,
}

impl Obstacle {
    pub fn new(id: ObstacleId, shape: ObstacleShape) -> Self {
        Self {
            id,
            shape,
            windings: OnceCell::new(),
        }
    }

    pub fn shape(&self) -> &ObstacleShape {
        &self.shape
    }

    /// Replace the geometry, dropping any cached windings.
    pub fn set_shape(&mut self, shape: ObstacleShape) {
        self.shape = shape;
        self.windings = OnceCell::new();
    }

    /// Check that every leaf polygon is usable: at least three vertices, all
    /// finite, no two consecutive vertices coincident, and a nonzero enclosed
    /// area. A compound with no parts at all is rejected too.
    pub fn validate(&self) -> NavResult<()> {
        let parts = self.shape.parts();
        if parts.is_empty() {
            return Err(NavError::geometry(format!(
                "{} has no polygon parts",
                self.id
            )));
        }
        for (index, part) in parts.iter().enumerate() {
            validate_ring(part).map_err(|reason| {
                NavError::geometry(format!("{} part {index}: {reason}", self.id))
            })?;
        }
        Ok(())
    }

    /// Winding sign of each leaf polygon, in `parts()` order. Computed on
    /// first use and cached.
    pub fn part_windings(&self) -> &[f32] {
        self.windings.get_or_init(|| {
            self.shape
                .parts()
                .into_iter()
                .map(winding_sign)
                .collect()
        })
    }
}

/// Rings whose area is at most this fraction of their squared bounding
/// extent are treated as collinear.
const FLAT_RING_TOLERANCE: f32 = 1e-6;

/// Reason a vertex loop cannot be expanded, if any.
pub(crate) fn validate_ring(vertices: &[Vec2]) -> Result<(), String> {
    if vertices.len() < 3 {
        return Err(format!("needs at least 3 vertices, got {}", vertices.len()));
    }
    if let Some(bad) = vertices.iter().find(|v| !v.is_finite()) {
        return Err(format!("non-finite vertex {bad}"));
    }
    for (i, &v) in vertices.iter().enumerate() {
        let next = vertices[(i + 1) % vertices.len()];
        if v.distance(next) <= f32::EPSILON {
            return Err(format!("vertices {i} and {} coincide at {v}", (i + 1) % vertices.len()));
        }
    }
    let extent = Aabb::from_points(vertices).map_or(0.0, |b| {
        let size = b.max - b.min;
        size.x.max(size.y)
    });
    let area = signed_area(vertices).abs();
    if area <= FLAT_RING_TOLERANCE * extent * extent {
        return Err(format!("encloses no area ({area})"));
    }
    Ok(())
}
