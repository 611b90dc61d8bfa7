// Outward polygon offsetting ("expanded obstacles").
//
// Each vertex is pushed away from the obstacle along its corner bisector by
// `margin`. For a convex corner the bisector of the two edge directions
// points into the body, so the vertex moves against it; for a reflex corner
// the bisector points out of the body, so the vertex moves with it. Which
// corners are convex depends on the loop's winding, hence the `winding`
// argument (`1.0` counter-clockwise, `-1.0` clockwise).
//
// Vertices are displaced by exactly `margin`, not `margin / sin(θ/2)`. A
// node therefore sits `margin` from its source corner, and the straight
// edges of the expanded polygon are a little closer than `margin` to the
// source edges.
//
// Compound bodies are expanded part by part; see `expand_obstacle`.
//
// See also: `obstacle.rs` for the winding cache, `navmesh.rs` which turns
// every expanded vertex into a graph node.

use crate::error::{NavError, NavResult};
use crate::obstacle::{Obstacle, validate_ring};
use waymark_geom::{Aabb, Vec2};

/// Below this length the sum of the two unit edge directions is treated as
/// zero, i.e. the corner is straight.
const STRAIGHT_CORNER_TOLERANCE: f32 = 1e-4;

/// One leaf polygon of an obstacle, before and after expansion.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandedPart {
    /// Source vertices, as given.
    pub raw: Vec<Vec2>,
    /// Offset vertices, same length and cyclic order as `raw`.
    pub expanded: Vec<Vec2>,
    /// Bounds of `expanded`.
    pub bounds: Aabb,
}

/// Offset a vertex loop outward by `margin`.
///
/// Fails with `InvalidGeometry` for loops that cannot be expanded (fewer than
/// three vertices, non-finite or coincident vertices, no enclosed area) and
/// `InvalidMargin` for negative or non-finite margins. A margin of zero
/// returns the loop unchanged.
pub fn expand(vertices: &[Vec2], margin: f32, winding: f32) -> NavResult<Vec<Vec2>> {
    validate_ring(vertices).map_err(NavError::geometry)?;
    check_margin(margin)?;

    let n = vertices.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = vertices[(i + n - 1) % n];
        let here = vertices[i];
        let next = vertices[(i + 1) % n];

        let to_prev = (prev - here).normalize_or_zero();
        let to_next = (next - here).normalize_or_zero();
        let sum = to_prev + to_next;

        let normal = if sum.length() < STRAIGHT_CORNER_TOLERANCE {
            // Collinear: push perpendicular to the edge, towards the outside.
            // For a counter-clockwise loop the outside is on the right.
            -to_next.perp() * winding
        } else {
            let bisector = sum.normalize_or_zero();
            let turn = (here - prev).cross(next - here);
            if turn * winding > 0.0 {
                -bisector
            } else {
                bisector
            }
        };
        out.push(here + normal * margin);
    }
    Ok(out)
}

/// Expand every leaf polygon of `obstacle`, using its cached windings.
///
/// Validates the whole body first, so either every part expands or nothing
/// is returned.
pub fn expand_obstacle(obstacle: &Obstacle, margin: f32) -> NavResult<Vec<ExpandedPart>> {
    obstacle.validate()?;
    check_margin(margin)?;

    let parts = obstacle.shape().parts();
    let windings = obstacle.part_windings();
    if parts.len() != windings.len() {
        return Err(NavError::geometry(format!(
            "{} has {} parts but {} cached windings",
            obstacle.id,
            parts.len(),
            windings.len()
        )));
    }
    parts
        .into_iter()
        .zip(windings.iter().copied())
        .map(|(raw, winding)| -> NavResult<ExpandedPart> {
            let expanded = expand(raw, margin, winding)?;
            let bounds = Aabb::from_points(&expanded)
                .ok_or_else(|| NavError::geometry("expanded polygon is empty"))?;
            Ok(ExpandedPart {
                raw: raw.to_vec(),
                expanded,
                bounds,
            })
        })
        .collect()
}

fn check_margin(margin: f32) -> NavResult<()> {
    if margin.is_finite() && margin >= 0.0 {
        Ok(())
    } else {
        Err(NavError::InvalidMargin { margin })
    }
}
