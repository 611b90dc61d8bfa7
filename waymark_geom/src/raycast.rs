// Segment occlusion against polygon candidates.
//
// `Raycaster` is the contract the navmesh relies on: given two points and a
// candidate polygon set, say whether the straight segment between them is
// blocked. The polygons passed in are the *only* occluders considered; the
// caller is responsible for supplying a complete-enough set (normally the
// polygons whose bounds overlap the query neighborhood).
//
// `SegmentRaycaster` blocks a segment when it properly crosses a polygon edge,
// or when it runs through a polygon's interior while touching the boundary
// only at vertices (e.g. the diagonal between two opposite corners). Sliding
// along an edge or grazing a corner is not blocked.
//
// See also: `polygon.rs` for the underlying predicates.

use crate::polygon::{GEOM_EPSILON, contains_point, segment_touch_params, segments_cross};
use crate::types::{Aabb, Vec2};

pub trait Raycaster {
    /// True if the segment `from`–`to` is occluded by any of `polygons`.
    fn segment_blocked(&self, from: Vec2, to: Vec2, polygons: &[&[Vec2]]) -> bool;
}

/// Exact segment-versus-polygon occlusion with a boundary tolerance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentRaycaster {
    pub epsilon: f32,
}

impl Default for SegmentRaycaster {
    fn default() -> Self {
        Self {
            epsilon: GEOM_EPSILON,
        }
    }
}

impl SegmentRaycaster {
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }

    fn blocks(&self, from: Vec2, to: Vec2, polygon: &[Vec2]) -> bool {
        if polygon.len() < 3 {
            return false;
        }
        let n = polygon.len();
        for i in 0..n {
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            if segments_cross(from, to, a, b, self.epsilon) {
                return true;
            }
        }
        // No proper crossing: the segment is either fully outside, fully
        // inside, or enters/leaves only through vertices. Probe the middle of
        // every stretch between boundary touches.
        let params = segment_touch_params(from, to, polygon, self.epsilon);
        params.windows(2).any(|w| {
            let mid = from.lerp(to, (w[0] + w[1]) * 0.5);
            contains_point(polygon, mid, self.epsilon)
        })
    }
}

impl Raycaster for SegmentRaycaster {
    fn segment_blocked(&self, from: Vec2, to: Vec2, polygons: &[&[Vec2]]) -> bool {
        let reach = Aabb::from_corners(from, to).expanded(self.epsilon);
        polygons.iter().any(|poly| {
            Aabb::from_points(poly).is_some_and(|bounds| bounds.intersects(reach))
                && self.blocks(from, to, poly)
        })
    }
}
