// Polygon predicates over closed vertex loops.
//
// A polygon is a `&[Vec2]` whose last vertex implicitly connects back to the
// first. Nothing here allocates except `segment_touch_params`, and nothing
// assumes convexity.
//
// Boundary handling is deliberately strict: `contains_point` reports `false`
// for points within `epsilon` of an edge, and `segments_cross` only reports
// proper crossings (each segment strictly straddles the other). Navigation
// nodes sit exactly on expanded obstacle boundaries, so "touching" must never
// count as "inside" or "crossing".
//
// See also: `raycast.rs`, which combines these into the occlusion test.

use crate::types::Vec2;
use std::f32::consts::{PI, TAU};

/// Default boundary tolerance in world units.
pub const GEOM_EPSILON: f32 = 1e-3;

/// Area-weighted centroid. Falls back to the vertex mean for degenerate
/// (zero-area) loops.
pub fn centroid(vertices: &[Vec2]) -> Vec2 {
    if vertices.is_empty() {
        return Vec2::ZERO;
    }
    let mut area2 = 0.0;
    let mut acc = Vec2::ZERO;
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        let w = a.cross(b);
        area2 += w;
        acc += (a + b) * w;
    }
    if area2.abs() <= f32::EPSILON {
        let sum = vertices.iter().fold(Vec2::ZERO, |s, &v| s + v);
        return sum * (1.0 / vertices.len() as f32);
    }
    acc * (1.0 / (3.0 * area2))
}

/// Shoelace signed area. Positive for counter-clockwise loops.
pub fn signed_area(vertices: &[Vec2]) -> f32 {
    let mut area2 = 0.0;
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        area2 += a.cross(b);
    }
    area2 * 0.5
}

/// Winding sign of a vertex loop: `1.0` for counter-clockwise, `-1.0` for
/// clockwise.
///
/// Sums the angle swept by the direction from the centroid to each vertex in
/// turn. For loops that wind around their centroid this totals ±2π. A
/// strongly concave loop can have its centroid outside itself, in which case
/// the sweep cancels out and the signed area decides instead.
pub fn winding_sign(vertices: &[Vec2]) -> f32 {
    let Some(&last) = vertices.last() else {
        return 1.0;
    };
    let c = centroid(vertices);
    let angle_of = |v: Vec2| (v.y - c.y).atan2(v.x - c.x);

    let mut previous = angle_of(last);
    let mut total = 0.0;
    for &v in vertices {
        let angle = angle_of(v);
        let mut delta = angle - previous;
        if delta > PI {
            delta -= TAU;
        } else if delta <= -PI {
            delta += TAU;
        }
        total += delta;
        previous = angle;
    }

    if total.abs() >= PI {
        total.signum()
    } else if signed_area(vertices) < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Distance from `p` to the closed segment `a`–`b`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Strict even-odd point-in-polygon test. Points within `epsilon` of any
/// edge are reported as outside.
pub fn contains_point(vertices: &[Vec2], p: Vec2, epsilon: f32) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[j];
        if distance_to_segment(p, a, b) <= epsilon {
            return false;
        }
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed perpendicular distance of `p` from the line through `a`–`b`.
/// Positive on the left (counter-clockwise) side.
fn side_of(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let len = ab.length();
    if len <= f32::EPSILON {
        return 0.0;
    }
    ab.cross(p - a) / len
}

fn straddles(d1: f32, d2: f32, epsilon: f32) -> bool {
    (d1 > epsilon && d2 < -epsilon) || (d1 < -epsilon && d2 > epsilon)
}

/// True when segments `p1`–`p2` and `q1`–`q2` properly cross: each strictly
/// straddles the line of the other. Shared endpoints, T-junctions and
/// collinear overlap are not crossings.
pub fn segments_cross(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2, epsilon: f32) -> bool {
    straddles(side_of(q1, q2, p1), side_of(q1, q2, p2), epsilon)
        && straddles(side_of(p1, p2, q1), side_of(p1, p2, q2), epsilon)
}

/// Parameters `t` in `[0, 1]` along `from`–`to` where the segment touches the
/// polygon boundary at a vertex, plus both segment endpoints. Sorted.
pub fn segment_touch_params(from: Vec2, to: Vec2, vertices: &[Vec2], epsilon: f32) -> Vec<f32> {
    let mut params = vec![0.0, 1.0];
    let d = to - from;
    let len2 = d.length_squared();
    if len2 > f32::EPSILON {
        for &v in vertices {
            let t = (v - from).dot(d) / len2;
            if t > 0.0 && t < 1.0 && distance_to_segment(v, from, to) <= epsilon {
                params.push(t);
            }
        }
    }
    params.sort_by(f32::total_cmp);
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_ccw() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn centroid_of_square() {
        let c = centroid(&square_ccw());
        assert!((c.x - 5.0).abs() < 1e-5);
        assert!((c.y - 5.0).abs() < 1e-5);
    }

    #[test]
    fn winding_matches_vertex_order() {
        let ccw = square_ccw();
        let mut cw = ccw.clone();
        cw.reverse();
        assert_eq!(winding_sign(&ccw), 1.0);
        assert_eq!(winding_sign(&cw), -1.0);
        assert!(signed_area(&ccw) > 0.0);
        assert!(signed_area(&cw) < 0.0);
    }

    #[test]
    fn winding_of_deep_concave_loop_falls_back_to_area() {
        // Thin "C" whose centroid sits in the open mouth.
        let c_shape = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 9.0),
            Vec2::new(10.0, 9.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        assert_eq!(winding_sign(&c_shape), 1.0);
        let mut reversed = c_shape;
        reversed.reverse();
        assert_eq!(winding_sign(&reversed), -1.0);
    }

    #[test]
    fn contains_point_is_strict_on_boundary() {
        let sq = square_ccw();
        assert!(contains_point(&sq, Vec2::new(5.0, 5.0), GEOM_EPSILON));
        assert!(!contains_point(&sq, Vec2::new(15.0, 5.0), GEOM_EPSILON));
        assert!(!contains_point(&sq, Vec2::new(10.0, 5.0), GEOM_EPSILON));
        assert!(!contains_point(&sq, Vec2::new(0.0, 0.0), GEOM_EPSILON));
    }

    #[test]
    fn proper_crossing_only() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 10.0);
        assert!(segments_cross(a, b, Vec2::new(0.0, 10.0), Vec2::new(10.0, 0.0), GEOM_EPSILON));
        // Shared endpoint.
        assert!(!segments_cross(a, b, b, Vec2::new(20.0, 0.0), GEOM_EPSILON));
        // T-junction: q1 lies on p.
        assert!(!segments_cross(a, b, Vec2::new(5.0, 5.0), Vec2::new(5.0, 0.0), GEOM_EPSILON));
        // Collinear overlap.
        assert!(!segments_cross(a, b, Vec2::new(2.0, 2.0), Vec2::new(12.0, 12.0), GEOM_EPSILON));
    }

    #[test]
    fn touch_params_include_vertices_on_segment() {
        let sq = square_ccw();
        let params = segment_touch_params(
            Vec2::new(-10.0, -10.0),
            Vec2::new(30.0, 30.0),
            &sq,
            GEOM_EPSILON,
        );
        assert_eq!(params.len(), 4);
        assert!((params[1] - 0.25).abs() < 1e-5);
        assert!((params[2] - 0.5).abs() < 1e-5);
    }
}
