// The navigation mesh: obstacles, expanded polygons, and the visibility graph
// over their corners.
//
// `NavMesh` owns the `NavGraph` node arena, a registry of expanded polygons,
// the obstacle bodies they came from, and two spatial indices with the same
// cell size: one of node positions (neighbor candidates) and one of polygon
// bounds (occluder candidates). The raycaster decides visibility.
//
// Construction is incremental:
// 1. `add_obstacle` expands every part of a body, creates one node per
//    expanded vertex, registers nodes and polygons in the indices, prunes
//    existing edges that the new polygons now block, then `connect`s each new
//    node.
// 2. `connect` links a node to every other node within one cell that it can
//    see past the polygons overlapping that neighborhood. A node that ends up
//    with no neighbors is assumed to sit inside some expanded polygon (the
//    clearance band around a body); it is then linked to every corner of that
//    polygon's body that it can see past the body's *unexpanded* parts. That
//    fallback only considers the one containing body, so overlapping
//    concave bodies can produce edges another body would have blocked.
// 3. `remove_obstacle` deletes the body's nodes and polygons and re-runs
//    `connect` for nodes near the removed bounds so previously blocked edges
//    come back.
//
// See also: `graph.rs` for the arena, `expand.rs` for offsetting,
// `pathfinding.rs` for queries (which add transient nodes through
// `insert_transient` and remove them through `delete_node`).

use crate::config::NavConfig;
use crate::error::{NavError, NavResult};
use crate::expand::expand_obstacle;
use crate::graph::{NavGraph, NodeOwner};
use crate::obstacle::Obstacle;
use crate::types::{NodeId, ObstacleId, PolygonId};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use tracing::{debug, trace};
use waymark_geom::polygon::contains_point;
use waymark_geom::{Aabb, GridIndex, Raycaster, SegmentRaycaster, SpatialIndex, Vec2};

/// An expanded obstacle polygon registered in the mesh.
#[derive(Clone, Debug)]
pub struct NavPolygon {
    pub id: PolygonId,
    /// The body this polygon is (part of) the expansion of.
    pub obstacle: ObstacleId,
    /// Source vertices before expansion.
    pub raw: Vec<Vec2>,
    /// Expanded vertices. These are the occluders for visibility tests.
    pub vertices: Vec<Vec2>,
    /// One node per expanded vertex, in the same cyclic order.
    pub associated_nodes: Vec<NodeId>,
    pub bounds: Aabb,
}

#[derive(Clone, Debug)]
struct BodyRecord {
    obstacle: Obstacle,
    margin: f32,
    polygons: SmallVec<[PolygonId; 1]>,
}

/// Size summary of a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NavStats {
    pub nodes: usize,
    pub edges: usize,
    pub polygons: usize,
    pub obstacles: usize,
}

/// Visibility-graph navigation mesh.
///
/// The spatial indices and raycaster are injected; `NavMesh::new` wires up
/// the defaults from `waymark_geom`.
#[derive(Clone, Debug)]
pub struct NavMesh<I = GridIndex<NodeId>, P = GridIndex<PolygonId>, R = SegmentRaycaster> {
    config: NavConfig,
    graph: NavGraph,
    polygons: BTreeMap<PolygonId, NavPolygon>,
    bodies: BTreeMap<ObstacleId, BodyRecord>,
    node_index: I,
    polygon_index: P,
    raycaster: R,
    next_polygon_id: u64,
}

impl NavMesh {
    /// An empty mesh using `GridIndex` for both indices and
    /// `SegmentRaycaster` with the config's epsilon.
    pub fn new(config: NavConfig) -> NavResult<Self> {
        config.validate()?;
        let node_index = GridIndex::new(config.cell_size);
        let polygon_index = GridIndex::new(config.cell_size);
        let raycaster = SegmentRaycaster::new(config.geometry_epsilon);
        Self::with_collaborators(config, node_index, polygon_index, raycaster)
    }
}

impl<I, P, R> NavMesh<I, P, R>
where
    I: SpatialIndex<NodeId>,
    P: SpatialIndex<PolygonId>,
    R: Raycaster,
{
    /// An empty mesh over caller-supplied collaborators. Both indices must be
    /// empty and use the config's cell size.
    pub fn with_collaborators(
        config: NavConfig,
        node_index: I,
        polygon_index: P,
        raycaster: R,
    ) -> NavResult<Self> {
        config.validate()?;
        let tolerance = f32::EPSILON * config.cell_size.max(1.0);
        if (node_index.cell_size() - config.cell_size).abs() > tolerance
            || (polygon_index.cell_size() - config.cell_size).abs() > tolerance
        {
            return Err(NavError::MismatchedCellSize {
                node_cell_size: node_index.cell_size(),
                polygon_cell_size: polygon_index.cell_size(),
                config_cell_size: config.cell_size,
            });
        }
        if !node_index.is_empty() || !polygon_index.is_empty() {
            return Err(NavError::config("spatial indices must start empty"));
        }
        Ok(Self {
            config,
            graph: NavGraph::new(),
            polygons: BTreeMap::new(),
            bodies: BTreeMap::new(),
            node_index,
            polygon_index,
            raycaster,
            next_polygon_id: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn node_index(&self) -> &I {
        &self.node_index
    }

    pub fn polygon_index(&self) -> &P {
        &self.polygon_index
    }

    pub fn polygon(&self, id: PolygonId) -> Option<&NavPolygon> {
        self.polygons.get(&id)
    }

    /// All expanded polygons in id order.
    pub fn polygons(&self) -> impl Iterator<Item = &NavPolygon> {
        self.polygons.values()
    }

    pub fn contains_obstacle(&self, id: ObstacleId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.bodies.get(&id).map(|b| &b.obstacle)
    }

    /// The margin a body was expanded with.
    pub fn obstacle_margin(&self, id: ObstacleId) -> Option<f32> {
        self.bodies.get(&id).map(|b| b.margin)
    }

    /// Every corner node generated for a body, part by part.
    pub fn obstacle_nodes(&self, id: ObstacleId) -> Vec<NodeId> {
        self.bodies
            .get(&id)
            .into_iter()
            .flat_map(|b| b.polygons.iter())
            .filter_map(|p| self.polygons.get(p))
            .flat_map(|p| p.associated_nodes.iter().copied())
            .collect()
    }

    pub fn stats(&self) -> NavStats {
        NavStats {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            polygons: self.polygons.len(),
            obstacles: self.bodies.len(),
        }
    }

    /// True when each live node and each live polygon is registered exactly
    /// once in its index.
    pub fn indices_consistent(&self) -> bool {
        self.node_index.len() == self.graph.node_count()
            && self.polygon_index.len() == self.polygons.len()
    }

    // -----------------------------------------------------------------------
    // Obstacles
    // -----------------------------------------------------------------------

    /// Expand `obstacle` by `margin` and weave its corners into the graph.
    ///
    /// Re-adding a body whose id is already present is a no-op. On error
    /// (degenerate geometry, bad margin) the mesh is left untouched.
    pub fn add_obstacle(&mut self, obstacle: &Obstacle, margin: f32) -> NavResult<()> {
        if self.bodies.contains_key(&obstacle.id) {
            debug!(obstacle = %obstacle.id, "obstacle already present, ignoring");
            return Ok(());
        }
        let parts = expand_obstacle(obstacle, margin)?;

        let mut polygon_ids: SmallVec<[PolygonId; 1]> = SmallVec::new();
        let mut new_nodes = Vec::new();
        for part in parts {
            let pid = PolygonId(self.next_polygon_id);
            self.next_polygon_id += 1;
            let owner = NodeOwner::Corner {
                obstacle: obstacle.id,
                polygon: pid,
            };
            let associated_nodes: Vec<NodeId> = part
                .expanded
                .iter()
                .map(|&v| {
                    let id = self.graph.add_node(v, owner);
                    self.node_index.add_point(id, v);
                    id
                })
                .collect();
            new_nodes.extend_from_slice(&associated_nodes);
            self.polygon_index.add_body(pid, part.bounds);
            self.polygons.insert(
                pid,
                NavPolygon {
                    id: pid,
                    obstacle: obstacle.id,
                    raw: part.raw,
                    vertices: part.expanded,
                    associated_nodes,
                    bounds: part.bounds,
                },
            );
            polygon_ids.push(pid);
        }

        let pruned = self.prune_blocked_edges(&polygon_ids);
        let polygon_count = polygon_ids.len();
        self.bodies.insert(
            obstacle.id,
            BodyRecord {
                obstacle: obstacle.clone(),
                margin,
                polygons: polygon_ids,
            },
        );
        for &node in &new_nodes {
            self.connect(node);
        }

        debug!(
            obstacle = %obstacle.id,
            polygons = polygon_count,
            nodes = new_nodes.len(),
            pruned,
            "added obstacle"
        );
        Ok(())
    }

    /// Remove a body, its polygons and its corner nodes, then restore edges
    /// it used to block. Returns `false` if the body was not present.
    pub fn remove_obstacle(&mut self, id: ObstacleId) -> bool {
        let Some(record) = self.bodies.remove(&id) else {
            debug!(obstacle = %id, "obstacle not present, nothing to remove");
            return false;
        };

        let mut affected: Option<Aabb> = None;
        let mut removed_nodes = 0;
        for pid in &record.polygons {
            let Some(polygon) = self.polygons.remove(pid) else {
                continue;
            };
            self.polygon_index.remove(*pid);
            affected = Some(affected.map_or(polygon.bounds, |b| b.union(polygon.bounds)));
            for node in polygon.associated_nodes {
                if self.graph.delete_node(node).is_some() {
                    self.node_index.remove(node);
                    removed_nodes += 1;
                }
            }
        }

        let mut reconnected = 0;
        if let Some(bounds) = affected {
            let region = bounds.expanded(self.config.cell_size);
            for node in self.node_index.query(region) {
                self.connect(node);
                reconnected += 1;
            }
        }

        debug!(obstacle = %id, removed_nodes, reconnected, "removed obstacle");
        true
    }

    // -----------------------------------------------------------------------
    // Nodes and edges
    // -----------------------------------------------------------------------

    /// Link `node` to every visible node within one cell, falling back to the
    /// containing body's corners when nothing is visible. Existing edges are
    /// kept. Returns the node's resulting degree.
    pub fn connect(&mut self, node: NodeId) -> usize {
        let Some(position) = self.graph.position(node) else {
            return 0;
        };
        let radius = self.config.cell_size;
        let region = Aabb::around(position, radius);

        let links: Vec<NodeId> = {
            let occluders = self.occluders_in(region);
            self.node_index
                .query(region)
                .into_iter()
                .filter(|&c| c != node && !self.graph.has_edge(node, c))
                .filter_map(|c| self.graph.position(c).map(|p| (c, p)))
                .filter(|&(_, p)| p.distance(position) <= radius)
                .filter(|&(_, p)| !self.raycaster.segment_blocked(position, p, &occluders))
                .map(|(c, _)| c)
                .collect()
        };
        for candidate in links {
            self.graph.add_edge(node, candidate);
        }

        if self.graph.degree(node) == 0 {
            self.connect_from_inside(node, position);
        }
        self.graph.degree(node)
    }

    /// Fallback for a node that sees nothing: if it lies inside an expanded
    /// polygon, link it to the corners of that polygon's body that are
    /// visible past the body's unexpanded parts.
    fn connect_from_inside(&mut self, node: NodeId, position: Vec2) {
        let Some(container) = self.containing_polygon(position) else {
            return;
        };
        let Some(body) = self.polygons.get(&container).map(|p| p.obstacle) else {
            return;
        };
        let Some(record) = self.bodies.get(&body) else {
            return;
        };

        let links: Vec<NodeId> = {
            let parts: Vec<&NavPolygon> = record
                .polygons
                .iter()
                .filter_map(|p| self.polygons.get(p))
                .collect();
            let raw: Vec<&[Vec2]> = parts.iter().map(|p| p.raw.as_slice()).collect();
            parts
                .iter()
                .flat_map(|p| p.associated_nodes.iter().copied())
                .filter(|&t| t != node)
                .filter_map(|t| self.graph.position(t).map(|p| (t, p)))
                .filter(|&(_, p)| !self.raycaster.segment_blocked(position, p, &raw))
                .map(|(t, _)| t)
                .collect()
        };
        for target in links {
            if self.graph.add_edge(node, target) {
                trace!(%node, %target, obstacle = %body, "linked from inside clearance band");
            }
        }
    }

    /// Delete a node, unlinking it from all neighbors and removing it from
    /// the node index. Corner nodes are also dropped from their polygon's
    /// `associated_nodes`. Returns `false` for unknown ids.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.graph.delete_node(id) else {
            return false;
        };
        self.node_index.remove(id);
        let polygon = match node.owner {
            NodeOwner::Corner { polygon, .. } => self.polygons.get_mut(&polygon),
            NodeOwner::Transient => None,
        };
        if let Some(p) = polygon {
            p.associated_nodes.retain(|&n| n != id);
        }
        true
    }

    /// Add a query-scoped node at `position` and connect it.
    pub(crate) fn insert_transient(&mut self, position: Vec2) -> NodeId {
        let id = self.graph.add_node(position, NodeOwner::Transient);
        self.node_index.add_point(id, position);
        self.connect(id);
        id
    }

    /// Drop existing edges that any of `polygon_ids` now blocks. Returns the
    /// number of edges removed.
    fn prune_blocked_edges(&mut self, polygon_ids: &[PolygonId]) -> usize {
        let mut doomed: Vec<(NodeId, NodeId)> = Vec::new();
        for pid in polygon_ids {
            let Some(polygon) = self.polygons.get(pid) else {
                continue;
            };
            let occluder = [polygon.vertices.as_slice()];
            let region = polygon.bounds.expanded(self.config.cell_size);
            for id in self.node_index.query(region) {
                let Some(from) = self.graph.position(id) else {
                    continue;
                };
                for (other, _) in self.graph.neighbors(id) {
                    let Some(to) = self.graph.position(other) else {
                        continue;
                    };
                    if self.raycaster.segment_blocked(from, to, &occluder) {
                        doomed.push((id.min(other), id.max(other)));
                    }
                }
            }
        }
        doomed.sort_unstable();
        doomed.dedup();
        for &(a, b) in &doomed {
            self.graph.remove_edge(a, b);
            trace!(%a, %b, "pruned edge blocked by new obstacle");
        }
        doomed.len()
    }

    // -----------------------------------------------------------------------
    // Geometry queries
    // -----------------------------------------------------------------------

    /// Expanded polygons whose bounds share a grid bucket with `region`.
    fn occluders_in(&self, region: Aabb) -> Vec<&[Vec2]> {
        self.polygon_index
            .query(region)
            .iter()
            .filter_map(|pid| self.polygons.get(pid))
            .map(|p| p.vertices.as_slice())
            .collect()
    }

    /// The lowest-id expanded polygon strictly containing `position`.
    pub fn containing_polygon(&self, position: Vec2) -> Option<PolygonId> {
        let eps = self.config.geometry_epsilon;
        let region = Aabb::from_point(position).expanded(eps);
        self.polygon_index.query(region).into_iter().find(|pid| {
            self.polygons
                .get(pid)
                .is_some_and(|p| contains_point(&p.vertices, position, eps))
        })
    }

    /// True when the straight segment `from`–`to` crosses no expanded
    /// polygon.
    pub fn is_segment_clear(&self, from: Vec2, to: Vec2) -> bool {
        let region = Aabb::from_corners(from, to).expanded(self.config.geometry_epsilon);
        let occluders = self.occluders_in(region);
        !self.raycaster.segment_blocked(from, to, &occluders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::ObstacleShape;

    fn square_obstacle(id: u64, min: f32, size: f32) -> Obstacle {
        Obstacle::new(
            ObstacleId(id),
            ObstacleShape::rectangle(Vec2::new(min, min), Vec2::new(min + size, min + size)),
        )
    }

    fn mesh() -> NavMesh {
        NavMesh::new(NavConfig::default()).unwrap()
    }

    #[test]
    fn square_gets_four_corners_linked_around_the_sides() {
        let mut mesh = mesh();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        let stats = mesh.stats();
        assert_eq!(stats.nodes, 4);
        assert_eq!(stats.polygons, 1);
        assert_eq!(stats.obstacles, 1);
        // Four sides; both diagonals cut through the square.
        assert_eq!(stats.edges, 4);
        let nodes = mesh.obstacle_nodes(ObstacleId(1));
        assert!(!mesh.graph().has_edge(nodes[0], nodes[2]));
        assert!(!mesh.graph().has_edge(nodes[1], nodes[3]));
        assert!(mesh.graph().is_symmetric(1e-4));
        assert!(mesh.indices_consistent());
        assert_eq!(mesh.obstacle_margin(ObstacleId(1)), Some(10.0));
    }

    #[test]
    fn associated_nodes_follow_vertex_order() {
        let mut mesh = mesh();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        let polygon = mesh.polygons().next().unwrap();
        assert_eq!(polygon.associated_nodes.len(), polygon.vertices.len());
        for (node, vertex) in polygon.associated_nodes.iter().zip(&polygon.vertices) {
            assert_eq!(mesh.graph().position(*node), Some(*vertex));
        }
    }

    #[test]
    fn deleting_a_corner_detaches_it_from_its_polygon() {
        let mut mesh = mesh();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        let corners = mesh.obstacle_nodes(ObstacleId(1));
        assert!(mesh.delete_node(corners[2]));
        assert!(!mesh.delete_node(corners[2]));
        assert_eq!(
            mesh.obstacle_nodes(ObstacleId(1)),
            vec![corners[0], corners[1], corners[3]]
        );
        assert!(mesh.graph().is_symmetric(1e-4));
    }

    #[test]
    fn re_adding_is_a_no_op() {
        let mut mesh = mesh();
        let body = square_obstacle(1, 0.0, 100.0);
        mesh.add_obstacle(&body, 10.0).unwrap();
        let once = mesh.stats();
        mesh.add_obstacle(&body, 10.0).unwrap();
        assert_eq!(mesh.stats(), once);
    }

    #[test]
    fn degenerate_obstacle_leaves_mesh_untouched() {
        let mut mesh = mesh();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        let before = mesh.stats();
        let line = Obstacle::new(
            ObstacleId(2),
            ObstacleShape::simple(vec![Vec2::new(200.0, 0.0), Vec2::new(250.0, 0.0)]),
        );
        assert!(matches!(
            mesh.add_obstacle(&line, 10.0),
            Err(NavError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            mesh.add_obstacle(&square_obstacle(3, 300.0, 10.0), -2.0),
            Err(NavError::InvalidMargin { .. })
        ));
        assert_eq!(mesh.stats(), before);
        assert!(!mesh.contains_obstacle(ObstacleId(2)));
    }

    #[test]
    fn collinear_obstacle_is_rejected() {
        let mut mesh = mesh();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        let before = mesh.stats();
        let flat = Obstacle::new(
            ObstacleId(2),
            ObstacleShape::simple(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(50.0, 0.0),
                Vec2::new(100.0, 0.0),
            ]),
        );
        assert!(matches!(
            mesh.add_obstacle(&flat, 10.0),
            Err(NavError::InvalidGeometry { .. })
        ));
        assert_eq!(mesh.stats(), before);
        assert!(!mesh.contains_obstacle(ObstacleId(2)));
    }

    #[test]
    fn reshaped_body_expands_its_new_parts() {
        let mut body = square_obstacle(1, 0.0, 100.0);
        mesh().add_obstacle(&body, 10.0).unwrap();

        body.set_shape(ObstacleShape::compound(vec![
            ObstacleShape::rectangle(Vec2::new(0.0, 0.0), Vec2::new(40.0, 40.0)),
            ObstacleShape::rectangle(Vec2::new(200.0, 0.0), Vec2::new(240.0, 40.0)),
        ]));
        let mut fresh = mesh();
        fresh.add_obstacle(&body, 10.0).unwrap();
        let stats = fresh.stats();
        assert_eq!(stats.polygons, 2);
        assert_eq!(stats.nodes, 8);
    }

    #[test]
    fn nodes_farther_than_one_cell_stay_unlinked() {
        let config = NavConfig {
            cell_size: 50.0,
            ..NavConfig::default()
        };
        let mut mesh = NavMesh::new(config).unwrap();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        // Sides are ~114 long, beyond the 50-unit neighbor radius.
        assert_eq!(mesh.stats().edges, 0);
    }

    #[test]
    fn new_obstacle_prunes_edges_it_blocks() {
        let mut mesh = mesh();
        // Two squares side by side; their facing corners see each other.
        mesh.add_obstacle(&square_obstacle(1, 0.0, 40.0), 5.0).unwrap();
        mesh.add_obstacle(&square_obstacle(2, 120.0, 40.0), 5.0).unwrap();
        let left = mesh.obstacle_nodes(ObstacleId(1));
        let right = mesh.obstacle_nodes(ObstacleId(2));
        // left[1] is the bottom-right corner, right[0] the bottom-left.
        assert!(mesh.graph().has_edge(left[1], right[0]));

        // A wall between them blocks every cross link.
        let wall = Obstacle::new(
            ObstacleId(3),
            ObstacleShape::rectangle(Vec2::new(75.0, -200.0), Vec2::new(85.0, 240.0)),
        );
        mesh.add_obstacle(&wall, 5.0).unwrap();
        for &l in &left {
            for &r in &right {
                assert!(!mesh.graph().has_edge(l, r), "{l} still linked to {r}");
            }
        }
        assert!(mesh.graph().is_symmetric(1e-4));

        // Removing the wall restores them.
        assert!(mesh.remove_obstacle(ObstacleId(3)));
        assert!(mesh.graph().has_edge(left[1], right[0]));
        assert!(mesh.indices_consistent());
    }

    #[test]
    fn remove_obstacle_cleans_up_and_is_idempotent() {
        let mut mesh = mesh();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        mesh.add_obstacle(&square_obstacle(2, 200.0, 50.0), 10.0).unwrap();
        assert!(mesh.remove_obstacle(ObstacleId(1)));
        assert!(!mesh.remove_obstacle(ObstacleId(1)));
        let stats = mesh.stats();
        assert_eq!(stats.obstacles, 1);
        assert_eq!(stats.polygons, 1);
        assert_eq!(stats.nodes, 4);
        assert!(mesh.indices_consistent());
        assert!(mesh.graph().is_symmetric(1e-4));
        for node in mesh.graph().iter() {
            assert!(matches!(
                node.owner,
                NodeOwner::Corner { obstacle: ObstacleId(2), .. }
            ));
        }
    }

    #[test]
    fn compound_parts_share_the_body() {
        let mut mesh = mesh();
        let body = Obstacle::new(
            ObstacleId(7),
            ObstacleShape::compound(vec![
                ObstacleShape::rectangle(Vec2::new(0.0, 0.0), Vec2::new(20.0, 60.0)),
                ObstacleShape::rectangle(Vec2::new(20.0, 0.0), Vec2::new(60.0, 20.0)),
            ]),
        );
        mesh.add_obstacle(&body, 4.0).unwrap();
        assert_eq!(mesh.stats().polygons, 2);
        assert_eq!(mesh.obstacle_nodes(ObstacleId(7)).len(), 8);
        assert!(mesh.polygons().all(|p| p.obstacle == ObstacleId(7)));
    }

    #[test]
    fn node_in_clearance_band_falls_back_to_body_corners() {
        let mut mesh = mesh();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        // Just below the bottom edge, inside the expanded square.
        let inside = Vec2::new(50.0, -3.0);
        assert!(mesh.containing_polygon(inside).is_some());
        let id = mesh.insert_transient(inside);
        let corners = mesh.obstacle_nodes(ObstacleId(1));
        let linked: Vec<NodeId> = mesh.graph().neighbors(id).map(|(n, _)| n).collect();
        // Only the two bottom corners are visible past the raw square.
        assert_eq!(linked, vec![corners[0], corners[1]]);
        assert!(mesh.delete_node(id));
        assert_eq!(mesh.stats().edges, 4);
        assert!(mesh.indices_consistent());
    }

    #[test]
    fn node_inside_raw_body_gets_no_links() {
        let mut mesh = mesh();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        let id = mesh.insert_transient(Vec2::new(50.0, 50.0));
        assert_eq!(mesh.graph().degree(id), 0);
        mesh.delete_node(id);
    }

    #[test]
    fn mismatched_cell_sizes_are_rejected() {
        let config = NavConfig::default();
        let result = NavMesh::with_collaborators(
            config,
            GridIndex::<NodeId>::new(64.0),
            GridIndex::<PolygonId>::new(256.0),
            SegmentRaycaster::default(),
        );
        assert!(matches!(result, Err(NavError::MismatchedCellSize { .. })));
    }

    #[test]
    fn segment_clearance_queries() {
        let mut mesh = mesh();
        mesh.add_obstacle(&square_obstacle(1, 0.0, 100.0), 10.0).unwrap();
        assert!(!mesh.is_segment_clear(Vec2::new(-50.0, 50.0), Vec2::new(150.0, 50.0)));
        assert!(mesh.is_segment_clear(Vec2::new(-50.0, -50.0), Vec2::new(150.0, -50.0)));
        assert!(mesh.containing_polygon(Vec2::new(200.0, 200.0)).is_none());
    }
}
