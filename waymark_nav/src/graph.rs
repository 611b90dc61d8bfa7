// Navigation graph node arena.
//
// The graph is a set of `GraphNode`s (positions) joined by undirected,
// Euclidean-weighted edges. Each node stores its adjacency inline as two
// index-aligned lists, `neighbors[i]` <-> `neighbor_distances[i]`, and every
// edge is recorded on both endpoints.
//
// Nodes live in a `BTreeMap` keyed by `NodeId` so iteration order is the id
// order, and ids come from a monotonic counter that never reuses a value.
// Other structures (polygons, search scratch, spatial indices) hold `NodeId`s
// only, never references, so deleting a node can never leave a dangling
// borrow; at worst a stale id that misses.
//
// The graph knows nothing about obstacles or visibility; `navmesh.rs` decides
// which edges exist, `pathfinding.rs` searches them.
//
// **Critical constraint: symmetry.** `add_edge`, `remove_edge` and
// `delete_node` are the only mutators of adjacency, and each updates both
// endpoints. `is_symmetric` checks the invariant.

use crate::types::{NodeId, ObstacleId, PolygonId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use waymark_geom::Vec2;

/// Why a node exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeOwner {
    /// An offset corner of an expanded obstacle polygon.
    Corner {
        obstacle: ObstacleId,
        polygon: PolygonId,
    },
    /// A start/end point living only for the duration of one path query.
    Transient,
}

/// A vertex of the navigation graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub position: Vec2,
    pub owner: NodeOwner,
    /// Adjacent nodes, in the order the edges were added. No duplicates.
    pub neighbors: SmallVec<[NodeId; 8]>,
    /// Edge lengths, index-aligned with `neighbors`.
    pub neighbor_distances: SmallVec<[f32; 8]>,
}

impl GraphNode {
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_transient(&self) -> bool {
        self.owner == NodeOwner::Transient
    }

    fn link(&mut self, other: NodeId, distance: f32) {
        self.neighbors.push(other);
        self.neighbor_distances.push(distance);
    }

    fn unlink(&mut self, other: NodeId) -> bool {
        match self.neighbors.iter().position(|&n| n == other) {
            Some(i) => {
                self.neighbors.remove(i);
                self.neighbor_distances.remove(i);
                true
            }
            None => false,
        }
    }
}

/// The navigation graph container.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavGraph {
    nodes: BTreeMap<NodeId, GraphNode>,
    next_id: u64,
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unconnected node. Returns its fresh id.
    pub fn add_node(&mut self, position: Vec2, owner: NodeOwner) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            GraphNode {
                id,
                position,
                owner,
                neighbors: SmallVec::new(),
                neighbor_distances: SmallVec::new(),
            },
        );
        id
    }

    /// Add an undirected edge weighted by Euclidean distance.
    ///
    /// Returns `false` (and changes nothing) for self-loops, unknown ids, or
    /// an edge that already exists.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b || self.has_edge(a, b) {
            return false;
        }
        let (Some(pa), Some(pb)) = (self.position(a), self.position(b)) else {
            return false;
        };
        let distance = pa.distance(pb);
        if let Some(node) = self.nodes.get_mut(&a) {
            node.link(b, distance);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.link(a, distance);
        }
        true
    }

    /// Remove the edge between `a` and `b` from both endpoints.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        let removed_a = self.nodes.get_mut(&a).is_some_and(|n| n.unlink(b));
        let removed_b = self.nodes.get_mut(&b).is_some_and(|n| n.unlink(a));
        removed_a || removed_b
    }

    /// Remove a node, first unlinking it from every neighbor.
    pub fn delete_node(&mut self, id: NodeId) -> Option<GraphNode> {
        let node = self.nodes.remove(&id)?;
        for neighbor in &node.neighbors {
            if let Some(other) = self.nodes.get_mut(neighbor) {
                other.unlink(id);
            }
        }
        Some(node)
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.nodes
            .get(&a)
            .is_some_and(|n| n.neighbors.contains(&b))
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        self.nodes.get(&id).map(|n| n.position)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of neighbors, zero for unknown ids.
    pub fn degree(&self, id: NodeId) -> usize {
        self.nodes.get(&id).map_or(0, GraphNode::degree)
    }

    /// `(neighbor, edge length)` pairs of a node, in insertion order.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, f32)> + '_ {
        self.nodes.get(&id).into_iter().flat_map(|n| {
            n.neighbors
                .iter()
                .copied()
                .zip(n.neighbor_distances.iter().copied())
        })
    }

    /// All nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(GraphNode::degree).sum::<usize>() / 2
    }

    /// Find the nearest node to a position (Euclidean). Ties go to the lower
    /// id. Returns `None` if the graph is empty.
    pub fn find_nearest_node(&self, pos: Vec2) -> Option<NodeId> {
        self.nodes
            .values()
            .min_by(|a, b| {
                a.position
                    .distance(pos)
                    .total_cmp(&b.position.distance(pos))
                    .then(a.id.cmp(&b.id))
            })
            .map(|n| n.id)
    }

    /// Check that every edge is recorded on both endpoints with the same
    /// length (within `tolerance`), that adjacency lists are index-aligned,
    /// and that no node lists a neighbor twice or links to a missing node.
    pub fn is_symmetric(&self, tolerance: f32) -> bool {
        self.nodes.values().all(|node| {
            if node.neighbors.len() != node.neighbor_distances.len() {
                return false;
            }
            node.neighbors.iter().enumerate().all(|(i, other_id)| {
                if node.neighbors[..i].contains(other_id) {
                    return false;
                }
                let Some(other) = self.nodes.get(other_id) else {
                    return false;
                };
                match other.neighbors.iter().position(|&n| n == node.id) {
                    Some(j) => {
                        (other.neighbor_distances[j] - node.neighbor_distances[i]).abs() <= tolerance
                    }
                    None => false,
                }
            })
        })
    }
}
