// A* path queries over the visibility graph.
//
// A query inserts two transient nodes (end first, then start) through
// `NavMesh::insert_transient`, searches between them, and deletes them again
// on every exit path, so the graph a caller sees before and after a query is
// identical.
//
// Per-search state never lives on the graph nodes. `SearchScratch` maps each
// touched `NodeId` to its `ScratchEntry` (cost so far, estimated total,
// parent) and keeps the closed set; it is created per query and dropped with
// it. A node with no scratch entry has never been reached.
//
// The open set is a `BinaryHeap` min-heap via reversed ordering with lazy
// deletion: improving a node pushes a fresh entry, and stale entries are
// skipped when popped because their node is already closed. Ties on estimated
// total break on the lower `NodeId`.
//
// The heuristic is straight-line distance to the goal, admissible because
// edge costs are straight-line distances too.
//
// See also: `graph.rs` for the searched arena, `navmesh.rs` for transient
// node insertion.
//
// **Critical constraint: determinism.** Given the same mesh and endpoints, a
// query returns the same waypoints. No hash-order iteration reaches the
// output; neighbor lists and heap ties are ordered.

use crate::graph::NavGraph;
use crate::navmesh::NavMesh;
use crate::types::{NodeId, PolygonId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, warn};
use waymark_geom::{Raycaster, SpatialIndex, Vec2};

/// Search bookkeeping for one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScratchEntry {
    pub cost_so_far: f32,
    /// `cost_so_far` plus the heuristic to the goal.
    pub heuristic_total: f32,
    pub parent: Option<NodeId>,
}

/// Query-scoped search state, keyed by node.
#[derive(Clone, Debug, Default)]
pub struct SearchScratch {
    entries: FxHashMap<NodeId, ScratchEntry>,
    closed: FxHashSet<NodeId>,
}

impl SearchScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `node` as the search origin.
    pub fn seed(&mut self, node: NodeId, heuristic: f32) {
        self.entries.insert(
            node,
            ScratchEntry {
                cost_so_far: 0.0,
                heuristic_total: heuristic,
                parent: None,
            },
        );
    }

    pub fn entry(&self, node: NodeId) -> Option<&ScratchEntry> {
        self.entries.get(&node)
    }

    /// Mark `node` closed. Returns `false` if it already was.
    pub fn close(&mut self, node: NodeId) -> bool {
        self.closed.insert(node)
    }

    pub fn is_closed(&self, node: NodeId) -> bool {
        self.closed.contains(&node)
    }

    /// Number of nodes the search has reached.
    pub fn touched(&self) -> usize {
        self.entries.len()
    }

    /// Follow parents back from `goal`. The result runs origin first.
    pub fn reconstruct(&self, goal: NodeId) -> Vec<NodeId> {
        let mut nodes = vec![goal];
        let mut current = goal;
        while let Some(parent) = self.entries.get(&current).and_then(|e| e.parent) {
            // Parents form a tree; this only trips on corrupted scratch.
            if nodes.len() > self.entries.len() {
                break;
            }
            nodes.push(parent);
            current = parent;
        }
        nodes.reverse();
        nodes
    }
}

/// Relax every open neighbor of `node` towards a goal at `end`.
///
/// A neighbor is updated when it has no scratch entry yet or the route
/// through `node` is strictly cheaper than its recorded cost. Closed
/// neighbors are skipped. Returns the updated neighbors in adjacency order.
pub fn relax_neighbors(
    graph: &NavGraph,
    scratch: &mut SearchScratch,
    node: NodeId,
    end: Vec2,
) -> SmallVec<[NodeId; 8]> {
    let mut updated = SmallVec::new();
    let Some(current) = scratch.entry(node).copied() else {
        return updated;
    };
    for (neighbor, distance) in graph.neighbors(node) {
        if scratch.is_closed(neighbor) {
            continue;
        }
        let tentative = current.cost_so_far + distance;
        let improves = scratch
            .entry(neighbor)
            .is_none_or(|e| tentative < e.cost_so_far);
        if !improves {
            continue;
        }
        let Some(position) = graph.position(neighbor) else {
            continue;
        };
        scratch.entries.insert(
            neighbor,
            ScratchEntry {
                cost_so_far: tentative,
                heuristic_total: tentative + position.distance(end),
                parent: Some(node),
            },
        );
        updated.push(neighbor);
    }
    updated
}

/// A node waiting in the open set with its estimated total cost.
#[derive(Clone, Copy, Debug)]
struct Frontier {
    estimate: f32,
    node: NodeId,
}

impl Frontier {
    /// Search order: lower estimate first, then lower node id.
    fn priority(&self, other: &Self) -> Ordering {
        self.estimate
            .total_cmp(&other.estimate)
            .then(self.node.cmp(&other.node))
    }
}

// `BinaryHeap` pops its maximum, so the heap order is search order reversed.
impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority(other).reverse()
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.priority(other).is_eq()
    }
}

impl Eq for Frontier {}

/// How a graph search ended.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    Found {
        /// Start to goal, inclusive.
        nodes: Vec<NodeId>,
        cost: f32,
        expansions: usize,
    },
    /// The open set ran dry; the goal is not connected to the start.
    Exhausted { expansions: usize },
    /// `max_expansions` nodes were expanded without reaching the goal.
    BudgetExceeded { expansions: usize },
}

/// A* from `start` to `goal`, expanding at most `max_expansions` nodes.
pub fn astar(
    graph: &NavGraph,
    start: NodeId,
    goal: NodeId,
    max_expansions: usize,
) -> SearchOutcome {
    let (Some(start_pos), Some(goal_pos)) = (graph.position(start), graph.position(goal)) else {
        return SearchOutcome::Exhausted { expansions: 0 };
    };

    let mut scratch = SearchScratch::new();
    scratch.seed(start, start_pos.distance(goal_pos));

    let mut open = BinaryHeap::new();
    open.push(Frontier {
        estimate: start_pos.distance(goal_pos),
        node: start,
    });

    let mut expansions = 0;
    while let Some(current) = open.pop() {
        if current.node == goal {
            let cost = scratch.entry(goal).map_or(0.0, |e| e.cost_so_far);
            return SearchOutcome::Found {
                nodes: scratch.reconstruct(goal),
                cost,
                expansions,
            };
        }
        if scratch.is_closed(current.node) {
            continue;
        }
        if expansions >= max_expansions {
            return SearchOutcome::BudgetExceeded { expansions };
        }
        scratch.close(current.node);
        expansions += 1;

        for neighbor in relax_neighbors(graph, &mut scratch, current.node, goal_pos) {
            if let Some(entry) = scratch.entry(neighbor) {
                open.push(Frontier {
                    estimate: entry.heuristic_total,
                    node: neighbor,
                });
            }
        }
    }

    SearchOutcome::Exhausted { expansions }
}

/// A found route through the mesh.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavPath {
    /// Start, intermediate corners, end.
    pub waypoints: Vec<Vec2>,
    /// Sum of the straight legs between waypoints.
    pub length: f32,
    /// Nodes the search expanded.
    pub expansions: usize,
}

impl NavPath {
    pub fn from_waypoints(waypoints: Vec<Vec2>, expansions: usize) -> Self {
        let length = waypoints.windows(2).map(|w| w[0].distance(w[1])).sum();
        Self {
            waypoints,
            length,
            expansions,
        }
    }
}

/// Result of `NavMesh::query_path`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PathOutcome {
    Found(NavPath),
    /// No route connects the endpoints (including a start with no usable
    /// edges, e.g. inside an obstacle).
    Unreachable,
    /// The search gave up after the configured expansion budget.
    BudgetExceeded { expansions: usize },
}

impl PathOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn path(&self) -> Option<&NavPath> {
        match self {
            Self::Found(path) => Some(path),
            _ => None,
        }
    }

    /// Waypoints of a found path; empty otherwise.
    pub fn into_waypoints(self) -> Vec<Vec2> {
        match self {
            Self::Found(path) => path.waypoints,
            _ => Vec::new(),
        }
    }
}

impl<I, P, R> NavMesh<I, P, R>
where
    I: SpatialIndex<NodeId>,
    P: SpatialIndex<PolygonId>,
    R: Raycaster,
{
    /// Shortest route from `start` to `end` as a list of waypoints, or an
    /// empty list when there is none (or the search budget ran out).
    pub fn find_path(&mut self, start: Vec2, end: Vec2) -> Vec<Vec2> {
        self.query_path(start, end).into_waypoints()
    }

    /// Like `find_path`, but says why no path was returned.
    ///
    /// The mesh is mutated during the query (two transient nodes and their
    /// edges) and restored before returning.
    pub fn query_path(&mut self, start: Vec2, end: Vec2) -> PathOutcome {
        if !(start.is_finite() && end.is_finite()) {
            debug!(%start, %end, "non-finite query endpoint");
            return PathOutcome::Unreachable;
        }

        let end_node = self.insert_transient(end);
        let start_node = self.insert_transient(start);

        let outcome = if self.graph().degree(start_node) == 0 {
            PathOutcome::Unreachable
        } else {
            match astar(
                self.graph(),
                start_node,
                end_node,
                self.config().max_expansions,
            ) {
                SearchOutcome::Found {
                    nodes, expansions, ..
                } => {
                    let waypoints = nodes
                        .iter()
                        .filter_map(|&n| self.graph().position(n))
                        .collect();
                    PathOutcome::Found(NavPath::from_waypoints(waypoints, expansions))
                }
                SearchOutcome::Exhausted { .. } => PathOutcome::Unreachable,
                SearchOutcome::BudgetExceeded { expansions } => {
                    warn!(%start, %end, expansions, "path search exceeded its expansion budget");
                    PathOutcome::BudgetExceeded { expansions }
                }
            }
        };

        self.delete_node(start_node);
        self.delete_node(end_node);

        match outcome {
            PathOutcome::Found(path) if self.config().smooth_paths => {
                PathOutcome::Found(self.smooth_path(&path))
            }
            other => {
                debug!(%start, %end, found = other.is_found(), "path query finished");
                other
            }
        }
    }

    /// Drop waypoints that an earlier waypoint can see past directly
    /// (greedy string pulling). Endpoints are kept.
    pub fn smooth_path(&self, path: &NavPath) -> NavPath {
        let w = &path.waypoints;
        if w.len() <= 2 {
            return path.clone();
        }
        let last = w.len() - 1;
        let mut out = vec![w[0]];
        let mut i = 0;
        while i < last {
            let mut j = last;
            while j > i + 1 && !self.is_segment_clear(w[i], w[j]) {
                j -= 1;
            }
            out.push(w[j]);
            i = j;
        }
        NavPath::from_waypoints(out, path.expansions)
    }
}
