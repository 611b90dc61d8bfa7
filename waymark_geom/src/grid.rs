// Uniform-grid spatial index.
//
// `GridIndex` buckets keys by the grid cells their position or bounds
// overlap. A point occupies one cell; a body occupies every cell its bounding
// box touches. Each key has exactly one registration in `entries`, so
// re-adding a key moves it instead of duplicating it.
//
// A body spanning more than `MAX_BODY_CELLS` cells is not bucketed at all.
// It is kept in a side list with its bounds and tested by bounds overlap on
// every query, so one huge obstacle costs O(1) memory instead of one bucket
// entry per cell.
//
// The navmesh keeps two of these with the same cell size: one for node
// positions (neighbor candidates) and one for expanded-polygon bounds
// (occluder candidates). If the cell sizes differ, neighbor-radius queries
// silently miss candidates, which is why `SpatialIndex` exposes `cell_size()`
// for the owner to check.
//
// See also: `raycast.rs` for the occlusion test run over query results,
// `waymark_nav::navmesh` for the owner of both indices.

use crate::types::{Aabb, Vec2};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::hash::Hash;

/// Integer grid cell coordinate.
pub type CellKey = (i32, i32);

/// The contract the navmesh needs from a spatial index.
pub trait SpatialIndex<K> {
    /// Edge length of one grid cell in world units.
    fn cell_size(&self) -> f32;

    /// Register `key` at a single position, replacing any prior registration.
    fn add_point(&mut self, key: K, position: Vec2);

    /// Register `key` over a bounding box, replacing any prior registration.
    fn add_body(&mut self, key: K, bounds: Aabb);

    /// Remove `key`. Returns `false` if it was not registered.
    fn remove(&mut self, key: K) -> bool;

    /// All keys in buckets overlapping `bounds`, deduplicated and sorted.
    /// This is a coarse filter: results may lie outside `bounds` but within
    /// an overlapping cell.
    fn query(&self, bounds: Aabb) -> Vec<K>;

    /// Number of registered keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bodies covering more cells than this are kept out of the buckets.
pub const MAX_BODY_CELLS: u64 = 4096;

/// Inclusive range of cells a key is registered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CellSpan {
    min: CellKey,
    max: CellKey,
}

impl CellSpan {
    fn cells(self) -> impl Iterator<Item = CellKey> {
        (self.min.0..=self.max.0).flat_map(move |x| (self.min.1..=self.max.1).map(move |y| (x, y)))
    }

    fn cell_count(self) -> u64 {
        let w = (self.max.0 as i64 - self.min.0 as i64 + 1).max(0) as u64;
        let h = (self.max.1 as i64 - self.min.1 as i64 + 1).max(0) as u64;
        w.saturating_mul(h)
    }

    fn contains(self, cell: CellKey) -> bool {
        cell.0 >= self.min.0 && cell.0 <= self.max.0 && cell.1 >= self.min.1 && cell.1 <= self.max.1
    }
}

/// Where a key is registered.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Registration {
    Cells(CellSpan),
    Oversized(Aabb),
}

/// Uniform bucket grid keyed by `(floor(x / cell), floor(y / cell))`.
#[derive(Clone, Debug)]
pub struct GridIndex<K> {
    cell_size: f32,
    buckets: FxHashMap<CellKey, SmallVec<[K; 4]>>,
    entries: FxHashMap<K, Registration>,
    /// Keys registered as `Registration::Oversized`, in ascending order.
    oversized: Vec<K>,
}

impl<K: Copy + Eq + Hash + Ord> GridIndex<K> {
    /// Create an empty grid. `cell_size` must be positive and finite; callers
    /// validate it (see `NavConfig::validate`).
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size.is_finite() && cell_size > 0.0);
        Self {
            cell_size,
            buckets: FxHashMap::default(),
            entries: FxHashMap::default(),
            oversized: Vec::new(),
        }
    }

    /// The cell containing `p`.
    pub fn cell_of(&self, p: Vec2) -> CellKey {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    fn span_of(&self, bounds: Aabb) -> CellSpan {
        CellSpan {
            min: self.cell_of(bounds.min),
            max: self.cell_of(bounds.max),
        }
    }

    /// Occupied cells overlapping `bounds`, in ascending cell order.
    pub fn buckets_overlapping(&self, bounds: Aabb) -> Vec<CellKey> {
        let span = self.span_of(bounds);
        let mut cells: Vec<CellKey> = if span.cell_count() > self.buckets.len() as u64 {
            // Huge query relative to occupancy: scan what exists instead.
            self.buckets.keys().copied().filter(|&c| span.contains(c)).collect()
        } else {
            span.cells().filter(|c| self.buckets.contains_key(c)).collect()
        };
        cells.sort_unstable();
        cells
    }

    /// Keys registered in one cell. Empty for unoccupied cells.
    pub fn bucket(&self, cell: CellKey) -> &[K] {
        match self.buckets.get(&cell) {
            Some(bucket) => bucket.as_slice(),
            None => &[],
        }
    }

    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of bodies held outside the buckets.
    pub fn oversized_len(&self) -> usize {
        self.oversized.len()
    }

    fn insert_span(&mut self, key: K, span: CellSpan) {
        self.remove_key(key);
        for cell in span.cells() {
            self.buckets.entry(cell).or_default().push(key);
        }
        self.entries.insert(key, Registration::Cells(span));
    }

    fn insert_oversized(&mut self, key: K, bounds: Aabb) {
        self.remove_key(key);
        let at = self.oversized.partition_point(|k| *k < key);
        self.oversized.insert(at, key);
        self.entries.insert(key, Registration::Oversized(bounds));
    }

    fn remove_key(&mut self, key: K) -> bool {
        let span = match self.entries.remove(&key) {
            None => return false,
            Some(Registration::Oversized(_)) => {
                self.oversized.retain(|k| *k != key);
                return true;
            }
            Some(Registration::Cells(span)) => span,
        };
        for cell in span.cells() {
            if let Some(bucket) = self.buckets.get_mut(&cell) {
                bucket.retain(|k| *k != key);
                if bucket.is_empty() {
                    self.buckets.remove(&cell);
                }
            }
        }
        true
    }
}

impl<K: Copy + Eq + Hash + Ord> SpatialIndex<K> for GridIndex<K> {
    fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn add_point(&mut self, key: K, position: Vec2) {
        let cell = self.cell_of(position);
        self.insert_span(key, CellSpan { min: cell, max: cell });
    }

    fn add_body(&mut self, key: K, bounds: Aabb) {
        let span = self.span_of(bounds);
        if span.cell_count() > MAX_BODY_CELLS {
            self.insert_oversized(key, bounds);
        } else {
            self.insert_span(key, span);
        }
    }

    fn remove(&mut self, key: K) -> bool {
        self.remove_key(key)
    }

    fn query(&self, bounds: Aabb) -> Vec<K> {
        let mut keys: Vec<K> = Vec::new();
        for cell in self.buckets_overlapping(bounds) {
            keys.extend_from_slice(self.bucket(cell));
        }
        keys.extend(self.oversized.iter().copied().filter(|k| {
            matches!(self.entries.get(k), Some(Registration::Oversized(b)) if b.intersects(bounds))
        }));
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
