//! `MapIndex` — cells, adjacency, per-cell metadata, and the reverse
//! position index.
//!
//! Generalizes `dt-spatial::RoadNetwork`'s CSR adjacency (fixed at build
//! time, indexed by dense `NodeId`) to an explicit, mutable-at-runtime
//! neighbor list keyed by a topology-specific coordinate tuple, because
//! cells here are added one at a time by worldgen rather than bulk-loaded
//! from a single OSM pass.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ck_core::{EntityId, Value};

/// Map topology, fixed at construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    Square,
    Hex,
}

/// A topology-specific cell coordinate.
///
/// `Square` cells use `(x,y,z)`; `Hex` cells use `(q,r,z)`. Both variants
/// coexist in the type so callers never have to thread a separate key type
/// through per topology, the way `Position`'s schema uses an externally
/// tagged union for the same reason.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CellKey {
    Square { x: i64, y: i64, z: i64 },
    Hex { q: i64, r: i64, z: i64 },
}

#[derive(Clone)]
struct CellRecord {
    /// Index into `insertion_order`; used as the Pathfinder's tie-break key.
    order: usize,
    neighbors: Vec<CellKey>,
    metadata: BTreeMap<String, Value>,
}

#[derive(Clone, Default)]
pub struct MapIndex {
    topology: Option<Topology>,
    cells: HashMap<CellKey, CellRecord>,
    insertion_order: Vec<CellKey>,
    reverse_index: HashMap<CellKey, BTreeSet<EntityId>>,
    entity_cell: HashMap<EntityId, CellKey>,
}

impl MapIndex {
    pub fn new(topology: Topology) -> Self {
        Self { topology: Some(topology), ..Self::default() }
    }

    /// Register `key` as a cell if it is not already present. A no-op for
    /// a key that already exists — callers may `add_cell` idempotently.
    pub fn add_cell(&mut self, key: CellKey) {
        if self.cells.contains_key(&key) {
            return;
        }
        let order = self.insertion_order.len();
        self.insertion_order.push(key);
        self.cells.insert(key, CellRecord { order, neighbors: Vec::new(), metadata: BTreeMap::new() });
    }

    /// Register a directed neighbor link `a -> b`. This adds only the
    /// specified direction; callers that want a symmetric link call this
    /// twice.
    pub fn add_neighbor(&mut self, a: CellKey, b: CellKey) {
        if let Some(record) = self.cells.get_mut(&a) {
            if !record.neighbors.contains(&b) {
                record.neighbors.push(b);
            }
        }
    }

    /// Replace `key`'s metadata map wholesale.
    pub fn set_cell_metadata(&mut self, key: CellKey, metadata: BTreeMap<String, Value>) {
        if let Some(record) = self.cells.get_mut(&key) {
            record.metadata = metadata;
        }
    }

    pub fn get_cell_metadata(&self, key: CellKey) -> Option<&BTreeMap<String, Value>> {
        self.cells.get(&key).map(|record| &record.metadata)
    }

    /// Set a single metadata field on `key`, leaving the rest of its
    /// metadata untouched — the merge a map postprocessor typically wants,
    /// as opposed to `set_cell_metadata`'s wholesale replace.
    pub fn set_cell_metadata_field(&mut self, key: CellKey, field: impl Into<String>, value: Value) {
        if let Some(record) = self.cells.get_mut(&key) {
            record.metadata.insert(field.into(), value);
        }
    }

    pub fn get_neighbors(&self, key: CellKey) -> Vec<CellKey> {
        self.cells.get(&key).map(|record| record.neighbors.clone()).unwrap_or_default()
    }

    pub fn topology_type(&self) -> Option<Topology> {
        self.topology
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// All registered cells, in the order they were added — the order the
    /// Pathfinder uses to break ties between equal-cost paths.
    pub fn all_cells(&self) -> Vec<CellKey> {
        self.insertion_order.clone()
    }

    pub fn entities_in_cell(&self, key: CellKey) -> Vec<EntityId> {
        self.reverse_index.get(&key).map(|set| set.iter().copied().collect()).unwrap_or_default()
    }

    /// `walkable` defaults to `true` when absent from a cell's metadata, or
    /// when the cell itself is unregistered.
    pub fn is_walkable(&self, key: CellKey) -> bool {
        self.cells
            .get(&key)
            .and_then(|record| record.metadata.get("walkable"))
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Record that `entity`'s `Position` now resolves to `cell`, removing
    /// any prior reverse-index entry for that entity first. Called from the
    /// Position post-hook so the reverse index stays consistent with every
    /// component write.
    pub fn set_entity_position(&mut self, entity: EntityId, cell: CellKey) {
        self.clear_entity_position(entity);
        self.reverse_index.entry(cell).or_default().insert(entity);
        self.entity_cell.insert(entity, cell);
    }

    /// Drop `entity` from whichever cell it currently occupies, if any.
    pub fn clear_entity_position(&mut self, entity: EntityId) {
        if let Some(cell) = self.entity_cell.remove(&entity) {
            if let Some(set) = self.reverse_index.get_mut(&cell) {
                set.remove(&entity);
            }
        }
    }

    pub(crate) fn order_of(&self, key: CellKey) -> Option<usize> {
        self.cells.get(&key).map(|record| record.order)
    }

    pub(crate) fn cell_at(&self, order: usize) -> CellKey {
        self.insertion_order[order]
    }
}
