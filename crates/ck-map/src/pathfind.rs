//! Shortest-path search over a [`MapIndex`].
//!
//! Generalizes `dt-spatial::router::dijkstra` from CSR edge arrays with
//! mode-dependent millisecond costs to the Map Index's adjacency list with
//! uniform edge cost 1 and a `walkable` filter. Same min-heap shape, same
//! stale-entry skip, same deterministic tie-break — only the cost model and
//! the identity of "node" changed.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::index::{CellKey, MapIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub path: Vec<CellKey>,
    pub cost: u64,
}

/// Find the shortest path from `from` to `to`, treating every edge as cost
/// 1 and excluding any cell with `walkable == false` (endpoints included).
///
/// Returns `None` when unreachable or when either endpoint is unwalkable or
/// unregistered — this function never raises.
pub fn find_path(index: &MapIndex, from: CellKey, to: CellKey) -> Option<PathResult> {
    if index.order_of(from).is_none() || index.order_of(to).is_none() {
        return None;
    }
    if !index.is_walkable(from) || !index.is_walkable(to) {
        return None;
    }
    if from == to {
        return Some(PathResult { path: vec![from], cost: 0 });
    }

    let mut dist: HashMap<CellKey, u64> = HashMap::new();
    let mut prev: HashMap<CellKey, CellKey> = HashMap::new();
    dist.insert(from, 0);

    // Min-heap keyed on (cost, insertion order). Insertion order is unique
    // per cell, so it alone suffices as the tie-break key without needing
    // an `Ord` impl on `CellKey`.
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
    heap.push(Reverse((0, index.order_of(from).expect("checked above"))));

    while let Some(Reverse((cost, order))) = heap.pop() {
        let cell = index.cell_at(order);
        if cell == to {
            return Some(reconstruct(prev, from, to, cost));
        }
        if cost > *dist.get(&cell).unwrap_or(&u64::MAX) {
            continue;
        }
        for neighbor in index.get_neighbors(cell) {
            if !index.is_walkable(neighbor) {
                continue;
            }
            let Some(neighbor_order) = index.order_of(neighbor) else { continue };
            let new_cost = cost + 1;
            if new_cost < *dist.get(&neighbor).unwrap_or(&u64::MAX) {
                dist.insert(neighbor, new_cost);
                prev.insert(neighbor, cell);
                heap.push(Reverse((new_cost, neighbor_order)));
            }
        }
    }
    None
}

fn reconstruct(
    prev: HashMap<CellKey, CellKey>,
    from: CellKey,
    to: CellKey,
    cost: u64,
) -> PathResult {
    let mut path = vec![to];
    let mut cur = to;
    while cur != from {
        cur = prev[&cur];
        path.push(cur);
    }
    path.reverse();
    PathResult { path, cost }
}
