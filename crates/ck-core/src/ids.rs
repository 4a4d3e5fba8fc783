//! The opaque entity identifier shared by every crate in the kernel.
//!
//! Jobs and agents are ordinary entities — no separate `JobId`/`AgentId`
//! type — so `EntityId` is the only identifier wrapper in the kernel,
//! unlike `dt-core::ids`, which has one typed
//! wrapper per SoA array (`AgentId`, `NodeId`, `EdgeId`...). The recycling
//! behavior below follows the same "typed, zero-cost wrapper" idiom as
//! `dt-core::ids::typed_id!`, but backs a free-list allocator instead of a
//! fixed-size array index, because entities are spawned and despawned at
//! arbitrary times rather than allocated once at startup.

use std::fmt;

/// A live or formerly-live entity identifier.
///
/// Non-zero by construction: `EntityStore` hands out ids starting at 1.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, serde::Serialize, serde::Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityId> for u64 {
    #[inline]
    fn from(id: EntityId) -> u64 {
        id.0
    }
}

/// Allocates and recycles [`EntityId`]s.
///
/// Ids are handed out monotonically increasing from the internal counter.
/// Despawned ids land in a recycle pool but are **not** reused automatically
/// — ids are not reused within a single session until explicitly recycled
/// after despawn. Call [`EntityAllocator::recycle`]
/// to make despawned ids available again; until then `alloc` always mints a
/// fresh id.
#[derive(Default)]
pub struct EntityAllocator {
    next: u64,
    despawned: Vec<EntityId>,
    free: Vec<EntityId>,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self { next: 1, despawned: Vec::new(), free: Vec::new() }
    }

    /// Allocate the next id: a previously recycled id if any are available,
    /// otherwise a fresh monotonically increasing one.
    pub fn alloc(&mut self) -> EntityId {
        if let Some(id) = self.free.pop() {
            return id;
        }
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Mark `id` despawned. It becomes eligible for reuse only after the
    /// next call to [`recycle`](Self::recycle).
    pub fn despawn(&mut self, id: EntityId) {
        self.despawned.push(id);
    }

    /// Move every id despawned since the last call into the free pool.
    pub fn recycle(&mut self) {
        self.free.append(&mut self.despawned);
    }

    /// Advance the counter so the next `alloc()` mints an id greater than
    /// `max`, without touching the free/despawned pools. Used when loading
    /// a save file whose entity ids must come back unchanged — future
    /// spawns must still never collide with one.
    pub fn fast_forward(&mut self, max: u64) {
        if max >= self.next {
            self.next = max + 1;
        }
    }
}
