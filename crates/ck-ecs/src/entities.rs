//! `EntityStore` — liveness tracking on top of `ck_core::EntityAllocator`.
//!
//! The allocator alone knows how to mint and recycle ids; this adds the
//! "is it currently alive" question the rest of the kernel asks constantly
//! (job assignment, component queries, map reverse-index consistency).

use std::collections::BTreeSet;

use ck_core::{EntityAllocator, EntityId};

#[derive(Default)]
pub struct EntityStore {
    allocator: EntityAllocator,
    alive: BTreeSet<EntityId>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self { allocator: EntityAllocator::new(), alive: BTreeSet::new() }
    }

    /// Allocate a fresh entity id and mark it live.
    pub fn spawn(&mut self) -> EntityId {
        let id = self.allocator.alloc();
        self.alive.insert(id);
        id
    }

    /// Mark `id` dead. Returns `false` if `id` was not live (a no-op, not an
    /// error — callers that already despawned an id shouldn't have to check
    /// first). Component/map/job cleanup is the caller's responsibility
    /// (`ck-world::World::despawn` cascades into the other stores); this
    /// store only tracks liveness and recycling.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if self.alive.remove(&id) {
            self.allocator.despawn(id);
            true
        } else {
            false
        }
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.alive.contains(&id)
    }

    /// All currently live entities, in ascending id order.
    pub fn entities(&self) -> Vec<EntityId> {
        self.alive.iter().copied().collect()
    }

    /// Move every despawned-since-last-call id into the allocator's free
    /// pool, making those ids eligible for reuse by future `spawn` calls.
    pub fn recycle(&mut self) {
        self.allocator.recycle();
    }

    /// Mark `id` live without drawing it from the allocator. Used when
    /// restoring entities from a save file, whose ids must come back
    /// unchanged rather than freshly minted.
    pub fn spawn_with_id(&mut self, id: EntityId) {
        self.alive.insert(id);
    }

    /// Advance the underlying allocator past `max`, so future `spawn` calls
    /// never collide with a restored id. Call once after loading every
    /// entity from a save file.
    pub fn fast_forward(&mut self, max: u64) {
        self.allocator.fast_forward(max);
    }
}
