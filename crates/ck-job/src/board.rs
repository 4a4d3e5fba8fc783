//! `JobBoard` — ordered view over the set of active jobs.
//!
//! Grounded on `dt-schedule::WakeQueue`'s "index structure keyed on an
//! ordering discipline, queried rather than iterated" shape, but the key is
//! `(priority, insertion_seq)` / `insertion_seq` rather than `Tick` — jobs
//! aren't drained at a point in time, they're re-sorted on every query.

use ck_core::{EntityId, Value};
use ck_ecs::ComponentStore;

use crate::error::JobResult;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Policy {
    #[default]
    Priority,
    Fifo,
    Lifo,
}

/// Tracks job insertion order and the active ordering policy. Job data
/// itself lives in the Component Store; the board only remembers *when*
/// each job was registered and *how* to sort.
#[derive(Default)]
pub struct JobBoard {
    policy: Policy,
    insertion_seq: std::collections::HashMap<EntityId, u64>,
    next_seq: u64,
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `job`'s insertion order, if it hasn't been registered yet.
    /// Called by `assign_job` the moment a job entity receives its `Job`
    /// component.
    pub fn register(&mut self, job: EntityId) {
        self.insertion_seq.entry(job).or_insert_with(|| {
            let seq = self.next_seq;
            self.next_seq += 1;
            seq
        });
    }

    /// Forget `job`'s insertion order — called when its entity is despawned.
    pub fn unregister(&mut self, job: EntityId) {
        self.insertion_seq.remove(&job);
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    pub fn get_policy(&self) -> Policy {
        self.policy
    }

    pub fn get_priority(&self, components: &ComponentStore, job: EntityId) -> i64 {
        components
            .get(job, "Job")
            .and_then(|value| value.get("priority"))
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    /// Set `job`'s `priority` field, validated against the `Job` schema.
    pub fn set_priority(
        &self,
        components: &mut ComponentStore,
        schemas: &ck_schema::SchemaRegistry,
        job: EntityId,
        priority: i64,
    ) -> JobResult<()> {
        let mut value = components.get(job, "Job").cloned().unwrap_or_else(Value::map);
        if let Some(map) = value.as_map_mut() {
            map.insert("priority".to_string(), Value::Int(priority));
        }
        components.set(schemas, job, "Job", value)?;
        Ok(())
    }

    fn is_active(components: &ComponentStore, job: EntityId) -> bool {
        let Some(value) = components.get(job, "Job") else { return false };
        let cancelled = value.get("cancelled").and_then(Value::as_bool).unwrap_or(false);
        let state = value.get("state").and_then(Value::as_str).unwrap_or("pending");
        !cancelled && !matches!(state, "complete" | "failed")
    }

    /// Jobs tracked by the board, sorted per the active policy.
    ///
    /// `include_terminal == false` filters to active jobs only (the default
    /// `get_job_board()` behavior); `true` includes terminal and cancelled
    /// jobs as well, still sorted by the same policy.
    pub fn list_jobs(&self, components: &ComponentStore, include_terminal: bool) -> Vec<EntityId> {
        let mut jobs: Vec<EntityId> = self
            .insertion_seq
            .keys()
            .copied()
            .filter(|&job| include_terminal || Self::is_active(components, job))
            .collect();

        let seq = |job: &EntityId| self.insertion_seq.get(job).copied().unwrap_or(0);
        match self.policy {
            Policy::Priority => {
                jobs.sort_by(|a, b| {
                    let pa = self.get_priority(components, *a);
                    let pb = self.get_priority(components, *b);
                    pb.cmp(&pa).then(seq(a).cmp(&seq(b)))
                });
            }
            Policy::Fifo => jobs.sort_by(|a, b| seq(a).cmp(&seq(b))),
            Policy::Lifo => jobs.sort_by(|a, b| seq(b).cmp(&seq(a))),
        }
        jobs
    }

    /// The active job board under the current policy — shorthand for
    /// `list_jobs(components, false)`.
    pub fn get_job_board(&self, components: &ComponentStore) -> Vec<EntityId> {
        self.list_jobs(components, false)
    }
}
