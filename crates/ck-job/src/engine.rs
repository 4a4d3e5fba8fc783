//! `JobEngine` — state machine, handler registry, dependency gating, and
//! resource reservation. The largest module in the kernel.
//!
//! The handler registry is keyed by name (`HashMap<String, Box<dyn
//! JobHandler>>`) rather than statically chained the way
//! `dt-schedule::ChainedModifier` composes — job types are looked up by
//! string at runtime, not known at compile time, so a registry is the only
//! option. The reservation table is an explicit side ledger
//! (`HashMap<(String, EntityId), f64>`) rather than decrementing
//! `Stockpile` components in place, the way `dt-mobility::MobilityStore`
//! keeps a side `route_cache` instead of mutating `RoadNetwork` — it makes
//! `release_job_resource_reservations` an exact inverse of
//! `reserve_job_resources`, rather than something that has to reconstruct
//! what was deducted.

use std::collections::{HashMap, HashSet};

use ck_core::{EntityId, Value};
use ck_ecs::ComponentStore;
use ck_schema::SchemaRegistry;

use crate::board::JobBoard;
use crate::deps;
use crate::error::{JobError, JobResult};
use crate::handler::{DefaultHandler, JobHandler};

const DEFAULT_COMPLETION_THRESHOLD: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    StateChanged,
    Completed,
    Failed,
}

/// Describes one `advance_job_state` call's observable effect. `None` from
/// `advance_job_state` means the job didn't move (terminal, cancelled, or
/// still gated by an unsatisfied dependency expression).
#[derive(Debug, Clone)]
pub struct JobTransition {
    pub job: EntityId,
    pub from_state: String,
    pub to_state: String,
    pub kind: TransitionKind,
}

pub struct JobEngine {
    handlers: HashMap<String, Box<dyn JobHandler>>,
    type_metadata: HashMap<String, Value>,
    /// `(resource kind, stockpile entity) -> amount currently reserved`.
    reservations: HashMap<(String, EntityId), f64>,
    /// `job -> [(kind, stockpile entity, amount)]`, the ledger
    /// `release_job_resource_reservations` walks to undo exactly what
    /// `reserve_job_resources` did.
    job_reservations: HashMap<EntityId, Vec<(String, EntityId, f64)>>,
    /// Reentrancy guard: jobs currently inside a `reserve_job_resources`
    /// call.
    reserving: HashSet<EntityId>,
    /// Fallback completion threshold for job types with no
    /// `completion_threshold` metadata override. `ck-world::WorldConfig`
    /// sets this at construction; absent that, it defaults to 3.
    default_completion_threshold: i64,
}

impl Default for JobEngine {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            type_metadata: HashMap::new(),
            reservations: HashMap::new(),
            job_reservations: HashMap::new(),
            reserving: HashSet::new(),
            default_completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
        }
    }
}

impl JobEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the fallback completion threshold used for job types with
    /// no `completion_threshold` metadata override.
    pub fn set_default_completion_threshold(&mut self, value: i64) {
        self.default_completion_threshold = value;
    }

    // ── Job type registration ──────────────────────────────────────────

    pub fn register_job_type(&mut self, name: impl Into<String>, handler: Box<dyn JobHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn set_job_type_metadata(&mut self, name: impl Into<String>, metadata: Value) {
        self.type_metadata.insert(name.into(), metadata);
    }

    pub fn get_job_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .handlers
            .keys()
            .map(String::as_str)
            .chain(self.type_metadata.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn get_job_type_metadata(&self, name: &str) -> Option<&Value> {
        self.type_metadata.get(name)
    }

    fn completion_threshold(&self, job_type: &str) -> i64 {
        self.type_metadata
            .get(job_type)
            .and_then(|meta| meta.get("completion_threshold"))
            .and_then(Value::as_i64)
            .unwrap_or(self.default_completion_threshold)
    }

    // ── Creation ─────────────────────────────────────────────────────────

    /// Create a `Job` component for `entity` from `job_type` and a map of
    /// field overrides (`category`, `state`, `priority`, ...), filling in
    /// default values for anything not supplied, and register its
    /// insertion order with `board`.
    pub fn assign_job(
        &self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        board: &mut JobBoard,
        entity: EntityId,
        job_type: &str,
        overrides: Value,
    ) -> JobResult<()> {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("job_type".to_string(), Value::String(job_type.to_string()));
        fields.insert("state".to_string(), Value::String("pending".to_string()));
        fields.insert("progress".to_string(), Value::Int(0));
        fields.insert("priority".to_string(), Value::Int(0));
        fields.insert("cancelled".to_string(), Value::Bool(false));
        fields.insert("assigned_to".to_string(), Value::Null);

        if let Some(overrides) = overrides.as_map() {
            for (key, value) in overrides {
                fields.insert(key.clone(), value.clone());
            }
        }

        components.set(schemas, entity, "Job", Value::Map(fields))?;
        board.register(entity);
        Ok(())
    }

    // ── Mutation surface ──────────────────────────────────────────────

    /// Write a single field into `job`'s component, validated against the
    /// `Job` schema. Rejects writes to `state`/`progress` on a terminal job.
    pub fn set_job_field(
        &self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        job: EntityId,
        key: &str,
        value: Value,
    ) -> JobResult<()> {
        let mut current = self.require_job(components, job)?;
        if is_terminal(&current) && matches!(key, "state" | "progress") {
            return Err(JobError::InvariantViolation(format!(
                "cannot write {key} on terminal job {}",
                job.get()
            )));
        }
        current.as_map_mut().expect("job is an object").insert(key.to_string(), value);
        components.set(schemas, job, "Job", current)?;
        Ok(())
    }

    /// Write several fields at once, under the same terminal-state guard as
    /// `set_job_field`.
    pub fn update_job(
        &self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        job: EntityId,
        updates: &[(&str, Value)],
    ) -> JobResult<()> {
        let mut current = self.require_job(components, job)?;
        let terminal = is_terminal(&current);
        let map = current.as_map_mut().expect("job is an object");
        for (key, value) in updates {
            if terminal && matches!(*key, "state" | "progress") {
                return Err(JobError::InvariantViolation(format!(
                    "cannot write {key} on terminal job {}",
                    job.get()
                )));
            }
            map.insert((*key).to_string(), value.clone());
        }
        components.set(schemas, job, "Job", current)?;
        Ok(())
    }

    // ── State machine ───────────────────────────────────────────────────

    /// Advance `job` by one state-machine step. Returns `None` if the job
    /// is terminal/cancelled or still gated by its dependency expression —
    /// none of those are transitions. Handler failures are caught and
    /// turned into a `Failed` transition rather than propagated: a handler
    /// failure never aborts the tick.
    pub fn advance_job_state(
        &self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        job: EntityId,
    ) -> JobResult<Option<JobTransition>> {
        let current = self.require_job(components, job)?;
        if is_terminal(&current) {
            return Ok(None);
        }

        let job_type = current.get("job_type").and_then(Value::as_str).unwrap_or("").to_string();
        let state = current.get("state").and_then(Value::as_str).unwrap_or("pending").to_string();

        if state == "pending" {
            let completed = deps::completed_job_types(components);
            let deps_expr = current.get("dependencies").cloned().unwrap_or(Value::Null);
            if !deps::evaluate(&deps_expr, &completed) {
                return Ok(None);
            }
        }

        let handler = self.handlers.get(&job_type);
        let outcome = match handler {
            Some(handler) => handler.invoke(&current),
            None if state == "pending" => Ok(default_pending_to_in_progress(&current)),
            None => DefaultHandler.invoke(&current),
        };

        let mut next = match outcome {
            Ok(value) => value,
            Err(err) => fail(&current, &err.to_string()),
        };

        apply_completion_threshold(&mut next, self.completion_threshold(&job_type));

        let to_state = next.get("state").and_then(Value::as_str).unwrap_or(&state).to_string();
        components.set(schemas, job, "Job", next)?;

        let kind = if to_state == "failed" {
            TransitionKind::Failed
        } else if to_state == "complete" {
            TransitionKind::Completed
        } else {
            TransitionKind::StateChanged
        };

        Ok(Some(JobTransition { job, from_state: state, to_state, kind }))
    }

    fn require_job(&self, components: &ComponentStore, job: EntityId) -> JobResult<Value> {
        components.get(job, "Job").cloned().ok_or(JobError::UnknownJob(job.get()))
    }

    // ── Cancellation ─────────────────────────────────────────────────────

    pub fn cancel_job(
        &mut self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        job: EntityId,
    ) -> JobResult<()> {
        self.release_job_resource_reservations(components, schemas, job)?;
        let mut current = self.require_job(components, job)?;
        current.as_map_mut().expect("job is an object").insert("cancelled".to_string(), Value::Bool(true));
        components.set(schemas, job, "Job", current)?;
        Ok(())
    }

    // ── Assignment ───────────────────────────────────────────────────────

    /// Assign qualified, unassigned pending jobs from `board` to `agent`,
    /// respecting load balance across `live_qualified_agents`: a fair-share
    /// rule that claims no more than `ceil(board_size /
    /// live_qualified_agents)` jobs per agent, and never more than one over
    /// quota relative to jobs the agent already holds.
    #[allow(clippy::too_many_arguments)]
    pub fn ai_assign_jobs(
        &self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        board: &JobBoard,
        agent: EntityId,
        excluded: &[EntityId],
        agent_skills: &Value,
        agent_specializations: Option<&[String]>,
        live_qualified_agents: usize,
    ) -> JobResult<Vec<EntityId>> {
        let job_board = board.get_job_board(components);
        let board_size = job_board.len();
        let quota = if live_qualified_agents == 0 {
            board_size
        } else {
            board_size.div_ceil(live_qualified_agents)
        };

        let already_assigned = self.ai_query_jobs(components, agent).len();

        let mut candidates: Vec<EntityId> = job_board
            .into_iter()
            .filter(|job| !excluded.contains(job))
            .filter(|&job| {
                let Some(value) = components.get(job, "Job") else { return false };
                let state = value.get("state").and_then(Value::as_str).unwrap_or("");
                let cancelled = value.get("cancelled").and_then(Value::as_bool).unwrap_or(false);
                let assigned_to = value.get("assigned_to").map(Value::is_null).unwrap_or(true);
                if state != "pending" || cancelled || !assigned_to {
                    return false;
                }
                let job_type = value.get("job_type").and_then(Value::as_str).unwrap_or("");
                let skill_weight = agent_skills.get(job_type).and_then(Value::as_f64).unwrap_or(0.0);
                if skill_weight <= 0.0 {
                    return false;
                }
                if let Some(specializations) = agent_specializations {
                    if !specializations.is_empty() {
                        let category = value.get("category").and_then(Value::as_str);
                        if let Some(category) = category {
                            if !specializations.iter().any(|s| s == category) {
                                return false;
                            }
                        }
                    }
                }
                true
            })
            .collect();
        candidates.sort_by_key(|job| job.get());

        // Never hold more than one over the agent's fair quota.
        let max_total = quota + 1;
        let mut claimed = Vec::new();
        for job in candidates {
            if already_assigned + claimed.len() >= max_total {
                break;
            }
            self.set_job_field(
                components,
                schemas,
                job,
                "assigned_to",
                Value::Int(agent.get() as i64),
            )?;
            claimed.push(job);
        }
        Ok(claimed)
    }

    pub fn ai_query_jobs(&self, components: &ComponentStore, agent: EntityId) -> Vec<EntityId> {
        components
            .entities_with("Job")
            .into_iter()
            .filter(|&job| {
                let Some(value) = components.get(job, "Job") else { return false };
                let active = !is_terminal(value);
                let assigned = value.get("assigned_to").and_then(Value::as_i64) == Some(agent.get() as i64);
                active && assigned
            })
            .collect()
    }

    pub fn ai_modify_job_assignment(
        &self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        job: EntityId,
        assigned_to: Option<EntityId>,
    ) -> JobResult<()> {
        let value = match assigned_to {
            Some(agent) => Value::Int(agent.get() as i64),
            None => Value::Null,
        };
        self.set_job_field(components, schemas, job, "assigned_to", value)
    }

    // ── Children ─────────────────────────────────────────────────────────

    pub fn set_job_children(
        &self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        job: EntityId,
        children: Vec<Value>,
    ) -> JobResult<()> {
        self.set_job_field(components, schemas, job, "children", Value::Seq(children))
    }

    pub fn get_job_children(&self, components: &ComponentStore, job: EntityId) -> Vec<Value> {
        components
            .get(job, "Job")
            .and_then(|value| value.get("children"))
            .and_then(Value::as_seq)
            .map(<[Value]>::to_vec)
            .unwrap_or_default()
    }

    // ── Resource reservation ─────────────────────────────────────────────

    /// All-or-nothing reservation of `job`'s `resource_requirements` against
    /// live `Stockpile` components. Returns `Ok(false)` (not an error) on
    /// partial satisfaction, after rolling back every tentative reservation
    /// made during this call.
    pub fn reserve_job_resources(
        &mut self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        job: EntityId,
    ) -> JobResult<bool> {
        if !self.reserving.insert(job) {
            return Err(JobError::AlreadyReserving(job.get()));
        }
        let result = self.reserve_job_resources_inner(components, schemas, job);
        self.reserving.remove(&job);
        result
    }

    fn reserve_job_resources_inner(
        &mut self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        job: EntityId,
    ) -> JobResult<bool> {
        let current = self.require_job(components, job)?;
        let requirements = current.get("resource_requirements").and_then(Value::as_seq).unwrap_or(&[]);

        let stockpiles = components.entities_with("Stockpile");
        let mut tentative: Vec<(String, EntityId, f64)> = Vec::new();

        for requirement in requirements {
            let kind = requirement.get("kind").and_then(Value::as_str).unwrap_or("").to_string();
            let amount = requirement.get("amount").and_then(Value::as_f64).unwrap_or(0.0);

            let mut found = None;
            for &stockpile in &stockpiles {
                let total = self.stockpile_amount(components, stockpile, &kind);
                let reserved = self.reservations.get(&(kind.clone(), stockpile)).copied().unwrap_or(0.0);
                if total - reserved >= amount {
                    found = Some(stockpile);
                    break;
                }
            }

            match found {
                Some(stockpile) => {
                    *self.reservations.entry((kind.clone(), stockpile)).or_insert(0.0) += amount;
                    tentative.push((kind, stockpile, amount));
                }
                None => {
                    for (kind, stockpile, amount) in tentative {
                        if let Some(reserved) = self.reservations.get_mut(&(kind, stockpile)) {
                            *reserved -= amount;
                        }
                    }
                    return Ok(false);
                }
            }
        }

        let reserved_resources: Vec<Value> = tentative
            .iter()
            .map(|(kind, _stockpile, amount)| {
                Value::object([("kind", Value::String(kind.clone())), ("amount", (*amount).into())])
            })
            .collect();

        self.job_reservations.insert(job, tentative);

        let mut next = current;
        next.as_map_mut()
            .expect("job is an object")
            .insert("reserved_resources".to_string(), Value::Seq(reserved_resources));
        components.set(schemas, job, "Job", next)?;
        Ok(true)
    }

    /// Restore every amount `job` had reserved and clear its
    /// `reserved_resources` field. An exact inverse of
    /// `reserve_job_resources`.
    pub fn release_job_resource_reservations(
        &mut self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        job: EntityId,
    ) -> JobResult<()> {
        if let Some(entries) = self.job_reservations.remove(&job) {
            for (kind, stockpile, amount) in entries {
                if let Some(reserved) = self.reservations.get_mut(&(kind.clone(), stockpile)) {
                    *reserved -= amount;
                    if *reserved <= 0.0 {
                        self.reservations.remove(&(kind, stockpile));
                    }
                }
            }
        }

        if let Some(mut current) = components.get(job, "Job").cloned() {
            if let Some(map) = current.as_map_mut() {
                map.remove("reserved_resources");
            }
            components.set(schemas, job, "Job", current)?;
        }
        Ok(())
    }

    fn stockpile_amount(&self, components: &ComponentStore, stockpile: EntityId, kind: &str) -> f64 {
        components
            .get(stockpile, "Stockpile")
            .and_then(|value| value.get("resources"))
            .and_then(|resources| resources.get(kind))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Adjust `stockpile`'s `resources[kind]` by `delta`. Rejects the write
    /// (without mutating anything) if it would drive the amount negative.
    pub fn modify_stockpile_resource(
        &self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        stockpile: EntityId,
        kind: &str,
        delta: f64,
    ) -> JobResult<()> {
        let mut current =
            components.get(stockpile, "Stockpile").cloned().unwrap_or_else(|| {
                Value::object([("resources", Value::map())])
            });
        let current_amount = self.stockpile_amount(components, stockpile, kind);
        let new_amount = current_amount + delta;
        if new_amount < 0.0 {
            return Err(JobError::InsufficientResources);
        }
        let resources = current
            .as_map_mut()
            .and_then(|map| map.get_mut("resources"))
            .and_then(Value::as_map_mut);
        if let Some(resources) = resources {
            resources.insert(kind.to_string(), new_amount.into());
        } else if let Some(map) = current.as_map_mut() {
            map.insert("resources".to_string(), Value::object([(kind, new_amount.into())]));
        }
        components.set(schemas, stockpile, "Stockpile", current)?;
        Ok(())
    }

    /// Release reservations and forget any board bookkeeping for `job` —
    /// called from the despawn cascade.
    pub fn on_despawn(
        &mut self,
        components: &mut ComponentStore,
        schemas: &SchemaRegistry,
        board: &mut JobBoard,
        job: EntityId,
    ) {
        let _ = self.release_job_resource_reservations(components, schemas, job);
        board.unregister(job);
    }
}

fn is_terminal(job: &Value) -> bool {
    let cancelled = job.get("cancelled").and_then(Value::as_bool).unwrap_or(false);
    let state = job.get("state").and_then(Value::as_str).unwrap_or("pending");
    cancelled || matches!(state, "complete" | "failed")
}

fn default_pending_to_in_progress(job: &Value) -> Value {
    let mut next = job.clone();
    if let Some(map) = next.as_map_mut() {
        map.insert("state".to_string(), Value::String("in_progress".to_string()));
        map.insert("progress".to_string(), Value::Int(0));
    }
    next
}

fn fail(job: &Value, message: &str) -> Value {
    let mut next = job.clone();
    if let Some(map) = next.as_map_mut() {
        map.insert("state".to_string(), Value::String("failed".to_string()));
        map.insert("failure_reason".to_string(), Value::String(message.to_string()));
    }
    next
}

fn apply_completion_threshold(job: &mut Value, threshold: i64) {
    let Some(map) = job.as_map_mut() else { return };
    let state = map.get("state").and_then(Value::as_str).map(str::to_string);
    if state.as_deref() != Some("in_progress") {
        return;
    }
    let progress = map.get("progress").and_then(Value::as_i64).unwrap_or(0);
    if progress >= threshold {
        map.insert("state".to_string(), Value::String("complete".to_string()));
    }
}
