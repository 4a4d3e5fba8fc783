//! `World` — the composition root every embedder talks to.
//!
//! Mirrors `dt_sim::Sim`'s role as the single struct that owns every
//! subsystem and exposes them through one surface, widened from `Sim`'s
//! fixed agent/network/plan fields to the nine `ck-*` stores this kernel
//! composes. `World::tick` plays `Sim::run_ticks`'s role: walk the native
//! systems in mode order, run externally registered systems, then flush the
//! event buses — one call, one turn.

use std::collections::BTreeMap;
use std::path::Path;

use ck_core::{value_from_json, value_to_json, EntityId, Turn, Value};
use ck_ecs::{ComponentStore, EntityStore};
use ck_events::bus::EventSubscriber;
use ck_events::{EventBus, JobEvent, JobEventLog, SubscriberId};
use ck_job::{JobBoard, JobEngine, JobHandler, JobTransition, Policy, TransitionKind};
use ck_map::{CellKey, MapIndex, Topology};
use ck_schema::{SchemaNode, SchemaRegistry};
use ck_systems::{EventNamespace, System, SystemContext, SystemEvent, SystemRegistry, TimeOfDay};
use ck_worldgen::{MapPostprocessor, MapValidator, WorldgenRegistry};

use crate::config::WorldConfig;
use crate::error::{WorldError, WorldResult};
use crate::mode::Mode;
use crate::save;

/// Job-event-bus event types the restricted bus actually carries. Writes
/// that fall outside this list (e.g. `job_unassigned`) still land in the
/// Job Event Log — only the bus forwarding is gated.
const JOB_BUS_EVENT_TYPES: &[&str] =
    &["job_assigned", "job_completed", "job_cancelled", "job_failed", "job_state_changed"];

pub struct World {
    config: WorldConfig,
    mode: Mode,
    turn: Turn,
    entities: EntityStore,
    components: ComponentStore,
    schemas: SchemaRegistry,
    map: MapIndex,
    jobs: JobEngine,
    board: JobBoard,
    systems: SystemRegistry,
    time_of_day: TimeOfDay,
    event_bus: EventBus,
    ecs_event_bus: EventBus,
    job_event_bus: EventBus,
    job_event_log: JobEventLog,
    worldgen: WorldgenRegistry,
}

impl World {
    /// Load schemas from `schema_dir` and build a fresh `World` under
    /// `WorldConfig::default()`.
    pub fn new(schema_dir: impl AsRef<Path>) -> WorldResult<World> {
        World::with_config(schema_dir.as_ref(), WorldConfig::default())
    }

    pub fn with_config(schema_dir: &Path, config: WorldConfig) -> WorldResult<World> {
        let schemas = SchemaRegistry::load(schema_dir)?;
        let mut jobs = JobEngine::new();
        jobs.set_default_completion_threshold(config.default_completion_threshold);
        let mut board = JobBoard::new();
        board.set_policy(config.default_job_board_policy.into());
        let mode = config.initial_mode;
        Ok(World {
            config,
            mode,
            turn: Turn::ZERO,
            entities: EntityStore::new(),
            components: ComponentStore::new(),
            schemas,
            map: MapIndex::default(),
            jobs,
            board,
            systems: SystemRegistry::new(),
            time_of_day: TimeOfDay::new(),
            event_bus: EventBus::new(),
            ecs_event_bus: EventBus::new(),
            job_event_bus: EventBus::new(),
            job_event_log: JobEventLog::new(),
            worldgen: WorldgenRegistry::new(),
        })
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    // ── Entities ─────────────────────────────────────────────────────────

    pub fn spawn(&mut self) -> EntityId {
        self.entities.spawn()
    }

    /// Despawn `entity`, cascading into every store that tracks it: its
    /// components, its map position, its job-board/reservation bookkeeping
    /// (if it held a `Job`), and — to preserve invariant 2 (every
    /// non-terminal job's `assigned_to` names a live agent) — unassigning
    /// any job currently assigned to it (if it held an `Agent`).
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        if self.components.get(entity, "Agent").is_some() {
            for job in self.jobs.ai_query_jobs(&self.components, entity) {
                let _ = self.jobs.ai_modify_job_assignment(&mut self.components, &self.schemas, job, None);
            }
        }
        self.jobs.on_despawn(&mut self.components, &self.schemas, &mut self.board, entity);
        self.components.remove_entity(entity);
        self.map.clear_entity_position(entity);
        self.entities.despawn(entity)
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn entities(&self) -> Vec<EntityId> {
        self.entities.entities()
    }

    pub fn recycle_entities(&mut self) {
        self.entities.recycle();
    }

    // ── Components ───────────────────────────────────────────────────────

    /// Validate and store `value` under `kind` for `entity`, then run the
    /// `Position`/`Job` post-hooks that keep the Map Index and Job Board in
    /// sync with the Component Store.
    pub fn set_component(&mut self, entity: EntityId, kind: &str, value: Value) -> WorldResult<()> {
        let hook_value = value.clone();
        self.components.set(&self.schemas, entity, kind, value)?;
        match kind {
            "Position" => match self.position_to_cell(&hook_value) {
                Some(cell) => self.map.set_entity_position(entity, cell),
                None => self.map.clear_entity_position(entity),
            },
            "Job" => self.board.register(entity),
            _ => {}
        }
        Ok(())
    }

    pub fn get_component(&self, entity: EntityId, kind: &str) -> Option<&Value> {
        self.components.get(entity, kind)
    }

    pub fn remove_component(&mut self, entity: EntityId, kind: &str) -> Option<Value> {
        if kind == "Position" {
            self.map.clear_entity_position(entity);
        }
        self.components.remove(entity, kind)
    }

    pub fn entities_with(&self, kind: &str) -> Vec<EntityId> {
        self.components.entities_with(kind)
    }

    pub fn entities_with_all(&self, kinds: &[&str]) -> Vec<EntityId> {
        self.components.entities_with_all(kinds)
    }

    fn position_to_cell(&self, value: &Value) -> Option<CellKey> {
        let pos = value.get("pos")?;
        match self.map.topology_type()? {
            Topology::Square => {
                let square = pos.get("Square")?;
                Some(CellKey::Square {
                    x: square.get("x")?.as_i64()?,
                    y: square.get("y")?.as_i64()?,
                    z: square.get("z")?.as_i64()?,
                })
            }
            Topology::Hex => {
                let hex = pos.get("Hex")?;
                Some(CellKey::Hex {
                    q: hex.get("q")?.as_i64()?,
                    r: hex.get("r")?.as_i64()?,
                    z: hex.get("z")?.as_i64()?,
                })
            }
        }
    }

    // ── Schemas ──────────────────────────────────────────────────────────

    pub fn list_components(&self) -> Vec<&str> {
        self.schemas.list_components()
    }

    pub fn get_schema(&self, kind: &str) -> Option<&SchemaNode> {
        self.schemas.get_schema(kind)
    }

    pub fn validate(&self, kind: &str, value: &Value) -> WorldResult<()> {
        Ok(self.schemas.validate(kind, value)?)
    }

    // ── Map ──────────────────────────────────────────────────────────────

    pub fn add_cell(&mut self, key: CellKey) {
        self.map.add_cell(key);
    }

    pub fn add_neighbor(&mut self, a: CellKey, b: CellKey) {
        self.map.add_neighbor(a, b);
    }

    pub fn set_cell_metadata(&mut self, key: CellKey, metadata: BTreeMap<String, Value>) {
        self.map.set_cell_metadata(key, metadata);
    }

    pub fn get_cell_metadata(&self, key: CellKey) -> Option<&BTreeMap<String, Value>> {
        self.map.get_cell_metadata(key)
    }

    pub fn get_neighbors(&self, key: CellKey) -> Vec<CellKey> {
        self.map.get_neighbors(key)
    }

    pub fn topology_type(&self) -> Option<Topology> {
        self.map.topology_type()
    }

    pub fn cell_count(&self) -> usize {
        self.map.cell_count()
    }

    pub fn all_cells(&self) -> Vec<CellKey> {
        self.map.all_cells()
    }

    pub fn entities_in_cell(&self, key: CellKey) -> Vec<EntityId> {
        self.map.entities_in_cell(key)
    }

    pub fn find_path(&self, from: CellKey, to: CellKey) -> Option<ck_map::PathResult> {
        ck_map::find_path(&self.map, from, to)
    }

    // ── Regions ──────────────────────────────────────────────────────────

    /// Every entity whose `Region.id` equals `id`, or whose `Region.id` is
    /// a list containing `id` (the component's `id` field is a string or a
    /// list of strings).
    pub fn get_entities_in_region(&self, id: &str) -> Vec<EntityId> {
        self.components
            .entities_with("Region")
            .into_iter()
            .filter(|&e| {
                let Some(region_id) = self.components.get(e, "Region").and_then(|r| r.get("id")) else {
                    return false;
                };
                match region_id {
                    Value::String(s) => s == id,
                    Value::Seq(items) => items.iter().any(|v| v.as_str() == Some(id)),
                    _ => false,
                }
            })
            .collect()
    }

    /// Every entity whose `Region.kind` equals `kind`.
    pub fn get_entities_in_region_kind(&self, kind: &str) -> Vec<EntityId> {
        self.components
            .entities_with("Region")
            .into_iter()
            .filter(|&e| self.components.get(e, "Region").and_then(|r| r.get("kind")).and_then(Value::as_str) == Some(kind))
            .collect()
    }

    // ── Movement ─────────────────────────────────────────────────────────

    /// Find the shortest path from `from` to `to` (each the same
    /// `{"Square": {...}}`/`{"Hex": {...}}`-shaped value `Position.pos`
    /// uses) and write it into `agent`'s `Agent.move_path` as a list of
    /// the same cell-shaped values, leading cell first.
    ///
    /// Leaves `move_path` untouched and returns `Ok(())` if no path exists.
    pub fn assign_move_path(&mut self, agent: EntityId, from: &Value, to: &Value) -> WorldResult<()> {
        let (Some(from_cell), Some(to_cell)) = (self.cell_from_value(from), self.cell_from_value(to)) else {
            return Err(WorldError::InvariantViolation("unresolvable cell for move path".into()));
        };
        let Some(result) = ck_map::find_path(&self.map, from_cell, to_cell) else {
            return Ok(());
        };
        let mut agent_value = self
            .components
            .get(agent, "Agent")
            .cloned()
            .ok_or(WorldError::UnknownEntity(agent.get()))?;
        let path = Value::Seq(result.path.into_iter().map(|c| self.cell_to_value(c)).collect());
        match agent_value.as_map_mut() {
            Some(m) => {
                m.insert("move_path".to_string(), path);
            }
            None => return Err(WorldError::InvariantViolation("Agent is not an object".into())),
        }
        self.components.set(&self.schemas, agent, "Agent", agent_value)?;
        Ok(())
    }

    /// Whether `agent` currently stands at `cell` (its `Position.pos`
    /// resolves to the same `CellKey`).
    pub fn is_agent_at_cell(&self, agent: EntityId, cell: &Value) -> bool {
        let Some(position) = self.components.get(agent, "Position") else {
            return false;
        };
        let (Some(at), Some(target)) = (self.position_to_cell(position), self.cell_from_value(cell)) else {
            return false;
        };
        at == target
    }

    /// Whether `agent`'s `Agent.move_path` is absent, missing, or `[]` —
    /// true for a nonexistent `Agent` component, a component with no
    /// `move_path` field, and an explicitly empty one alike.
    pub fn is_move_path_empty(&self, agent: EntityId) -> bool {
        self.components
            .get(agent, "Agent")
            .and_then(|a| a.get("move_path"))
            .and_then(Value::as_seq)
            .map(<[Value]>::is_empty)
            .unwrap_or(true)
    }

    /// Convert a `{"Square": {...}}`/`{"Hex": {...}}`-shaped value (the same
    /// shape `Position.pos` uses) directly into a `CellKey`, without the
    /// `Position` component's outer `pos` wrapper `position_to_cell` expects.
    fn cell_from_value(&self, value: &Value) -> Option<CellKey> {
        match self.map.topology_type()? {
            Topology::Square => {
                let square = value.get("Square")?;
                Some(CellKey::Square {
                    x: square.get("x")?.as_i64()?,
                    y: square.get("y")?.as_i64()?,
                    z: square.get("z")?.as_i64()?,
                })
            }
            Topology::Hex => {
                let hex = value.get("Hex")?;
                Some(CellKey::Hex {
                    q: hex.get("q")?.as_i64()?,
                    r: hex.get("r")?.as_i64()?,
                    z: hex.get("z")?.as_i64()?,
                })
            }
        }
    }

    fn cell_to_value(&self, cell: CellKey) -> Value {
        match cell {
            CellKey::Square { x, y, z } => {
                Value::object([("Square", Value::object([("x", Value::Int(x)), ("y", Value::Int(y)), ("z", Value::Int(z))]))])
            }
            CellKey::Hex { q, r, z } => {
                Value::object([("Hex", Value::object([("q", Value::Int(q)), ("r", Value::Int(r)), ("z", Value::Int(z))]))])
            }
        }
    }

    // ── Worldgen ─────────────────────────────────────────────────────────

    pub fn register_map_validator(&mut self, validator: Box<dyn MapValidator>) {
        self.worldgen.register_map_validator(validator);
    }

    pub fn register_map_postprocessor(&mut self, postprocessor: Box<dyn MapPostprocessor>) {
        self.worldgen.register_map_postprocessor(postprocessor);
    }

    pub fn clear_map_validators(&mut self) {
        self.worldgen.clear_map_validators();
    }

    pub fn clear_map_postprocessors(&mut self) {
        self.worldgen.clear_map_postprocessors();
    }

    pub fn apply_generated_map(&mut self, document: &Value) -> WorldResult<()> {
        Ok(self.worldgen.apply_generated_map(&self.schemas, &mut self.map, document)?)
    }

    pub fn apply_chunk(&mut self, document: &Value) -> WorldResult<()> {
        Ok(self.worldgen.apply_chunk(&self.schemas, &mut self.map, document)?)
    }

    // ── Jobs ─────────────────────────────────────────────────────────────

    pub fn register_job_type(&mut self, name: impl Into<String>, handler: Box<dyn JobHandler>) {
        self.jobs.register_job_type(name, handler);
    }

    pub fn set_job_type_metadata(&mut self, name: impl Into<String>, metadata: Value) {
        self.jobs.set_job_type_metadata(name, metadata);
    }

    pub fn get_job_types(&self) -> Vec<&str> {
        self.jobs.get_job_types()
    }

    pub fn get_job_type_metadata(&self, name: &str) -> Option<&Value> {
        self.jobs.get_job_type_metadata(name)
    }

    pub fn assign_job(&mut self, entity: EntityId, job_type: &str, overrides: Value) -> WorldResult<()> {
        Ok(self.jobs.assign_job(&mut self.components, &self.schemas, &mut self.board, entity, job_type, overrides)?)
    }

    pub fn get_job(&self, job: EntityId) -> Option<&Value> {
        self.components.get(job, "Job")
    }

    pub fn set_job_field(&mut self, job: EntityId, key: &str, value: Value) -> WorldResult<()> {
        Ok(self.jobs.set_job_field(&mut self.components, &self.schemas, job, key, value)?)
    }

    pub fn update_job(&mut self, job: EntityId, updates: &[(&str, Value)]) -> WorldResult<()> {
        Ok(self.jobs.update_job(&mut self.components, &self.schemas, job, updates)?)
    }

    /// Advance `job` one state-machine step, recording a Job Event Log entry
    /// (and, for a terminal outcome, a matching ECS event) for any
    /// transition that actually happened — the same bookkeeping
    /// `native::JobSystem` performs for jobs advanced during `tick()`, kept
    /// consistent for callers driving a job by hand between ticks.
    pub fn advance_job_state(&mut self, job: EntityId) -> WorldResult<Option<JobTransition>> {
        let transition = self.jobs.advance_job_state(&mut self.components, &self.schemas, job)?;
        if let Some(t) = &transition {
            let payload = Value::object([
                ("entity", Value::Int(t.job.get() as i64)),
                ("from_state", Value::String(t.from_state.clone())),
                ("to_state", Value::String(t.to_state.clone())),
            ]);
            let event_type = match t.kind {
                TransitionKind::StateChanged => "job_state_changed",
                TransitionKind::Completed => "job_completed",
                TransitionKind::Failed => "job_failed",
            };
            self.record_job_event(event_type, payload.clone());
            if matches!(t.kind, TransitionKind::Completed | TransitionKind::Failed) {
                self.ecs_event_bus.send_event(event_type, payload);
            }
        }
        Ok(transition)
    }

    // ── Production jobs / stockpiles ─────────────────────────────────────
    //
    // `ProductionJob`/`Stockpile` are plain schema-validated components, not
    // `ck_job::JobEngine`-owned state; these are thin read/write wrappers
    // over `get_component`/`set_component`, not state-machine transitions.

    pub fn get_production_job(&self, entity: EntityId) -> Option<&Value> {
        self.components.get(entity, "ProductionJob")
    }

    pub fn get_production_job_state(&self, entity: EntityId) -> Option<&str> {
        self.components.get(entity, "ProductionJob")?.get("state")?.as_str()
    }

    pub fn set_production_job_state(&mut self, entity: EntityId, state: &str) -> WorldResult<()> {
        let mut job = self
            .components
            .get(entity, "ProductionJob")
            .cloned()
            .ok_or_else(|| WorldError::InvariantViolation("no production job on entity".into()))?;
        job.as_map_mut()
            .ok_or_else(|| WorldError::InvariantViolation("ProductionJob is not an object".into()))?
            .insert("state".to_string(), Value::String(state.to_string()));
        self.components.set(&self.schemas, entity, "ProductionJob", job)?;
        Ok(())
    }

    pub fn get_production_job_progress(&self, entity: EntityId) -> Option<i64> {
        self.components.get(entity, "ProductionJob")?.get("progress")?.as_i64()
    }

    pub fn set_production_job_progress(&mut self, entity: EntityId, progress: i64) -> WorldResult<()> {
        let mut job = self
            .components
            .get(entity, "ProductionJob")
            .cloned()
            .ok_or_else(|| WorldError::InvariantViolation("no production job on entity".into()))?;
        job.as_map_mut()
            .ok_or_else(|| WorldError::InvariantViolation("ProductionJob is not an object".into()))?
            .insert("progress".to_string(), Value::Int(progress));
        self.components.set(&self.schemas, entity, "ProductionJob", job)?;
        Ok(())
    }

    pub fn get_stockpile_resources(&self, entity: EntityId) -> Option<&Value> {
        self.components.get(entity, "Stockpile")?.get("resources")
    }

    pub fn cancel_job(&mut self, job: EntityId) -> WorldResult<()> {
        self.jobs.cancel_job(&mut self.components, &self.schemas, job)?;
        self.record_job_event("job_cancelled", Value::object([("entity", Value::Int(job.get() as i64))]));
        Ok(())
    }

    pub fn ai_assign_jobs(&mut self, agent: EntityId, excluded: &[EntityId]) -> WorldResult<Vec<EntityId>> {
        let agent_value =
            self.components.get(agent, "Agent").cloned().ok_or(WorldError::UnknownEntity(agent.get()))?;
        let skills = agent_value.get("skills").cloned().unwrap_or_else(Value::map);
        let specializations: Option<Vec<String>> = agent_value
            .get("specializations")
            .and_then(Value::as_seq)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect());
        let live_qualified_agents = self.components.entities_with("Agent").len();

        let claimed = self.jobs.ai_assign_jobs(
            &mut self.components,
            &self.schemas,
            &self.board,
            agent,
            excluded,
            &skills,
            specializations.as_deref(),
            live_qualified_agents,
        )?;
        for job in &claimed {
            self.record_job_event(
                "job_assigned",
                Value::object([("entity", Value::Int(job.get() as i64)), ("assigned_to", Value::Int(agent.get() as i64))]),
            );
        }
        Ok(claimed)
    }

    pub fn ai_query_jobs(&self, agent: EntityId) -> Vec<EntityId> {
        self.jobs.ai_query_jobs(&self.components, agent)
    }

    pub fn ai_modify_job_assignment(&mut self, job: EntityId, assigned_to: Option<EntityId>) -> WorldResult<()> {
        self.jobs.ai_modify_job_assignment(&mut self.components, &self.schemas, job, assigned_to)?;
        match assigned_to {
            Some(agent) => self.record_job_event(
                "job_assigned",
                Value::object([("entity", Value::Int(job.get() as i64)), ("assigned_to", Value::Int(agent.get() as i64))]),
            ),
            None => self.record_job_event("job_unassigned", Value::object([("entity", Value::Int(job.get() as i64))])),
        }
        Ok(())
    }

    pub fn set_job_children(&mut self, job: EntityId, children: Vec<Value>) -> WorldResult<()> {
        Ok(self.jobs.set_job_children(&mut self.components, &self.schemas, job, children)?)
    }

    pub fn get_job_children(&self, job: EntityId) -> Vec<Value> {
        self.jobs.get_job_children(&self.components, job)
    }

    pub fn reserve_job_resources(&mut self, job: EntityId) -> WorldResult<bool> {
        Ok(self.jobs.reserve_job_resources(&mut self.components, &self.schemas, job)?)
    }

    pub fn release_job_resource_reservations(&mut self, job: EntityId) -> WorldResult<()> {
        Ok(self.jobs.release_job_resource_reservations(&mut self.components, &self.schemas, job)?)
    }

    pub fn modify_stockpile_resource(&mut self, stockpile: EntityId, kind: &str, delta: f64) -> WorldResult<()> {
        Ok(self.jobs.modify_stockpile_resource(&mut self.components, &self.schemas, stockpile, kind, delta)?)
    }

    pub fn get_job_board(&self) -> Vec<EntityId> {
        self.board.get_job_board(&self.components)
    }

    pub fn list_jobs(&self, include_terminal: bool) -> Vec<EntityId> {
        self.board.list_jobs(&self.components, include_terminal)
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.board.set_policy(policy);
    }

    pub fn get_policy(&self) -> Policy {
        self.board.get_policy()
    }

    pub fn get_priority(&self, job: EntityId) -> i64 {
        self.board.get_priority(&self.components, job)
    }

    pub fn set_priority(&mut self, job: EntityId, priority: i64) -> WorldResult<()> {
        Ok(self.board.set_priority(&mut self.components, &self.schemas, job, priority)?)
    }

    /// Route one emitted `SystemEvent` to its namespace's bus, and — for
    /// `Job`-namespace events — also append it to the Job Event Log, which
    /// the bus itself has no knowledge of.
    fn route_system_event(&mut self, event: SystemEvent) {
        match event.namespace {
            EventNamespace::Generic => self.event_bus.send_event(event.event_type, event.payload),
            EventNamespace::Ecs => self.ecs_event_bus.send_event(event.event_type, event.payload),
            EventNamespace::Job => {
                self.job_event_log.append(event.event_type.clone(), event.payload.clone());
                self.job_event_bus.send_event(event.event_type, event.payload);
            }
        }
    }

    /// Append one Job Event Log entry and, when `event_type` is one of the
    /// restricted job-event-bus types, forward it to that bus too.
    fn record_job_event(&mut self, event_type: impl Into<String>, payload: Value) {
        let event_type = event_type.into();
        self.job_event_log.append(event_type.clone(), payload.clone());
        if JOB_BUS_EVENT_TYPES.contains(&event_type.as_str()) {
            self.job_event_bus.send_event(event_type, payload);
        }
    }

    // ── Systems ──────────────────────────────────────────────────────────

    pub fn register_system(&mut self, name: impl Into<String>, system: Box<dyn System>) {
        self.systems.register_system(name, system);
    }

    pub fn list_native_systems(&self) -> Vec<&str> {
        self.systems.list_native_systems()
    }

    pub fn list_external_systems(&self) -> Vec<&str> {
        self.systems.list_external_systems()
    }

    /// Run one named system (native or external) outside the normal tick
    /// loop, routing whatever events it emits the same way `tick()` does.
    ///
    /// `SystemContext` is built from direct field projections (`&mut
    /// self.entities`, ...) rather than through a context-returning helper
    /// method: a helper tying the borrow to the whole `&mut self` receiver
    /// would conflict with the `self.systems` borrow this function also
    /// needs in the same statement.
    pub fn run_system(&mut self, name: &str) -> WorldResult<Vec<SystemEvent>> {
        let events = {
            let mut ctx = SystemContext {
                entities: &mut self.entities,
                components: &mut self.components,
                schemas: &self.schemas,
                map: &mut self.map,
                jobs: &mut self.jobs,
                board: &mut self.board,
                time_of_day: &mut self.time_of_day,
            };
            self.systems.run_system(name, &mut ctx)?
        };
        for event in events.clone() {
            self.route_system_event(event);
        }
        Ok(events)
    }

    pub fn run_native_system(&mut self, name: &str) -> WorldResult<Vec<SystemEvent>> {
        let events = {
            let mut ctx = SystemContext {
                entities: &mut self.entities,
                components: &mut self.components,
                schemas: &self.schemas,
                map: &mut self.map,
                jobs: &mut self.jobs,
                board: &mut self.board,
                time_of_day: &mut self.time_of_day,
            };
            self.systems.run_native_system(name, &mut ctx)?
        };
        for event in events.clone() {
            self.route_system_event(event);
        }
        Ok(events)
    }

    /// Advance the world by one turn: run every native system this mode
    /// gates in, then every externally registered system in insertion
    /// order, then flush the event buses so events sent this turn become
    /// readable.
    pub fn tick(&mut self) -> WorldResult<()> {
        let mut events = Vec::new();
        let native_names = self.mode.native_systems();
        let external_names: Vec<String> = self.systems.list_external_systems().iter().map(|s| s.to_string()).collect();
        {
            let mut ctx = SystemContext {
                entities: &mut self.entities,
                components: &mut self.components,
                schemas: &self.schemas,
                map: &mut self.map,
                jobs: &mut self.jobs,
                board: &mut self.board,
                time_of_day: &mut self.time_of_day,
            };
            for name in native_names {
                events.extend(self.systems.run_native_system(name, &mut ctx)?);
            }
            for name in &external_names {
                events.extend(self.systems.run_system(name, &mut ctx)?);
            }
        }

        self.job_event_log.advance_clock(self.config.tick_duration_ms);
        for event in events {
            self.route_system_event(event);
        }

        self.event_bus.update_event_buses();
        self.ecs_event_bus.update_event_buses();
        self.job_event_bus.update_event_buses();

        self.turn = self.turn.next();
        Ok(())
    }

    // ── Events ───────────────────────────────────────────────────────────

    pub fn send_event(&mut self, event_type: impl Into<String>, payload: Value) {
        self.event_bus.send_event(event_type, payload);
    }

    pub fn poll_event(&mut self, event_type: &str) -> Vec<Value> {
        self.event_bus.poll_event(event_type)
    }

    pub fn subscribe(&mut self, event_type: impl Into<String>, subscriber: Box<dyn EventSubscriber>) -> SubscriberId {
        self.event_bus.subscribe(event_type, subscriber)
    }

    pub fn unsubscribe(&mut self, event_type: &str, id: SubscriberId) {
        self.event_bus.unsubscribe(event_type, id);
    }

    pub fn poll_ecs_event(&mut self, event_type: &str) -> Vec<Value> {
        self.ecs_event_bus.poll_event(event_type)
    }

    pub fn poll_job_event(&mut self, event_type: &str) -> Vec<Value> {
        self.job_event_bus.poll_event(event_type)
    }

    /// Manually flush all three event buses. `tick()` already does this at
    /// the end of every turn; exposed for embedders that send events
    /// outside of `tick()` (e.g. from a UI callback) and want them readable
    /// without waiting for the next turn.
    pub fn update_event_buses(&mut self) {
        self.event_bus.update_event_buses();
        self.ecs_event_bus.update_event_buses();
        self.job_event_bus.update_event_buses();
    }

    // ── Job event log ────────────────────────────────────────────────────

    pub fn get_job_event_log(&self) -> &[JobEvent] {
        self.job_event_log.get_job_event_log()
    }

    pub fn get_job_events_by_type(&self, event_type: &str) -> Vec<&JobEvent> {
        self.job_event_log.get_job_events_by_type(event_type)
    }

    pub fn get_job_events_since(&self, ts_ms: u64) -> Vec<&JobEvent> {
        self.job_event_log.get_job_events_since(ts_ms)
    }

    pub fn get_job_events_where<P>(&self, predicate: P) -> Vec<&JobEvent>
    where
        P: Fn(&JobEvent) -> bool,
    {
        self.job_event_log.get_job_events_where(predicate)
    }

    pub fn clear_job_event_log(&mut self) {
        self.job_event_log.clear_job_event_log();
    }

    pub fn save_job_event_log(&self, path: &Path) -> WorldResult<()> {
        Ok(self.job_event_log.save_job_event_log(path)?)
    }

    pub fn load_job_event_log(&mut self, path: &Path) -> WorldResult<()> {
        Ok(self.job_event_log.load_job_event_log(path)?)
    }

    /// Re-run every logged job event through `self.jobs`' handler registry
    /// in recorded order, for a host that wants to reconstruct job outcomes
    /// from a log alone: replaying the same log against the same handlers
    /// reproduces the same final `Job` component state.
    pub fn replay_job_event_log(&mut self) -> WorldResult<()> {
        let jobs: Vec<EntityId> = self
            .job_event_log
            .get_job_event_log()
            .iter()
            .filter_map(|entry| entry.payload.get("entity").and_then(Value::as_i64))
            .map(|id| EntityId(id as u64))
            .collect();
        for job in jobs {
            if self.components.get(job, "Job").is_some() {
                self.jobs.advance_job_state(&mut self.components, &self.schemas, job)?;
            }
        }
        Ok(())
    }

    // ── Equipment / Inventory / Body ────────────────────────────────────
    //
    // `Item` is its own component kind (one entity per item), so
    // equipping is a cross-entity lookup by item id rather than a nested
    // write. See DESIGN.md for the exact invariant-violation message
    // substrings these methods reproduce.

    pub fn get_inventory(&self, entity: EntityId) -> Option<&Value> {
        self.components.get(entity, "Inventory")
    }

    pub fn set_inventory(&mut self, entity: EntityId, value: Value) -> WorldResult<()> {
        self.components.set(&self.schemas, entity, "Inventory", value)?;
        Ok(())
    }

    pub fn get_equipment(&self, entity: EntityId) -> Option<&Value> {
        self.components.get(entity, "Equipment")
    }

    pub fn get_body(&self, entity: EntityId) -> Option<&Value> {
        self.components.get(entity, "Body")
    }

    pub fn set_body(&mut self, entity: EntityId, value: Value) -> WorldResult<()> {
        self.components.set(&self.schemas, entity, "Body", value)?;
        Ok(())
    }

    /// Append `part` to `entity`'s top-level `Body.parts` list. Adding a
    /// part nested under an existing one is done by reading the body,
    /// mutating the fetched part's `children`, and calling `set_body`
    /// again — there is no dedicated "add nested child" operation.
    pub fn add_body_part(&mut self, entity: EntityId, part: Value) -> WorldResult<()> {
        let mut body = self
            .components
            .get(entity, "Body")
            .cloned()
            .unwrap_or_else(|| Value::object([("parts", Value::seq())]));
        let parts = body
            .as_map_mut()
            .and_then(|m| m.get_mut("parts"))
            .and_then(Value::as_seq_mut)
            .ok_or_else(|| WorldError::InvariantViolation("body has no parts field".into()))?;
        parts.push(part);
        self.components.set(&self.schemas, entity, "Body", body)?;
        Ok(())
    }

    /// Remove the first part named `name` anywhere in `entity`'s body tree,
    /// searching `children` recursively. Returns the removed part, or
    /// `None` if no part with that name exists.
    pub fn remove_body_part(&mut self, entity: EntityId, name: &str) -> WorldResult<Option<Value>> {
        let mut body = match self.components.get(entity, "Body").cloned() {
            Some(body) => body,
            None => return Ok(None),
        };
        let removed = body
            .as_map_mut()
            .and_then(|m| m.get_mut("parts"))
            .and_then(Value::as_seq_mut)
            .and_then(|parts| remove_part_by_name(parts, name));
        if removed.is_some() {
            self.components.set(&self.schemas, entity, "Body", body)?;
        }
        Ok(removed)
    }

    /// Find the first part named `name` anywhere in `entity`'s body tree,
    /// searching `children` recursively.
    pub fn get_body_part(&self, entity: EntityId, name: &str) -> Option<Value> {
        let parts = self.components.get(entity, "Body")?.get("parts")?.as_seq()?;
        find_part_by_name(parts, name).cloned()
    }

    /// Append `item_id` to `entity`'s inventory slots.
    pub fn add_item_to_inventory(&mut self, entity: EntityId, item_id: &str) -> WorldResult<()> {
        let mut inventory = self.components.get(entity, "Inventory").cloned().unwrap_or_else(|| {
            Value::object([("slots", Value::seq()), ("weight", 0.0.into()), ("volume", 0.0.into())])
        });
        let slots = inventory.as_map_mut().and_then(|m| m.get_mut("slots")).and_then(Value::as_seq_mut);
        match slots {
            Some(slots) => slots.push(Value::String(item_id.to_string())),
            None => return Err(WorldError::InvariantViolation("inventory has no slots field".into())),
        }
        self.components.set(&self.schemas, entity, "Inventory", inventory)?;
        Ok(())
    }

    /// Remove the item at `index` from `entity`'s inventory slots.
    pub fn remove_item_from_inventory(&mut self, entity: EntityId, index: usize) -> WorldResult<Value> {
        let mut inventory = self
            .components
            .get(entity, "Inventory")
            .cloned()
            .ok_or_else(|| WorldError::InvariantViolation("not in inventory".into()))?;
        let removed = {
            let slots = inventory
                .as_map_mut()
                .and_then(|m| m.get_mut("slots"))
                .and_then(Value::as_seq_mut)
                .ok_or_else(|| WorldError::InvariantViolation("inventory has no slots field".into()))?;
            if index >= slots.len() {
                return Err(WorldError::InvariantViolation("not in inventory".into()));
            }
            slots.remove(index)
        };
        self.components.set(&self.schemas, entity, "Inventory", inventory)?;
        Ok(removed)
    }

    /// Move `item_id` from `entity`'s inventory into `slot` on its equipment.
    ///
    /// Rejects the move with an `InvariantViolation` when: the item's own
    /// `slot` field doesn't match the requested `slot` (`"invalid slot"`);
    /// `item_id` isn't present in the entity's inventory (`"not in
    /// inventory"`); or `slot` is already occupied (`"already equipped"`).
    pub fn equip_item(&mut self, entity: EntityId, item_id: &str, slot: &str) -> WorldResult<()> {
        let item = self
            .components
            .entities_with("Item")
            .into_iter()
            .find_map(|e| self.components.get(e, "Item"))
            .filter(|item| item.get("id").and_then(Value::as_str) == Some(item_id))
            .ok_or_else(|| WorldError::InvariantViolation("not in inventory".into()))?;

        if item.get("slot").and_then(Value::as_str) != Some(slot) {
            return Err(WorldError::InvariantViolation("invalid slot".into()));
        }

        let in_inventory = self
            .components
            .get(entity, "Inventory")
            .and_then(|inv| inv.get("slots"))
            .and_then(Value::as_seq)
            .map(|slots| slots.iter().any(|v| v.as_str() == Some(item_id)))
            .unwrap_or(false);
        if !in_inventory {
            return Err(WorldError::InvariantViolation("not in inventory".into()));
        }

        let mut equipment = self.components.get(entity, "Equipment").cloned().unwrap_or_else(|| {
            Value::object([("slots", Value::map())])
        });
        {
            let slots = equipment
                .as_map_mut()
                .and_then(|m| m.get_mut("slots"))
                .and_then(Value::as_map_mut)
                .ok_or_else(|| WorldError::InvariantViolation("equipment has no slots field".into()))?;
            if slots.get(slot).map(|v| !v.is_null()).unwrap_or(false) {
                return Err(WorldError::InvariantViolation("already equipped".into()));
            }
            slots.insert(slot.to_string(), Value::String(item_id.to_string()));
        }
        self.components.set(&self.schemas, entity, "Equipment", equipment)?;
        Ok(())
    }

    /// Clear `slot` on `entity`'s equipment, a no-op if it was already empty.
    pub fn unequip_item(&mut self, entity: EntityId, slot: &str) -> WorldResult<()> {
        let mut equipment = self.components.get(entity, "Equipment").cloned().unwrap_or_else(|| {
            Value::object([("slots", Value::map())])
        });
        let slots = equipment
            .as_map_mut()
            .and_then(|m| m.get_mut("slots"))
            .and_then(Value::as_map_mut)
            .ok_or_else(|| WorldError::InvariantViolation("equipment has no slots field".into()))?;
        slots.insert(slot.to_string(), Value::Null);
        self.components.set(&self.schemas, entity, "Equipment", equipment)?;
        Ok(())
    }

    // ── Mode ─────────────────────────────────────────────────────────────

    pub fn get_mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn get_available_modes(&self) -> &'static [Mode] {
        Mode::available()
    }

    // ── Save / load ──────────────────────────────────────────────────────

    /// Serialize the full world to a JSON object with `mode`, `turn`,
    /// `entities`, `map`, `time_of_day`, plus a `job_event_log` key so a
    /// reloaded world's replay history survives the round trip (see
    /// DESIGN.md).
    pub fn save_to_file(&self, path: &Path) -> WorldResult<()> {
        let entities: Vec<serde_json::Value> = self
            .entities
            .entities()
            .into_iter()
            .map(|id| save::entity_to_json(id, &self.components.components_for_entity(id)))
            .collect();

        let job_event_log: Vec<serde_json::Value> = self
            .job_event_log
            .get_job_event_log()
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "timestamp_ms": entry.timestamp_ms,
                    "event_type": entry.event_type,
                    "payload": value_to_json(&entry.payload),
                })
            })
            .collect();

        let document = serde_json::json!({
            "mode": save::mode_to_json(self.mode),
            "turn": self.turn.0,
            "entities": entities,
            "map": save::map_to_json(&self.map),
            "time_of_day": save::time_of_day_to_json(&self.time_of_day),
            "job_event_log": job_event_log,
        });

        let text = serde_json::to_string_pretty(&document).map_err(|err| WorldError::MalformedSave {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Rebuild a `World` from a file `save_to_file` produced. Entity ids
    /// come back unchanged; the entity allocator is fast-forwarded so future
    /// `spawn()` calls never collide with a loaded id (invariant 7).
    pub fn load_from_file(schema_dir: &Path, config: WorldConfig, path: &Path) -> WorldResult<World> {
        let malformed = |reason: &str| WorldError::MalformedSave { path: path.to_path_buf(), reason: reason.to_string() };

        let text = std::fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&text).map_err(|err| WorldError::MalformedSave {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let mut world = World::with_config(schema_dir, config)?;

        world.mode = save::mode_from_json(json.get("mode").ok_or_else(|| malformed("missing `mode`"))?, path)?;
        world.turn = Turn(json.get("turn").and_then(|v| v.as_u64()).ok_or_else(|| malformed("missing `turn`"))?);
        world.map = save::map_from_json(json.get("map").ok_or_else(|| malformed("missing `map`"))?, path)?;
        world.time_of_day =
            save::time_of_day_from_json(json.get("time_of_day").ok_or_else(|| malformed("missing `time_of_day`"))?, path)?;

        let entities = json.get("entities").and_then(|v| v.as_array()).ok_or_else(|| malformed("missing `entities`"))?;
        let mut max_id = 0u64;
        for entry in entities {
            let id = entry.get("id").and_then(|v| v.as_u64()).ok_or_else(|| malformed("entity missing `id`"))?;
            max_id = max_id.max(id);
            let entity = EntityId(id);
            world.entities.spawn_with_id(entity);
            let components = entry.get("components").and_then(|v| v.as_object()).ok_or_else(|| malformed("entity missing `components`"))?;
            for (kind, value) in components {
                let value = value_from_json(value);
                world.set_component(entity, kind, value)?;
            }
        }
        world.entities.fast_forward(max_id);

        if let Some(array) = json.get("job_event_log").and_then(|v| v.as_array()) {
            for entry in array {
                let event_type =
                    entry.get("event_type").and_then(|v| v.as_str()).ok_or_else(|| malformed("job event missing `event_type`"))?;
                let timestamp_ms =
                    entry.get("timestamp_ms").and_then(|v| v.as_u64()).ok_or_else(|| malformed("job event missing `timestamp_ms`"))?;
                let payload = value_from_json(entry.get("payload").unwrap_or(&serde_json::Value::Null));
                world.job_event_log.restore_entry(timestamp_ms, event_type, payload);
            }
        }

        Ok(world)
    }
}

/// Depth-first search through a body-part tree for the first part named
/// `name`, descending into `children`.
fn find_part_by_name<'a>(parts: &'a [Value], name: &str) -> Option<&'a Value> {
    for part in parts {
        if part.get("name").and_then(Value::as_str) == Some(name) {
            return Some(part);
        }
        if let Some(children) = part.get("children").and_then(Value::as_seq) {
            if let Some(found) = find_part_by_name(children, name) {
                return Some(found);
            }
        }
    }
    None
}

/// Depth-first search-and-remove through a body-part tree for the first
/// part named `name`, descending into `children`.
fn remove_part_by_name(parts: &mut Vec<Value>, name: &str) -> Option<Value> {
    if let Some(index) = parts.iter().position(|p| p.get("name").and_then(Value::as_str) == Some(name)) {
        return Some(parts.remove(index));
    }
    for part in parts.iter_mut() {
        if let Some(children) = part.as_map_mut().and_then(|m| m.get_mut("children")).and_then(Value::as_seq_mut) {
            if let Some(found) = remove_part_by_name(children, name) {
                return Some(found);
            }
        }
    }
    None
}
