use ck_core::{EntityId, Value};
use ck_ecs::{ComponentStore, EntityStore};
use ck_job::{JobBoard, JobEngine};
use ck_map::MapIndex;
use ck_schema::{SchemaNode, SchemaRegistry};

use crate::context::SystemContext;
use crate::event::EventNamespace;
use crate::registry::SystemRegistry;
use crate::time_of_day::TimeOfDay;

fn permissive() -> SchemaNode {
    SchemaNode::parse("test", &serde_json::json!({"type": "object"})).unwrap()
}

fn schemas() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    for kind in ["Job", "Agent", "Stockpile", "Health", "Corpse", "Decay"] {
        registry.register_schema(kind, permissive());
    }
    registry
}

struct Harness {
    entities: EntityStore,
    components: ComponentStore,
    schemas: SchemaRegistry,
    map: MapIndex,
    jobs: JobEngine,
    board: JobBoard,
    time_of_day: TimeOfDay,
    systems: SystemRegistry,
}

impl Harness {
    fn new() -> Self {
        Self {
            entities: EntityStore::new(),
            components: ComponentStore::new(),
            schemas: schemas(),
            map: MapIndex::default(),
            jobs: JobEngine::new(),
            board: JobBoard::new(),
            time_of_day: TimeOfDay::new(),
            systems: SystemRegistry::new(),
        }
    }

}

/// Build a `SystemContext` borrowing `h`'s fields directly (not through a
/// method call) so the borrow checker sees it as disjoint from `h.systems`,
/// which every call site also needs mutably in the same statement.
macro_rules! ctx {
    ($h:expr) => {
        SystemContext {
            entities: &mut $h.entities,
            components: &mut $h.components,
            schemas: &$h.schemas,
            map: &mut $h.map,
            jobs: &mut $h.jobs,
            board: &mut $h.board,
            time_of_day: &mut $h.time_of_day,
        }
    };
}

#[test]
fn job_system_assigns_and_completes() {
    let mut h = Harness::new();
    let agent = EntityId(1);
    let job = EntityId(2);
    h.components
        .set(&h.schemas, agent, "Agent", Value::object([("skills", Value::object([("test_job", Value::Float(1.0))]))]))
        .unwrap();
    h.jobs
        .assign_job(&mut h.components, &h.schemas, &mut h.board, job, "test_job", Value::object([("category", Value::String("testing".into()))]))
        .unwrap();

    let mut completed = false;
    for _ in 0..12 {
        let mut ctx = ctx!(h);
        let events = h.systems.run_native_system("JobSystem", &mut ctx).unwrap();
        if events.iter().any(|e| e.namespace == EventNamespace::Ecs && e.event_type == "job_completed") {
            completed = true;
        }
    }
    assert!(completed);
    assert_eq!(h.components.get(job, "Job").unwrap().get("state").and_then(Value::as_str), Some("complete"));
}

#[test]
fn resource_reservation_system_reserves_pending_jobs() {
    let mut h = Harness::new();
    let stockpile = EntityId(1);
    let job = EntityId(2);
    h.components
        .set(&h.schemas, stockpile, "Stockpile", Value::object([("resources", Value::object([("wood", Value::Int(10))]))]))
        .unwrap();
    h.jobs
        .assign_job(
            &mut h.components,
            &h.schemas,
            &mut h.board,
            job,
            "gather",
            Value::object([(
                "resource_requirements",
                Value::Seq(vec![Value::object([("kind", Value::String("wood".into())), ("amount", Value::Int(3))])]),
            )]),
        )
        .unwrap();

    let mut ctx = ctx!(h);
    h.systems.run_native_system("ResourceReservationSystem", &mut ctx).unwrap();
    assert!(h.components.get(job, "Job").unwrap().get("reserved_resources").is_some());
}

#[test]
fn deaths_then_decay_despawns_corpse() {
    let mut h = Harness::new();
    let victim = h.entities.spawn();
    h.components.set(&h.schemas, victim, "Health", Value::object([("current", Value::Int(0)), ("max", Value::Int(10))])).unwrap();

    {
        let mut ctx = ctx!(h);
        h.systems.run_native_system("DeathsSystem", &mut ctx).unwrap();
    }
    assert!(h.components.get(victim, "Corpse").is_some());
    assert!(h.components.get(victim, "Decay").is_some());
    assert!(h.components.get(victim, "Health").is_none());

    for _ in 0..6 {
        let mut ctx = ctx!(h);
        h.systems.run_native_system("DecaySystem", &mut ctx).unwrap();
    }
    assert!(h.components.get(victim, "Corpse").is_none());
    assert!(h.components.get(victim, "Decay").is_none());
    assert!(!h.entities.is_alive(victim));
}

#[test]
fn time_of_day_wraps_hour_after_sixty_minutes() {
    let mut h = Harness::new();
    for _ in 0..60 {
        let mut ctx = ctx!(h);
        h.systems.run_native_system("TimeOfDaySystem", &mut ctx).unwrap();
    }
    assert_eq!(h.time_of_day.hour, 1);
    assert_eq!(h.time_of_day.minute, 0);
}

#[test]
fn unknown_system_name_errors() {
    let mut h = Harness::new();
    let mut ctx = ctx!(h);
    assert!(h.systems.run_system("NoSuchSystem", &mut ctx).is_err());
}

#[test]
fn run_native_system_rejects_external_only_names() {
    let mut h = Harness::new();
    h.systems.register_system("Custom", Box::new(crate::native::JobSystem));
    let mut ctx = ctx!(h);
    assert!(h.systems.run_native_system("Custom", &mut ctx).is_err());
    assert!(h.systems.run_system("Custom", &mut ctx).is_ok());
}
