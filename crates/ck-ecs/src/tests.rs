//! Unit tests for entity liveness and component storage.

use ck_core::Value;
use ck_schema::{SchemaNode, SchemaRegistry};

use crate::{ComponentStore, EntityStore};

fn registry_with_health() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register_schema(
        "Health",
        SchemaNode::parse(
            "Health",
            &serde_json::json!({
                "type": "object",
                "required": ["current", "max"],
                "properties": {"current": {"type": "integer"}, "max": {"type": "integer"}}
            }),
        )
        .unwrap(),
    );
    registry
}

#[test]
fn spawn_and_despawn() {
    let mut entities = EntityStore::new();
    let e = entities.spawn();
    assert!(entities.is_alive(e));
    assert!(entities.despawn(e));
    assert!(!entities.is_alive(e));
    assert!(!entities.despawn(e));
}

#[test]
fn ids_not_reused_until_recycled() {
    let mut entities = EntityStore::new();
    let a = entities.spawn();
    entities.despawn(a);
    let b = entities.spawn();
    assert_ne!(a, b);
    entities.recycle();
    let c = entities.spawn();
    assert_eq!(c, a);
}

#[test]
fn set_validates_against_schema() {
    let schemas = registry_with_health();
    let mut store = ComponentStore::new();
    let mut entities = EntityStore::new();
    let e = entities.spawn();

    let good = Value::object([("current", Value::Int(10)), ("max", Value::Int(10))]);
    assert!(store.set(&schemas, e, "Health", good).is_ok());
    assert_eq!(store.get(e, "Health").and_then(|v| v.get("current")).and_then(Value::as_i64), Some(10));

    let bad = Value::object([("current", Value::Int(10))]);
    assert!(store.set(&schemas, e, "Health", bad).is_err());
}

#[test]
fn entities_with_all_is_intersection_ascending() {
    let schemas = registry_with_health();
    let mut store = ComponentStore::new();
    let mut entities = EntityStore::new();
    let (e1, e2, e3) = (entities.spawn(), entities.spawn(), entities.spawn());

    let hp = Value::object([("current", Value::Int(1)), ("max", Value::Int(1))]);
    store.set(&schemas, e1, "Health", hp.clone()).unwrap();
    store.set(&schemas, e3, "Health", hp).unwrap();

    assert_eq!(store.entities_with("Health"), vec![e1, e3]);
    assert!(!store.entities_with("Health").contains(&e2));
}

#[test]
fn remove_entity_drops_every_kind() {
    let schemas = registry_with_health();
    let mut store = ComponentStore::new();
    let mut entities = EntityStore::new();
    let e = entities.spawn();
    store
        .set(&schemas, e, "Health", Value::object([("current", Value::Int(1)), ("max", Value::Int(1))]))
        .unwrap();
    store.remove_entity(e);
    assert!(store.get(e, "Health").is_none());
}
