//! Unit tests for map application and the worldgen plugin table.

use std::sync::{Arc, Mutex};

use ck_core::Value;
use ck_map::{CellKey, MapIndex, Topology};
use ck_schema::{SchemaNode, SchemaRegistry};

use crate::map_apply::WorldgenRegistry;
use crate::plugins::{
    init_worldgen_registry, list_worldgen_plugins, register_worldgen_plugin, run_worldgen_plugin,
};
use crate::WorldgenError;

fn schemas() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register_schema("Map", SchemaNode::parse("Map", &serde_json::json!({"type": "object"})).unwrap());
    registry
}

fn square_document() -> Value {
    serde_json::from_str::<serde_json::Value>(
        r#"{"topology":"square","cells":[
            {"x":0,"y":0,"z":0,"neighbors":[{"x":1,"y":0,"z":0}]},
            {"x":1,"y":0,"z":0,"neighbors":[{"x":0,"y":0,"z":0}]}
        ]}"#,
    )
    .map(|j| ck_core::value_from_json(&j))
    .unwrap()
}

#[test]
fn apply_generated_map_installs_cells_and_neighbors() {
    let schemas = schemas();
    let registry = WorldgenRegistry::new();
    let mut map = MapIndex::default();

    registry.apply_generated_map(&schemas, &mut map, &square_document()).unwrap();

    assert_eq!(map.topology_type(), Some(Topology::Square));
    assert_eq!(map.cell_count(), 2);
    assert_eq!(map.get_neighbors(CellKey::Square { x: 0, y: 0, z: 0 }), vec![CellKey::Square { x: 1, y: 0, z: 0 }]);
}

#[test]
fn failing_validator_rejects_and_leaves_map_untouched() {
    let schemas = schemas();
    let mut registry = WorldgenRegistry::new();
    registry.register_map_validator(Box::new(|_: &Value| false));
    let mut map = MapIndex::default();

    let err = registry.apply_generated_map(&schemas, &mut map, &square_document()).unwrap_err();
    assert!(matches!(err, WorldgenError::ValidationRejected(_)));
    assert_eq!(map.cell_count(), 0);
}

#[test]
fn failing_postprocessor_reverts_install() {
    let schemas = schemas();
    let mut registry = WorldgenRegistry::new();
    registry.register_map_postprocessor(Box::new(|_: &mut MapIndex| Err("boom".to_string())));
    let mut map = MapIndex::default();

    let err = registry.apply_generated_map(&schemas, &mut map, &square_document()).unwrap_err();
    assert!(matches!(err, WorldgenError::Plugin(_)));
    assert_eq!(map.cell_count(), 0, "a reverted apply must leave the map exactly as it was");
}

#[test]
fn postprocessor_can_decorate_installed_cells() {
    let schemas = schemas();
    let mut registry = WorldgenRegistry::new();
    registry.register_map_postprocessor(Box::new(|map: &mut MapIndex| {
        for cell in map.all_cells() {
            map.set_cell_metadata_field(cell, "decorated", Value::Bool(true));
        }
        Ok(())
    }));
    let mut map = MapIndex::default();
    registry.apply_generated_map(&schemas, &mut map, &square_document()).unwrap();

    let meta = map.get_cell_metadata(CellKey::Square { x: 0, y: 0, z: 0 }).unwrap();
    assert_eq!(meta.get("decorated"), Some(&Value::Bool(true)));
}

#[test]
fn apply_chunk_is_additive() {
    let schemas = schemas();
    let registry = WorldgenRegistry::new();
    let mut map = MapIndex::default();
    registry.apply_generated_map(&schemas, &mut map, &square_document()).unwrap();

    let chunk = serde_json::from_str::<serde_json::Value>(
        r#"{"topology":"square","cells":[{"x":2,"y":0,"z":0,"neighbors":[]}]}"#,
    )
    .map(|j| ck_core::value_from_json(&j))
    .unwrap();
    registry.apply_chunk(&schemas, &mut map, &chunk).unwrap();

    assert_eq!(map.cell_count(), 3);
}

#[test]
fn clear_validators_and_postprocessors_empties_them() {
    let mut registry = WorldgenRegistry::new();
    registry.register_map_validator(Box::new(|_: &Value| false));
    registry.clear_map_validators();
    registry.register_map_postprocessor(Box::new(|_: &mut MapIndex| Err("x".to_string())));
    registry.clear_map_postprocessors();

    let schemas = schemas();
    let mut map = MapIndex::default();
    registry.apply_generated_map(&schemas, &mut map, &square_document()).unwrap();
    assert_eq!(map.cell_count(), 2);
}

#[test]
fn worldgen_plugin_table_register_list_invoke() {
    init_worldgen_registry();
    let width_seen = Arc::new(Mutex::new(None));
    let captured = width_seen.clone();
    register_worldgen_plugin(
        "pygen",
        Box::new(move |params: &Value| {
            *captured.lock().unwrap() = params.get("width").and_then(Value::as_i64);
            Ok(Value::object([("cells", Value::seq())]))
        }),
    );

    assert!(list_worldgen_plugins().iter().any(|n| n == "pygen"));
    let result = run_worldgen_plugin("pygen", &Value::object([("width", Value::Int(5))])).unwrap();
    assert!(result.get("cells").is_some());
    assert_eq!(*width_seen.lock().unwrap(), Some(5));
}

#[test]
fn invoking_unknown_plugin_is_not_found() {
    init_worldgen_registry();
    let err = run_worldgen_plugin("nope", &Value::map()).unwrap_err();
    assert!(matches!(err, WorldgenError::NotFound(_)));
}
