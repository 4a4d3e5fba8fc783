//! Integration tests for the `World` facade, constructed against a small
//! temporary schema directory (mirroring the real `schemas/*.json` files
//! closely enough to exercise validation, not a permissive stand-in) so
//! `World::new`/`load_from_file` are exercised exactly as an embedder would
//! use them.

use ck_core::Value;
use ck_job::Policy;
use ck_map::CellKey;

use crate::config::WorldConfig;
use crate::mode::Mode;
use crate::world::World;

struct SchemaDir {
    path: std::path::PathBuf,
}

impl SchemaDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("ck-world-test-schemas-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&path).unwrap();
        let permissive = serde_json::json!({"type": "object"});
        for kind in [
        "Job", "Agent", "Stockpile", "Health", "Corpse", "Decay", "Position", "Map", "Item", "Inventory", "Equipment",
        "Body", "Region", "ProductionJob",
    ] {
            std::fs::write(path.join(format!("{kind}.json")), permissive.to_string()).unwrap();
        }
        Self { path }
    }
}

impl Drop for SchemaDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.path).ok();
    }
}

fn test_world() -> (SchemaDir, World) {
    let dir = SchemaDir::new();
    let world = World::new(&dir.path).unwrap();
    (dir, world)
}

fn agent_value() -> Value {
    Value::object([("entity_id", Value::Int(0)), ("skills", Value::object([("gather", Value::Float(1.0))]))])
}

#[test]
fn spawn_and_despawn_cascades_components() {
    let (_dir, mut w) = test_world();
    let e = w.spawn();
    w.set_component(e, "Health", Value::object([("current", Value::Int(5)), ("max", Value::Int(10))])).unwrap();
    assert!(w.get_component(e, "Health").is_some());

    assert!(w.despawn(e));
    assert!(!w.is_alive(e));
    assert!(w.get_component(e, "Health").is_none());
    // A second despawn is a no-op, not an error.
    assert!(!w.despawn(e));
}

#[test]
fn position_component_syncs_map_reverse_index() {
    let (_dir, mut w) = test_world();
    w.add_cell(CellKey::Square { x: 0, y: 0, z: 0 });
    let e = w.spawn();

    w.set_component(
        e,
        "Position",
        Value::object([(
            "pos",
            Value::object([("Square", Value::object([("x", 0.into()), ("y", 0.into()), ("z", 0.into())]))]),
        )]),
    )
    .unwrap();

    assert_eq!(w.entities_in_cell(CellKey::Square { x: 0, y: 0, z: 0 }), vec![e]);

    w.remove_component(e, "Position");
    assert!(w.entities_in_cell(CellKey::Square { x: 0, y: 0, z: 0 }).is_empty());
}

#[test]
fn despawning_an_agent_unassigns_its_jobs() {
    let (_dir, mut w) = test_world();
    let agent = w.spawn();
    w.set_component(agent, "Agent", agent_value()).unwrap();
    let job = w.spawn();
    w.assign_job(job, "gather", Value::object([])).unwrap();
    w.ai_modify_job_assignment(job, Some(agent)).unwrap();
    assert_eq!(w.get_job(job).unwrap().get("assigned_to").and_then(Value::as_i64), Some(agent.get() as i64));

    w.despawn(agent);
    assert!(w.get_job(job).unwrap().get("assigned_to").unwrap().is_null());
}

#[test]
fn tick_advances_turn_and_flushes_events() {
    let (_dir, mut w) = test_world();
    w.set_mode(Mode::Roguelike);
    assert_eq!(w.turn().0, 0);
    w.tick().unwrap();
    assert_eq!(w.turn().0, 1);
}

#[test]
fn job_assignment_and_state_advance_emits_events() {
    let (_dir, mut w) = test_world();
    let agent = w.spawn();
    w.set_component(agent, "Agent", agent_value()).unwrap();
    let job = w.spawn();
    w.assign_job(job, "gather", Value::object([])).unwrap();
    w.ai_modify_job_assignment(job, Some(agent)).unwrap();

    w.update_event_buses();
    let assigned = w.poll_job_event("job_assigned");
    assert_eq!(assigned.len(), 1);

    let transition = w.advance_job_state(job).unwrap();
    assert!(transition.is_some());
    assert!(!w.get_job_event_log().is_empty());
}

#[test]
fn job_board_policy_orders_by_priority() {
    let (_dir, mut w) = test_world();
    w.set_policy(Policy::Priority);
    let low = w.spawn();
    w.assign_job(low, "gather", Value::object([("priority", 1.into())])).unwrap();
    let high = w.spawn();
    w.assign_job(high, "gather", Value::object([("priority", 5.into())])).unwrap();

    let board = w.get_job_board();
    assert_eq!(board, vec![high, low]);
}

#[test]
fn save_and_load_round_trips_world_state() {
    let (dir, mut w) = test_world();
    let save_path = dir.path.join("save.json");

    w.add_cell(CellKey::Square { x: 0, y: 0, z: 0 });
    w.add_cell(CellKey::Square { x: 1, y: 0, z: 0 });
    w.add_neighbor(CellKey::Square { x: 0, y: 0, z: 0 }, CellKey::Square { x: 1, y: 0, z: 0 });
    let agent = w.spawn();
    w.set_component(agent, "Agent", agent_value()).unwrap();
    w.tick().unwrap();

    w.save_to_file(&save_path).unwrap();
    let mut reloaded = World::load_from_file(&dir.path, WorldConfig::default(), &save_path).unwrap();

    assert_eq!(reloaded.turn(), w.turn());
    assert!(reloaded.is_alive(agent));
    assert_eq!(reloaded.get_component(agent, "Agent"), w.get_component(agent, "Agent"));
    assert_eq!(reloaded.all_cells().len(), 2);

    // Entity ids allocated after a reload never collide with restored ones.
    let next = reloaded.spawn();
    assert!(next.get() > agent.get());
}

#[test]
fn equip_item_moves_item_from_inventory_into_slot() {
    let (_dir, mut w) = test_world();
    let agent = w.spawn();
    let item = w.spawn();
    w.set_component(item, "Item", Value::object([("id", "sword".into()), ("name", "Sword".into()), ("slot", "right_hand".into())])).unwrap();
    w.add_item_to_inventory(agent, "sword").unwrap();

    w.equip_item(agent, "sword", "right_hand").unwrap();

    let equipment = w.get_equipment(agent).unwrap();
    assert_eq!(equipment.get("slots").unwrap().get("right_hand").and_then(Value::as_str), Some("sword"));
}

#[test]
fn equip_item_rejects_mismatched_slot() {
    let (_dir, mut w) = test_world();
    let agent = w.spawn();
    let item = w.spawn();
    w.set_component(item, "Item", Value::object([("id", "sword".into()), ("name", "Sword".into()), ("slot", "right_hand".into())])).unwrap();
    w.add_item_to_inventory(agent, "sword").unwrap();

    let err = w.equip_item(agent, "sword", "left_foot").unwrap_err();
    assert!(err.to_string().contains("invalid slot"));
}

#[test]
fn equip_item_rejects_item_not_in_inventory() {
    let (_dir, mut w) = test_world();
    let agent = w.spawn();
    let item = w.spawn();
    w.set_component(item, "Item", Value::object([("id", "sword".into()), ("name", "Sword".into()), ("slot", "right_hand".into())])).unwrap();

    let err = w.equip_item(agent, "sword", "right_hand").unwrap_err();
    assert!(err.to_string().contains("not in inventory"));
}

#[test]
fn equip_item_rejects_already_occupied_slot() {
    let (_dir, mut w) = test_world();
    let agent = w.spawn();
    for (id, name) in [("sword", "Sword"), ("axe", "Axe")] {
        let item = w.spawn();
        w.set_component(item, "Item", Value::object([("id", id.into()), ("name", name.into()), ("slot", "right_hand".into())])).unwrap();
        w.add_item_to_inventory(agent, id).unwrap();
    }
    w.equip_item(agent, "sword", "right_hand").unwrap();

    let err = w.equip_item(agent, "axe", "right_hand").unwrap_err();
    assert!(err.to_string().contains("already equipped"));
}

#[test]
fn unequip_item_clears_the_slot() {
    let (_dir, mut w) = test_world();
    let agent = w.spawn();
    let item = w.spawn();
    w.set_component(item, "Item", Value::object([("id", "sword".into()), ("name", "Sword".into()), ("slot", "right_hand".into())])).unwrap();
    w.add_item_to_inventory(agent, "sword").unwrap();
    w.equip_item(agent, "sword", "right_hand").unwrap();

    w.unequip_item(agent, "right_hand").unwrap();
    assert!(w.get_equipment(agent).unwrap().get("slots").unwrap().get("right_hand").unwrap().is_null());
}

#[test]
fn remove_item_from_inventory_out_of_bounds_errors() {
    let (_dir, mut w) = test_world();
    let agent = w.spawn();
    w.set_inventory(agent, Value::object([("slots", Value::seq()), ("weight", 0.0.into()), ("volume", 0.0.into())])).unwrap();
    assert!(w.remove_item_from_inventory(agent, 0).is_err());
}

#[test]
fn get_available_modes_lists_both_modes() {
    let (_dir, w) = test_world();
    assert_eq!(w.get_available_modes(), Mode::available());
}

#[test]
fn unknown_system_name_errors() {
    let (_dir, mut w) = test_world();
    assert!(w.run_system("NoSuchSystem").is_err());
}

fn body_part(name: &str) -> Value {
    Value::object([
        ("name", name.into()),
        ("status", "healthy".into()),
        ("kind", "flesh".into()),
        ("temperature", 37.0.into()),
        ("ideal_temperature", 37.0.into()),
        ("insulation", 1.0.into()),
        ("heat_loss", 0.1.into()),
        ("children", Value::seq()),
        ("equipped", Value::seq()),
    ])
}

#[test]
fn body_get_set_round_trips_the_parts_tree() {
    let (_dir, mut w) = test_world();
    let e = w.spawn();
    w.set_body(e, Value::object([("parts", Value::Seq(vec![body_part("torso")]))])).unwrap();
    let got = w.get_body(e).unwrap();
    assert_eq!(got.get("parts").unwrap().as_seq().unwrap()[0].get("name").and_then(Value::as_str), Some("torso"));
}

#[test]
fn add_and_remove_body_part_reaches_a_nested_child() {
    let (_dir, mut w) = test_world();
    let e = w.spawn();
    w.set_body(e, Value::object([("parts", Value::seq())])).unwrap();

    w.add_body_part(e, body_part("torso")).unwrap();
    let mut body = w.get_body(e).unwrap().clone();
    let torso = body.as_map_mut().unwrap().get_mut("parts").unwrap().as_seq_mut().unwrap().get_mut(0).unwrap();
    torso.as_map_mut().unwrap().insert("children".to_string(), Value::Seq(vec![body_part("left_arm")]));
    w.set_body(e, body).unwrap();

    let body = w.get_body(e).unwrap();
    let torso = &body.get("parts").unwrap().as_seq().unwrap()[0];
    assert_eq!(torso.get("children").unwrap().as_seq().unwrap().len(), 1);

    w.remove_body_part(e, "left_arm").unwrap();
    let body = w.get_body(e).unwrap();
    let torso = &body.get("parts").unwrap().as_seq().unwrap()[0];
    assert!(torso.get("children").unwrap().as_seq().unwrap().is_empty());
}

#[test]
fn get_body_part_finds_a_top_level_part() {
    let (_dir, mut w) = test_world();
    let e = w.spawn();
    w.set_body(e, Value::object([("parts", Value::seq())])).unwrap();
    w.add_body_part(e, body_part("torso")).unwrap();

    let torso = w.get_body_part(e, "torso").unwrap();
    assert_eq!(torso.get("status").and_then(Value::as_str), Some("healthy"));
    assert!(w.get_body_part(e, "nonexistent").is_none());
}

#[test]
fn region_queries_match_string_and_list_ids_and_kind() {
    let (_dir, mut w) = test_world();
    let e1 = w.spawn();
    w.set_component(e1, "Region", Value::object([("id", "room_1".into()), ("kind", "room".into())])).unwrap();
    let e2 = w.spawn();
    w.set_component(
        e2,
        "Region",
        Value::object([("id", Value::Seq(vec!["room_1".into(), "biome_A".into()])), ("kind", "room".into())]),
    )
    .unwrap();
    let e3 = w.spawn();
    w.set_component(e3, "Region", Value::object([("id", "biome_A".into()), ("kind", "biome".into())])).unwrap();

    assert_eq!(w.get_entities_in_region("room_1").len(), 2);
    assert_eq!(w.get_entities_in_region("biome_A").len(), 2);
    assert_eq!(w.get_entities_in_region_kind("room").len(), 2);
    assert_eq!(w.get_entities_in_region_kind("biome").len(), 1);
}

#[test]
fn assign_move_path_wires_the_pathfinder_into_the_agent_component() {
    let (_dir, mut w) = test_world();
    for x in 0..3 {
        for y in 0..3 {
            w.add_cell(CellKey::Square { x, y, z: 0 });
        }
    }
    for x in 0..3 {
        for y in 0..3 {
            if x < 2 {
                w.add_neighbor(CellKey::Square { x, y, z: 0 }, CellKey::Square { x: x + 1, y, z: 0 });
                w.add_neighbor(CellKey::Square { x: x + 1, y, z: 0 }, CellKey::Square { x, y, z: 0 });
            }
            if y < 2 {
                w.add_neighbor(CellKey::Square { x, y, z: 0 }, CellKey::Square { x, y: y + 1, z: 0 });
                w.add_neighbor(CellKey::Square { x, y: y + 1, z: 0 }, CellKey::Square { x, y, z: 0 });
            }
        }
    }

    let agent = w.spawn();
    w.set_component(agent, "Agent", Value::object([("entity_id", Value::Int(agent.get() as i64)), ("move_path", Value::seq())]))
        .unwrap();
    w.set_component(
        agent,
        "Position",
        Value::object([("pos", Value::object([("Square", Value::object([("x", 0.into()), ("y", 0.into()), ("z", 0.into())]))]))]),
    )
    .unwrap();

    let from = Value::object([("Square", Value::object([("x", 0.into()), ("y", 0.into()), ("z", 0.into())]))]);
    let to = Value::object([("Square", Value::object([("x", 2.into()), ("y", 2.into()), ("z", 0.into())]))]);

    w.assign_move_path(agent, &from, &to).unwrap();

    assert!(!w.is_move_path_empty(agent));
    assert!(w.is_agent_at_cell(agent, &from));
    assert!(!w.is_agent_at_cell(agent, &to));
}

#[test]
fn is_move_path_empty_defaults_true_without_agent_or_field() {
    let (_dir, mut w) = test_world();
    let e = w.spawn();
    assert!(w.is_move_path_empty(e));

    w.set_component(e, "Agent", Value::object([("entity_id", Value::Int(e.get() as i64))])).unwrap();
    assert!(w.is_move_path_empty(e));

    w.set_component(e, "Agent", Value::object([("entity_id", Value::Int(e.get() as i64)), ("move_path", Value::seq())]))
        .unwrap();
    assert!(w.is_move_path_empty(e));
}

#[test]
fn production_job_progress_and_state_accessors_round_trip() {
    let (_dir, mut w) = test_world();
    let e = w.spawn();
    w.set_component(
        e,
        "ProductionJob",
        Value::object([("state", "pending".into()), ("progress", Value::Int(0)), ("recipe", "wood_plank".into())]),
    )
    .unwrap();

    assert_eq!(w.get_production_job_progress(e), Some(0));
    assert_eq!(w.get_production_job_state(e), Some("pending"));

    w.set_production_job_state(e, "in_progress").unwrap();
    w.set_production_job_progress(e, 2).unwrap();

    assert_eq!(w.get_production_job_progress(e), Some(2));
    assert_eq!(w.get_production_job_state(e), Some("in_progress"));
}

#[test]
fn stockpile_and_production_job_reads_clear_on_removal() {
    let (_dir, mut w) = test_world();
    let e = w.spawn();
    w.set_component(e, "Stockpile", Value::object([("resources", Value::object([("wood", Value::Int(5))]))])).unwrap();
    w.set_component(
        e,
        "ProductionJob",
        Value::object([("recipe", "wood_plank".into()), ("progress", Value::Int(0)), ("state", "pending".into())]),
    )
    .unwrap();

    assert_eq!(w.get_stockpile_resources(e).unwrap().get("wood").and_then(Value::as_i64), Some(5));
    let job = w.get_production_job(e).unwrap();
    assert_eq!(job.get("recipe").and_then(Value::as_str), Some("wood_plank"));

    w.remove_component(e, "Stockpile");
    assert!(w.get_stockpile_resources(e).is_none());
    w.remove_component(e, "ProductionJob");
    assert!(w.get_production_job(e).is_none());
}
