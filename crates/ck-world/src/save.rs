//! Save-file serialization.
//!
//! `save_to_file`/`load_from_file` round-trip the full `World` state to/from
//! a JSON object with `mode`, `turn`, `entities`, `map`, `time_of_day`, plus
//! a fifth `job_event_log` key so replay history survives the round trip
//! too (see DESIGN.md).
//!
//! Grounded on `dt-output::row`'s typed-row-then-serialize shape, narrowed
//! (as `ck-events::log` already does for the job event log alone) to the
//! single JSON-object format this kernel needs.

use std::path::Path;

use ck_core::{value_from_json, value_to_json, EntityId, Value};
use ck_map::{CellKey, MapIndex, Topology};
use ck_systems::TimeOfDay;

use crate::error::{WorldError, WorldResult};
use crate::mode::Mode;

pub(crate) fn map_to_json(map: &MapIndex) -> serde_json::Value {
    let topology = map.topology_type();
    let cells: Vec<serde_json::Value> = map
        .all_cells()
        .into_iter()
        .map(|key| {
            let neighbors: Vec<serde_json::Value> =
                map.get_neighbors(key).into_iter().map(cell_key_to_json).collect();
            let metadata = map
                .get_cell_metadata(key)
                .map(|fields| {
                    serde_json::Value::Object(
                        fields.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect(),
                    )
                })
                .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
            let mut entry = cell_key_to_json(key);
            if let serde_json::Value::Object(obj) = &mut entry {
                obj.insert("neighbors".to_string(), serde_json::Value::Array(neighbors));
                obj.insert("metadata".to_string(), metadata);
            }
            entry
        })
        .collect();

    serde_json::json!({
        "topology": topology.map(|t| match t {
            Topology::Square => "square",
            Topology::Hex => "hex",
        }),
        "cells": cells,
    })
}

fn cell_key_to_json(key: CellKey) -> serde_json::Value {
    match key {
        CellKey::Square { x, y, z } => serde_json::json!({"x": x, "y": y, "z": z}),
        CellKey::Hex { q, r, z } => serde_json::json!({"q": q, "r": r, "z": z}),
    }
}

/// Rebuild a `MapIndex` from the object `map_to_json` produced: install
/// every cell, then every neighbor link, then every metadata field.
pub(crate) fn map_from_json(json: &serde_json::Value, path: &Path) -> WorldResult<MapIndex> {
    let malformed = |reason: &str| WorldError::MalformedSave { path: path.to_path_buf(), reason: reason.to_string() };

    let topology = match json.get("topology").and_then(|v| v.as_str()) {
        Some("square") => Some(Topology::Square),
        Some("hex") => Some(Topology::Hex),
        Some(other) => return Err(malformed(&format!("unknown map topology {other:?}"))),
        None => None,
    };
    let mut index = match topology {
        Some(t) => MapIndex::new(t),
        None => MapIndex::default(),
    };
    let Some(topology) = topology else {
        return Ok(index);
    };

    let cells = json.get("cells").and_then(|v| v.as_array()).ok_or_else(|| malformed("missing `cells`"))?;

    let mut parsed: Vec<(CellKey, Vec<CellKey>, Value)> = Vec::with_capacity(cells.len());
    for cell in cells {
        let key = parse_key(topology, cell, path)?;
        let neighbors = cell
            .get("neighbors")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().map(|n| parse_key(topology, n, path)).collect::<WorldResult<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();
        let metadata = cell.get("metadata").map(value_from_json).unwrap_or_else(Value::map);
        parsed.push((key, neighbors, metadata));
    }

    for (key, _, _) in &parsed {
        index.add_cell(*key);
    }
    for (key, neighbors, _) in &parsed {
        for neighbor in neighbors {
            index.add_cell(*neighbor);
            index.add_neighbor(*key, *neighbor);
        }
    }
    for (key, _, metadata) in &parsed {
        if let Some(fields) = metadata.as_map() {
            for (field, value) in fields {
                index.set_cell_metadata_field(*key, field.clone(), value.clone());
            }
        }
    }

    Ok(index)
}

fn parse_key(topology: Topology, json: &serde_json::Value, path: &Path) -> WorldResult<CellKey> {
    let malformed = |reason: &str| WorldError::MalformedSave { path: path.to_path_buf(), reason: reason.to_string() };
    let field = |name: &str| -> WorldResult<i64> {
        json.get(name).and_then(|v| v.as_i64()).ok_or_else(|| malformed(&format!("missing `{name}`")))
    };
    match topology {
        Topology::Square => Ok(CellKey::Square { x: field("x")?, y: field("y")?, z: field("z")? }),
        Topology::Hex => Ok(CellKey::Hex { q: field("q")?, r: field("r")?, z: field("z")? }),
    }
}

pub(crate) fn time_of_day_to_json(time_of_day: &TimeOfDay) -> serde_json::Value {
    serde_json::json!({"hour": time_of_day.hour, "minute": time_of_day.minute})
}

pub(crate) fn time_of_day_from_json(json: &serde_json::Value, path: &Path) -> WorldResult<TimeOfDay> {
    let malformed = |reason: &str| WorldError::MalformedSave { path: path.to_path_buf(), reason: reason.to_string() };
    let hour = json.get("hour").and_then(|v| v.as_u64()).ok_or_else(|| malformed("missing `time_of_day.hour`"))?;
    let minute =
        json.get("minute").and_then(|v| v.as_u64()).ok_or_else(|| malformed("missing `time_of_day.minute`"))?;
    Ok(TimeOfDay { hour: hour as u32, minute: minute as u32 })
}

pub(crate) fn entity_to_json(id: EntityId, components: &std::collections::BTreeMap<String, Value>) -> serde_json::Value {
    serde_json::json!({
        "id": id.get(),
        "components": serde_json::Value::Object(
            components.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect(),
        ),
    })
}

pub(crate) fn mode_to_json(mode: Mode) -> serde_json::Value {
    serde_json::Value::String(mode.as_str().to_string())
}

pub(crate) fn mode_from_json(json: &serde_json::Value, path: &Path) -> WorldResult<Mode> {
    let malformed = |reason: &str| WorldError::MalformedSave { path: path.to_path_buf(), reason: reason.to_string() };
    let name = json.as_str().ok_or_else(|| malformed("`mode` is not a string"))?;
    Mode::parse(name).ok_or_else(|| malformed(&format!("unknown mode {name:?}")))
}
