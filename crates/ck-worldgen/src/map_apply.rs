//! Map postprocessors and validators, and the `apply_generated_map`/
//! `apply_chunk` entry points that run them.

use ck_core::Value;
use ck_map::{CellKey, MapIndex, Topology};
use ck_schema::SchemaRegistry;

use crate::error::{WorldgenError, WorldgenResult};

/// A pure predicate over a generated map document, run before any cell is
/// installed. Returning `false` aborts `apply_generated_map`/`apply_chunk`
/// with `ValidationRejected("Map validator failed")` — unlike
/// [`MapPostprocessor`], a validator cannot mutate anything, so it takes
/// the document by shared reference and returns a plain `bool` rather than
/// the `invoke(value) -> value_or_error` shape used for other callbacks.
pub trait MapValidator: Send + Sync {
    fn invoke(&self, map: &Value) -> bool;
}

impl<F> MapValidator for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn invoke(&self, map: &Value) -> bool {
        self(map)
    }
}

/// Runs after cells and neighbors are installed, with mutable access to the
/// installed index (to decorate cells with metadata worldgen alone doesn't
/// know — resources, points of interest, ...). An `Err` aborts and the
/// installation is reverted as if `apply_generated_map`/`apply_chunk` had
/// never been called.
pub trait MapPostprocessor: Send + Sync {
    fn invoke(&self, map: &mut MapIndex) -> Result<(), String>;
}

impl<F> MapPostprocessor for F
where
    F: Fn(&mut MapIndex) -> Result<(), String> + Send + Sync,
{
    fn invoke(&self, map: &mut MapIndex) -> Result<(), String> {
        self(map)
    }
}

#[derive(Default)]
pub struct WorldgenRegistry {
    validators: Vec<Box<dyn MapValidator>>,
    postprocessors: Vec<Box<dyn MapPostprocessor>>,
}

impl WorldgenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_map_validator(&mut self, validator: Box<dyn MapValidator>) {
        self.validators.push(validator);
    }

    pub fn register_map_postprocessor(&mut self, postprocessor: Box<dyn MapPostprocessor>) {
        self.postprocessors.push(postprocessor);
    }

    pub fn clear_map_validators(&mut self) {
        self.validators.clear();
    }

    pub fn clear_map_postprocessors(&mut self) {
        self.postprocessors.clear();
    }

    /// Replace `map` wholesale with the map described by `document`:
    /// validate schema, run validators against the raw document, install
    /// every cell and neighbor link fresh, then run postprocessors against
    /// the newly installed index. `map` is left untouched unless every
    /// step succeeds.
    pub fn apply_generated_map(
        &self,
        schemas: &SchemaRegistry,
        map: &mut MapIndex,
        document: &Value,
    ) -> WorldgenResult<()> {
        self.apply(schemas, MapIndex::default(), map, document)
    }

    /// Install the cells described by `document` on top of `map`'s current
    /// contents (additive worldgen, e.g. streaming in a new region), under
    /// the same validate/install/postprocess/revert discipline as
    /// `apply_generated_map`.
    pub fn apply_chunk(
        &self,
        schemas: &SchemaRegistry,
        map: &mut MapIndex,
        document: &Value,
    ) -> WorldgenResult<()> {
        self.apply(schemas, map.clone(), map, document)
    }

    fn apply(
        &self,
        schemas: &SchemaRegistry,
        base: MapIndex,
        map: &mut MapIndex,
        document: &Value,
    ) -> WorldgenResult<()> {
        schemas.validate("Map", document)?;

        for validator in &self.validators {
            if !validator.invoke(document) {
                return Err(WorldgenError::ValidationRejected("Map validator failed".to_string()));
            }
        }

        let mut candidate = base;
        install(&mut candidate, document)?;

        for postprocessor in &self.postprocessors {
            if let Err(err) = postprocessor.invoke(&mut candidate) {
                tracing::warn!(error = %err, "map postprocessor failed, reverting apply");
                return Err(WorldgenError::Plugin(err));
            }
        }

        *map = candidate;
        Ok(())
    }
}

/// Parse a map document (`{"topology": ..., "cells": [...]}`) and install
/// every cell and neighbor link into `index`.
fn install(index: &mut MapIndex, document: &Value) -> WorldgenResult<()> {
    let topology_name = document
        .get("topology")
        .and_then(Value::as_str)
        .ok_or_else(|| WorldgenError::Malformed("missing `topology`".to_string()))?;
    let topology = match topology_name {
        "square" => Topology::Square,
        "hex" => Topology::Hex,
        other => return Err(WorldgenError::Malformed(format!("unknown topology {other:?}"))),
    };
    if index.topology_type().is_none() {
        *index = MapIndex::new(topology);
    }

    let cells = document
        .get("cells")
        .and_then(Value::as_seq)
        .ok_or_else(|| WorldgenError::Malformed("missing `cells`".to_string()))?;

    let keys: Vec<(CellKey, Vec<CellKey>)> = cells
        .iter()
        .map(|cell| parse_cell(topology, cell))
        .collect::<WorldgenResult<Vec<_>>>()?;

    for (key, _) in &keys {
        index.add_cell(*key);
    }
    for (key, neighbors) in &keys {
        for neighbor in neighbors {
            index.add_cell(*neighbor);
            index.add_neighbor(*key, *neighbor);
        }
    }
    Ok(())
}

fn parse_cell(topology: Topology, cell: &Value) -> WorldgenResult<(CellKey, Vec<CellKey>)> {
    let key = parse_key(topology, cell)?;
    let neighbors = cell
        .get("neighbors")
        .and_then(Value::as_seq)
        .map(|items| items.iter().map(|n| parse_key(topology, n)).collect::<WorldgenResult<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();
    Ok((key, neighbors))
}

fn parse_key(topology: Topology, cell: &Value) -> WorldgenResult<CellKey> {
    let field = |name: &str| -> WorldgenResult<i64> {
        cell.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| WorldgenError::Malformed(format!("missing `{name}`")))
    };
    match topology {
        Topology::Square => Ok(CellKey::Square { x: field("x")?, y: field("y")?, z: field("z")? }),
        Topology::Hex => Ok(CellKey::Hex { q: field("q")?, r: field("r")?, z: field("z")? }),
    }
}
