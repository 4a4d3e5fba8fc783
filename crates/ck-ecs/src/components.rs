//! `ComponentStore` — generalizes `dt-agent::ComponentMap`'s
//! `HashMap<TypeId, Box<dyn ComponentVec>>` (fixed-length typed columns,
//! known at compile time) to `HashMap<String, BTreeMap<EntityId, Value>>`
//! (sparse, dynamically typed, validated against the Schema Registry on
//! every write rather than defaulted at registration time).
//!
//! A `BTreeMap<EntityId, Value>` per kind gives `entities_with` ascending
//! id order for free, the way `ComponentMap`'s `Vec<T>` gives ascending
//! `AgentId` order for free.

use std::collections::BTreeMap;

use ck_core::{EntityId, Value};
use ck_schema::SchemaRegistry;

use crate::error::EcsResult;

#[derive(Default)]
pub struct ComponentStore {
    kinds: BTreeMap<String, BTreeMap<EntityId, Value>>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `value` against `kind`'s schema, then store it for `entity`.
    /// Unknown kinds and schema violations both surface as `EcsError` —
    /// nothing is written on failure.
    pub fn set(
        &mut self,
        schemas: &SchemaRegistry,
        entity: EntityId,
        kind: &str,
        value: Value,
    ) -> EcsResult<()> {
        schemas.validate(kind, &value)?;
        self.kinds.entry(kind.to_string()).or_default().insert(entity, value);
        Ok(())
    }

    pub fn get(&self, entity: EntityId, kind: &str) -> Option<&Value> {
        self.kinds.get(kind)?.get(&entity)
    }

    /// Remove `entity`'s value for `kind`, returning it if present.
    pub fn remove(&mut self, entity: EntityId, kind: &str) -> Option<Value> {
        self.kinds.get_mut(kind)?.remove(&entity)
    }

    /// Drop every component kind recorded for `entity`. Called by
    /// `ck-world::World::despawn` as part of its cascade.
    pub fn remove_entity(&mut self, entity: EntityId) {
        for column in self.kinds.values_mut() {
            column.remove(&entity);
        }
    }

    /// Entities carrying a value for `kind`, in ascending id order.
    pub fn entities_with(&self, kind: &str) -> Vec<EntityId> {
        self.kinds.get(kind).map(|column| column.keys().copied().collect()).unwrap_or_default()
    }

    /// Entities carrying a value for every kind in `kinds`, in ascending id
    /// order.
    pub fn entities_with_all(&self, kinds: &[&str]) -> Vec<EntityId> {
        let Some((first, rest)) = kinds.split_first() else {
            return Vec::new();
        };
        self.entities_with(first)
            .into_iter()
            .filter(|e| rest.iter().all(|kind| self.get(*e, kind).is_some()))
            .collect()
    }

    /// Every `(kind, value)` pair recorded for `entity` — the per-entity
    /// view `ck-world::World::save_to_file` serializes.
    pub fn components_for_entity(&self, entity: EntityId) -> BTreeMap<String, Value> {
        self.kinds
            .iter()
            .filter_map(|(kind, column)| column.get(&entity).map(|value| (kind.clone(), value.clone())))
            .collect()
    }
}
