//! Turns dead entities into corpses: any entity whose `Health.current` has
//! reached zero and isn't already a `Corpse` gets a `Corpse` marker and a
//! `Decay` countdown, and loses its `Health` component.

use ck_core::Value;

use crate::context::SystemContext;
use crate::error::SystemResult;
use crate::event::SystemEvent;
use crate::system::System;

/// Number of `DecaySystem` ticks a fresh corpse survives before it's
/// despawned entirely.
pub const DEFAULT_DECAY_TICKS: i64 = 6;

#[derive(Default)]
pub struct DeathsSystem;

impl System for DeathsSystem {
    fn run(&mut self, ctx: &mut SystemContext) -> SystemResult<Vec<SystemEvent>> {
        let mut events = Vec::new();

        let dead: Vec<_> = ctx
            .components
            .entities_with("Health")
            .into_iter()
            .filter(|&entity| {
                let current = ctx.components.get(entity, "Health").and_then(|h| h.get("current")).and_then(Value::as_i64);
                current.is_some_and(|current| current <= 0) && ctx.components.get(entity, "Corpse").is_none()
            })
            .collect();

        for entity in dead {
            ctx.components.set(ctx.schemas, entity, "Corpse", Value::map())?;
            ctx.components.set(
                ctx.schemas,
                entity,
                "Decay",
                Value::object([("ticks_remaining", Value::Int(DEFAULT_DECAY_TICKS))]),
            )?;
            ctx.components.remove(entity, "Health");
            events.push(SystemEvent::ecs("entity_died", Value::object([("entity", Value::Int(entity.get() as i64))])));
        }

        Ok(events)
    }
}
