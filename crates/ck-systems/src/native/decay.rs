//! Counts down `Decay.ticks_remaining` on every corpse; despawns the entity
//! once it reaches zero.

use ck_core::Value;

use crate::context::SystemContext;
use crate::error::SystemResult;
use crate::event::SystemEvent;
use crate::system::System;

#[derive(Default)]
pub struct DecaySystem;

impl System for DecaySystem {
    fn run(&mut self, ctx: &mut SystemContext) -> SystemResult<Vec<SystemEvent>> {
        let mut events = Vec::new();

        for entity in ctx.components.entities_with("Decay") {
            let Some(decay) = ctx.components.get(entity, "Decay").cloned() else { continue };
            let remaining = decay.get("ticks_remaining").and_then(Value::as_i64).unwrap_or(0) - 1;

            if remaining <= 0 {
                ctx.components.remove_entity(entity);
                ctx.entities.despawn(entity);
                events.push(SystemEvent::ecs("entity_decayed", Value::object([("entity", Value::Int(entity.get() as i64))])));
            } else {
                ctx.components.set(
                    ctx.schemas,
                    entity,
                    "Decay",
                    Value::object([("ticks_remaining", Value::Int(remaining))]),
                )?;
            }
        }

        Ok(events)
    }
}
