//! `SystemRegistry` — named, callable systems.
//!
//! Grounded on `dt_sim::Sim::run_ticks`'s "fixed native phases, then
//! behavior callbacks" split (`latch_core::ecs::system_registry`, the other
//! pack repo with a name-keyed system table, supplied the by-name lookup
//! idiom): five native systems run in a fixed order, then
//! externally-registered systems run once each in insertion order.

use crate::context::SystemContext;
use crate::error::{SystemError, SystemResult};
use crate::event::SystemEvent;
use crate::native::{DecaySystem, DeathsSystem, JobSystem, ResourceReservationSystem, TimeOfDaySystem};
use crate::system::System;

pub struct SystemRegistry {
    native: Vec<(&'static str, Box<dyn System>)>,
    external: Vec<(String, Box<dyn System>)>,
}

impl Default for SystemRegistry {
    fn default() -> Self {
        Self {
            native: vec![
                ("JobSystem", Box::new(JobSystem)),
                ("ResourceReservationSystem", Box::new(ResourceReservationSystem)),
                ("DecaySystem", Box::new(DecaySystem)),
                ("DeathsSystem", Box::new(DeathsSystem)),
                ("TimeOfDaySystem", Box::new(TimeOfDaySystem)),
            ],
            external: Vec::new(),
        }
    }
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace, in place) an external system under `name`.
    pub fn register_system(&mut self, name: impl Into<String>, system: Box<dyn System>) {
        let name = name.into();
        if let Some(slot) = self.external.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = system;
        } else {
            self.external.push((name, system));
        }
    }

    /// Run the system named `name`, native or external.
    pub fn run_system(&mut self, name: &str, ctx: &mut SystemContext) -> SystemResult<Vec<SystemEvent>> {
        if let Some((_, system)) = self.native.iter_mut().find(|(native_name, _)| *native_name == name) {
            return system.run(ctx);
        }
        if let Some((_, system)) = self.external.iter_mut().find(|(external_name, _)| external_name == name) {
            return system.run(ctx);
        }
        Err(SystemError::UnknownSystem(name.to_string()))
    }

    /// Run a native system by name, rejecting external names even if they
    /// happen to collide.
    pub fn run_native_system(&mut self, name: &str, ctx: &mut SystemContext) -> SystemResult<Vec<SystemEvent>> {
        match self.native.iter_mut().find(|(native_name, _)| *native_name == name) {
            Some((_, system)) => system.run(ctx),
            None => Err(SystemError::UnknownSystem(name.to_string())),
        }
    }

    /// Run every native system in fixed order, then every externally
    /// registered system in insertion order — the body of one tick.
    pub fn run_all(&mut self, ctx: &mut SystemContext) -> SystemResult<Vec<SystemEvent>> {
        let mut events = Vec::new();
        for (_, system) in &mut self.native {
            events.extend(system.run(ctx)?);
        }
        for (_, system) in &mut self.external {
            events.extend(system.run(ctx)?);
        }
        Ok(events)
    }

    pub fn list_native_systems(&self) -> Vec<&str> {
        self.native.iter().map(|(name, _)| *name).collect()
    }

    pub fn list_external_systems(&self) -> Vec<&str> {
        self.external.iter().map(|(name, _)| name.as_str()).collect()
    }
}
