//! The process-wide worldgen plugin table — the one intentionally global
//! piece of state in the kernel, modeled as a process-wide map with
//! explicit init/teardown.
//!
//! Every other registry in the kernel (schemas, job handlers, systems, map
//! validators/postprocessors) lives on a `World` instance. This one is
//! process-wide because worldgen plugins are registered by the host once,
//! at process startup, and then invoked by name from any world — mirroring
//! how `dt-spatial::osm`'s network loader is a free function the host calls
//! once to produce a `RoadNetwork`, rather than a method on `Sim`.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use ck_core::Value;

use crate::error::{WorldgenError, WorldgenResult};

/// A worldgen procedure: takes generation parameters, returns a generated
/// map document (the same `{topology, cells}` shape `apply_generated_map`
/// consumes). Generalizes `JobHandler`'s single `invoke` method to worldgen
/// plugins, matching the same externally-supplied-callback shape used
/// throughout the kernel.
pub trait WorldgenPlugin: Send + Sync {
    fn invoke(&self, params: &Value) -> Result<Value, String>;
}

impl<F> WorldgenPlugin for F
where
    F: Fn(&Value) -> Result<Value, String> + Send + Sync,
{
    fn invoke(&self, params: &Value) -> Result<Value, String> {
        self(params)
    }
}

fn registry() -> &'static Mutex<HashMap<String, Box<dyn WorldgenPlugin>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, Box<dyn WorldgenPlugin>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register `plugin` under `name`, replacing any plugin already registered
/// there.
pub fn register_worldgen_plugin(name: impl Into<String>, plugin: Box<dyn WorldgenPlugin>) {
    registry().lock().unwrap_or_else(|p| p.into_inner()).insert(name.into(), plugin);
}

pub fn list_worldgen_plugins() -> Vec<String> {
    registry().lock().unwrap_or_else(|p| p.into_inner()).keys().cloned().collect()
}

/// Invoke the plugin registered under `name`. `NotFound` if no plugin is
/// registered under that name.
pub fn run_worldgen_plugin(name: &str, params: &Value) -> WorldgenResult<Value> {
    let table = registry().lock().unwrap_or_else(|p| p.into_inner());
    let plugin = table.get(name).ok_or_else(|| WorldgenError::NotFound(name.to_string()))?;
    plugin.invoke(params).map_err(WorldgenError::Plugin)
}

/// Reset the table to empty. Mainly useful for tests that otherwise leak
/// plugin registrations across test functions via the shared process-wide
/// table.
pub fn init_worldgen_registry() {
    *registry().lock().unwrap_or_else(|p| p.into_inner()) = HashMap::new();
}

/// Alias for [`init_worldgen_registry`] — the table has no resources to
/// release beyond the entries themselves, so teardown and (re-)init are the
/// same operation.
pub fn teardown_worldgen_registry() {
    init_worldgen_registry();
}
