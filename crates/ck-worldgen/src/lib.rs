//! `ck-worldgen` — map postprocessors/validators and the process-wide
//! worldgen plugin table.
//!
//! | Module        | Contents                                         |
//! |----------------|----------------------------------------------------|
//! | [`map_apply`]  | `WorldgenRegistry`, `MapValidator`, `MapPostprocessor` |
//! | [`plugins`]    | the process-wide `WorldgenPlugin` table            |
//! | [`error`]      | `WorldgenError`, `WorldgenResult`                  |

pub mod error;
pub mod map_apply;
pub mod plugins;

#[cfg(test)]
mod tests;

pub use error::{WorldgenError, WorldgenResult};
pub use map_apply::{MapPostprocessor, MapValidator, WorldgenRegistry};
pub use plugins::{
    init_worldgen_registry, list_worldgen_plugins, register_worldgen_plugin, run_worldgen_plugin,
    teardown_worldgen_registry, WorldgenPlugin,
};
