//! `ck-world` — the composition root. Everything else in the workspace is a
//! subsystem `World` owns and routes events between; this crate is the one
//! an embedder actually depends on.
//!
//! | Module      | Contents                                            |
//! |-------------|------------------------------------------------------|
//! | [`world`]   | `World` — the facade over every subsystem           |
//! | [`builder`] | `WorldBuilder`                                       |
//! | [`config`]  | `WorldConfig`, `PolicyConfig`                       |
//! | [`mode`]    | `Mode`                                               |
//! | [`save`]    | save-file (de)serialization helpers                  |
//! | [`error`]   | `WorldError`, `WorldResult`                          |

pub mod builder;
pub mod config;
pub mod error;
pub mod logging;
pub mod mode;
pub mod save;
pub mod world;

#[cfg(test)]
mod tests;

pub use builder::WorldBuilder;
pub use config::{PolicyConfig, WorldConfig};
pub use error::{WorldError, WorldResult};
pub use logging::init_logging;
pub use mode::Mode;
pub use world::World;

// Re-export the subsystem types an embedder is expected to touch directly
// (registering systems, job handlers, worldgen plugins, ...) so a consumer
// only needs this one crate on its dependency line, the way `dt_sim` is the
// one crate `rust_dt`'s own binaries depend on.
pub use ck_core::{EntityId, Turn, Value};
pub use ck_ecs::{EcsError, EcsResult};
pub use ck_events::bus::EventSubscriber;
pub use ck_events::{EventsError, EventsResult, JobEvent, SubscriberId};
pub use ck_job::{JobError, JobHandler, JobResult, JobTransition, Policy, TransitionKind};
pub use ck_map::{CellKey, MapError, MapResult, PathResult, Topology};
pub use ck_schema::{SchemaError, SchemaNode, SchemaResult};
pub use ck_systems::{EventNamespace, System, SystemError, SystemEvent, SystemResult};
pub use ck_worldgen::{MapPostprocessor, MapValidator, WorldgenError, WorldgenResult};
