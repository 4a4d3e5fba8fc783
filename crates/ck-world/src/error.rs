//! `WorldError` — the one error type every facade operation surfaces
//! through, in the same aggregating shape as `dt_sim::SimError` wrapping
//! `dt_mobility::MobilityError`.

use std::path::PathBuf;

use thiserror::Error;

use ck_ecs::EcsError;
use ck_events::EventsError;
use ck_job::JobError;
use ck_map::MapError;
use ck_schema::SchemaError;
use ck_systems::SystemError;
use ck_worldgen::WorldgenError;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Events(#[from] EventsError),

    #[error(transparent)]
    Worldgen(#[from] WorldgenError),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("no entity with id {0}")]
    UnknownEntity(u64),

    #[error("unknown mode: {0}")]
    UnknownMode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed save file {path}: {reason}")]
    MalformedSave { path: PathBuf, reason: String },

    #[error("malformed config file {path}: {reason}")]
    MalformedConfig { path: PathBuf, reason: String },
}

pub type WorldResult<T> = Result<T, WorldError>;
