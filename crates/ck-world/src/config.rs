//! `WorldConfig` — the tick/job-board/mode defaults grouped the way
//! `dt_core::SimConfig` groups `Sim`'s tuning knobs, constructible directly
//! or loaded from TOML (`alfredjeanlab-oddjobs` and `preedep-jobweaver-rs`
//! both load their configs this way).

use std::path::Path;

use serde::{Deserialize, Serialize};

use ck_job::Policy;

use crate::error::{WorldError, WorldResult};
use crate::mode::Mode;

/// Mirrors `ck_job::Policy` with `serde` derives, so `WorldConfig` stays
/// (de)serializable without adding a `serde` dependency to `ck-job` for a
/// type only the facade's config layer needs to serialize.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyConfig {
    #[default]
    Priority,
    Fifo,
    Lifo,
}

impl From<PolicyConfig> for Policy {
    fn from(value: PolicyConfig) -> Policy {
        match value {
            PolicyConfig::Priority => Policy::Priority,
            PolicyConfig::Fifo => Policy::Fifo,
            PolicyConfig::Lifo => Policy::Lifo,
        }
    }
}

fn default_completion_threshold() -> i64 {
    3
}

fn default_tick_duration_ms() -> u64 {
    1000
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Nominal wall-clock duration of one turn. The kernel has no wall
    /// clock of its own to synchronize with (`ck_core::Turn` only ever
    /// advances by exactly one per `tick()`); this is carried through for
    /// embedders that want to pace real-time playback, the way
    /// `dt_core::SimConfig::tick_duration_secs` paces `dt_sim::Sim`.
    pub tick_duration_ms: u64,
    pub default_completion_threshold: i64,
    pub default_job_board_policy: PolicyConfig,
    pub initial_mode: Mode,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_duration_ms: default_tick_duration_ms(),
            default_completion_threshold: default_completion_threshold(),
            default_job_board_policy: PolicyConfig::default(),
            initial_mode: Mode::default(),
        }
    }
}

impl WorldConfig {
    /// Load a `WorldConfig` from a TOML file. `World::new(schema_dir)`
    /// never needs this, but it's available for embedders that want
    /// config-file-driven setup. Any field absent from the file keeps
    /// `WorldConfig::default`'s value.
    pub fn from_toml_file(path: &Path) -> WorldResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|err| WorldError::MalformedConfig { path: path.to_path_buf(), reason: err.to_string() })
    }
}
