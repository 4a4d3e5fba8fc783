//! Fluent builder for constructing a [`World`], mirroring
//! `dt_sim::SimBuilder`'s "required inputs at `new`, optional fields
//! fluent, validate in `build`" shape.

use std::path::PathBuf;

use crate::config::WorldConfig;
use crate::error::WorldResult;
use crate::world::World;

/// # Required inputs
///
/// - `schema_dir` — directory of `*.json` component schemas.
///
/// # Optional inputs (have defaults)
///
/// | Method      | Default                  |
/// |-------------|---------------------------|
/// | `.config(c)`| `WorldConfig::default()` |
pub struct WorldBuilder {
    schema_dir: PathBuf,
    config: Option<WorldConfig>,
}

impl WorldBuilder {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self { schema_dir: schema_dir.into(), config: None }
    }

    pub fn config(mut self, config: WorldConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> WorldResult<World> {
        World::with_config(&self.schema_dir, self.config.unwrap_or_default())
    }
}
