//! Simulation modes and the native systems each one runs.
//!
//! Which native systems each mode gates is recorded here and in DESIGN.md:
//! `colony` runs every native system; `roguelike` skips the two
//! colony-economy systems (`ResourceReservationSystem`, `DecaySystem`) that
//! a turn-based dungeon crawl has no use for, keeping job assignment,
//! death handling, and the clock.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Colony,
    Roguelike,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Colony => "colony",
            Mode::Roguelike => "roguelike",
        }
    }

    pub fn parse(name: &str) -> Option<Mode> {
        match name {
            "colony" => Some(Mode::Colony),
            "roguelike" => Some(Mode::Roguelike),
            _ => None,
        }
    }

    /// Native system names, in the fixed order `SystemRegistry` runs them,
    /// that this mode's tick loop runs.
    pub fn native_systems(self) -> &'static [&'static str] {
        match self {
            Mode::Colony => {
                &["JobSystem", "ResourceReservationSystem", "DecaySystem", "DeathsSystem", "TimeOfDaySystem"]
            }
            Mode::Roguelike => &["JobSystem", "DeathsSystem", "TimeOfDaySystem"],
        }
    }

    pub fn available() -> &'static [Mode] {
        &[Mode::Colony, Mode::Roguelike]
    }
}
