//! The turn counter, the kernel's analogue of `dt-core::Tick`.
//!
//! `dt-core::Tick` maps an integer tick to wall-clock seconds via a fixed
//! `tick_duration_secs`. The kernel has no wall clock to synchronize with —
//! `tick()` only ever advances by exactly one turn — so `Turn` drops the
//! clock-conversion arithmetic and keeps just the monotonic counter.
//! (The in-world clock that actually advances by a sub-day unit lives at
//! `ck_systems::TimeOfDay`, next to the native system that drives it.)

use std::fmt;

/// The simulation's turn counter. Advances by exactly one per `World::tick`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Turn(pub u64);

impl Turn {
    pub const ZERO: Turn = Turn(0);

    #[inline]
    pub fn next(self) -> Turn {
        Turn(self.0 + 1)
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn {}", self.0)
    }
}
