mod decay;
mod deaths;
mod job_system;
mod resource_reservation;
mod time_of_day_system;

pub use decay::DecaySystem;
pub use deaths::{DeathsSystem, DEFAULT_DECAY_TICKS};
pub use job_system::JobSystem;
pub use resource_reservation::ResourceReservationSystem;
pub use time_of_day_system::TimeOfDaySystem;
