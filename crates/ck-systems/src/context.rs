use ck_ecs::{ComponentStore, EntityStore};
use ck_job::{JobBoard, JobEngine};
use ck_map::MapIndex;
use ck_schema::SchemaRegistry;

use crate::time_of_day::TimeOfDay;

/// Borrowed handles to everything a system might touch during one run.
///
/// Mirrors `dt_behavior::SimContext`'s "bundle of borrows, built fresh each
/// tick" shape, widened from read-only agent/plan slices to the mutable
/// component/job/map state a turn-based world mutates in place.
pub struct SystemContext<'a> {
    pub entities: &'a mut EntityStore,
    pub components: &'a mut ComponentStore,
    pub schemas: &'a SchemaRegistry,
    pub map: &'a mut MapIndex,
    pub jobs: &'a mut JobEngine,
    pub board: &'a mut JobBoard,
    pub time_of_day: &'a mut TimeOfDay,
}
