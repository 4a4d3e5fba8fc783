use crate::context::SystemContext;
use crate::error::SystemResult;
use crate::event::SystemEvent;
use crate::system::System;

#[derive(Default)]
pub struct TimeOfDaySystem;

impl System for TimeOfDaySystem {
    fn run(&mut self, ctx: &mut SystemContext) -> SystemResult<Vec<SystemEvent>> {
        ctx.time_of_day.advance();
        Ok(Vec::new())
    }
}
