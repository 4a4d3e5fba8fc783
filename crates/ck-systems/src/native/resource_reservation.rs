//! Automatically reserves resources for pending jobs that haven't already
//! claimed any — every pending job lacking a `reserved_resources` field
//! gets one filled in each tick.

use ck_core::Value;

use crate::context::SystemContext;
use crate::error::SystemResult;
use crate::event::SystemEvent;
use crate::system::System;

#[derive(Default)]
pub struct ResourceReservationSystem;

impl System for ResourceReservationSystem {
    fn run(&mut self, ctx: &mut SystemContext) -> SystemResult<Vec<SystemEvent>> {
        for job in ctx.board.get_job_board(ctx.components) {
            let Some(value) = ctx.components.get(job, "Job") else { continue };
            let state = value.get("state").and_then(Value::as_str).unwrap_or("pending");
            if state != "pending" {
                continue;
            }
            if value.get("reserved_resources").is_some() {
                continue;
            }
            if value.get("resource_requirements").and_then(Value::as_seq).is_none_or(<[Value]>::is_empty) {
                continue;
            }
            ctx.jobs.reserve_job_resources(ctx.components, ctx.schemas, job)?;
        }
        Ok(Vec::new())
    }
}
