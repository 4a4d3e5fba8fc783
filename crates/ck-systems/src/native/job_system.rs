//! The Job System: matches qualified agents to pending jobs, then advances
//! every active job one step.
//!
//! Auto-assignment runs first each tick: a world ticked with no manual
//! `assign_job`/`ai_assign_jobs` call still observes `job_assigned` events,
//! since auto-matching agents against the job board is part of what
//! `tick()` does, not a feature the caller has to drive by hand.

use ck_core::Value;

use crate::context::SystemContext;
use crate::error::SystemResult;
use crate::event::SystemEvent;
use crate::system::System;

#[derive(Default)]
pub struct JobSystem;

impl System for JobSystem {
    fn run(&mut self, ctx: &mut SystemContext) -> SystemResult<Vec<SystemEvent>> {
        let mut events = Vec::new();

        let mut agents = ctx.components.entities_with("Agent");
        agents.sort_by_key(|e| e.get());
        let live_qualified_agents = agents.len();

        for agent in agents {
            let Some(agent_value) = ctx.components.get(agent, "Agent").cloned() else { continue };
            let skills = agent_value.get("skills").cloned().unwrap_or_else(Value::map);
            let specializations: Option<Vec<String>> = agent_value
                .get("specializations")
                .and_then(Value::as_seq)
                .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect());

            let claimed = ctx.jobs.ai_assign_jobs(
                ctx.components,
                ctx.schemas,
                ctx.board,
                agent,
                &[],
                &skills,
                specializations.as_deref(),
                live_qualified_agents,
            )?;

            for job in claimed {
                events.push(SystemEvent::job(
                    "job_assigned",
                    Value::object([
                        ("entity", Value::Int(job.get() as i64)),
                        ("assigned_to", Value::Int(agent.get() as i64)),
                    ]),
                ));
            }
        }

        for job in ctx.board.get_job_board(ctx.components) {
            let Some(transition) = ctx.jobs.advance_job_state(ctx.components, ctx.schemas, job)? else { continue };

            let payload = Value::object([
                ("entity", Value::Int(job.get() as i64)),
                ("from_state", Value::String(transition.from_state.clone())),
                ("to_state", Value::String(transition.to_state.clone())),
            ]);

            use ck_job::TransitionKind;
            match transition.kind {
                TransitionKind::StateChanged => events.push(SystemEvent::job("job_state_changed", payload)),
                TransitionKind::Completed => {
                    events.push(SystemEvent::job("job_completed", payload.clone()));
                    events.push(SystemEvent::ecs("job_completed", payload));
                }
                TransitionKind::Failed => {
                    events.push(SystemEvent::job("job_failed", payload.clone()));
                    events.push(SystemEvent::ecs("job_failed", payload));
                }
            }
        }

        Ok(events)
    }
}
