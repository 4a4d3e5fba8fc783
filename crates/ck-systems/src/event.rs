//! The event shape native systems emit.
//!
//! `ck-systems` sits below `ck-events` in the crate graph (it has no
//! knowledge of buses or the job event log), so a system run returns its
//! events as plain data — the World Facade is the one that knows how to
//! route each namespace into the right bus.

use ck_core::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventNamespace {
    /// The generic `send_event`/`poll_event` bus.
    Generic,
    /// `poll_ecs_event` — emitted by native systems (`entity_died`, ...).
    Ecs,
    /// The restricted job-event bus (`job_assigned`, `job_completed`, ...).
    Job,
}

#[derive(Debug, Clone)]
pub struct SystemEvent {
    pub namespace: EventNamespace,
    pub event_type: String,
    pub payload: Value,
}

impl SystemEvent {
    pub fn new(namespace: EventNamespace, event_type: impl Into<String>, payload: Value) -> Self {
        Self { namespace, event_type: event_type.into(), payload }
    }

    pub fn ecs(event_type: impl Into<String>, payload: Value) -> Self {
        Self::new(EventNamespace::Ecs, event_type, payload)
    }

    pub fn job(event_type: impl Into<String>, payload: Value) -> Self {
        Self::new(EventNamespace::Job, event_type, payload)
    }
}
