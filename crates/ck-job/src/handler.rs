//! `JobHandler` — the extension point external code uses to drive a job
//! type's state transitions.
//!
//! Generalizes `dt-behavior::BehaviorModel::replan`'s "one method the host
//! plugs application logic into" shape down to a single `invoke` — every
//! externally-supplied callback in this kernel (handlers, systems,
//! validators, subscribers) is modeled as a trait with one
//! `invoke(value) -> value_or_error` method.

use ck_core::Value;

use crate::error::JobError;

/// A job type's state-advancement logic.
///
/// `invoke` receives the job's current component value and returns its
/// mutated replacement. A handler that fails (returns `Err`) does not abort
/// the tick: the Job System marks the job `failed` and emits a
/// `job_failed` event carrying the message.
pub trait JobHandler: Send + Sync {
    fn invoke(&self, job: &Value) -> Result<Value, JobError>;
}

/// The default handler used for job types with no registered handler:
/// `pending` transitions straight to `in_progress`; `in_progress` increments
/// `progress` by one. Mirrors `NoopBehavior`'s role as a do-nothing
/// placeholder, except this default is never actually a no-op — the
/// engine must do *something* when no handler is registered.
pub struct DefaultHandler;

impl JobHandler for DefaultHandler {
    fn invoke(&self, job: &Value) -> Result<Value, JobError> {
        let mut next = job.clone();
        let Some(map) = next.as_map_mut() else {
            return Err(JobError::InvariantViolation("job value is not an object".into()));
        };
        let state = map.get("state").and_then(Value::as_str).unwrap_or("pending").to_string();
        match state.as_str() {
            "pending" => {
                map.insert("state".to_string(), Value::String("in_progress".to_string()));
                map.insert("progress".to_string(), Value::Int(0));
            }
            "in_progress" => {
                let progress = map.get("progress").and_then(Value::as_i64).unwrap_or(0);
                map.insert("progress".to_string(), Value::Int(progress + 1));
            }
            _ => {}
        }
        Ok(next)
    }
}
