//! `EventBus` — double-buffered pub/sub keyed by event-type string.
//!
//! Grounded on `dt-output::SimOutputObserver`'s "accumulate, then flush on a
//! boundary" shape, generalized from a single fixed sink (`OutputWriter`) to
//! an arbitrary number of named event types, each with its own poll queue
//! and subscriber list. `ck-world` composes three instances of this type:
//! the generic bus (`send_event`/`poll_event`), the ECS-event bus
//! (`poll_ecs_event`), and the job-event bus (`job_assigned`, ...) — the
//! bus itself has no notion of which instance it is; the distinct
//! namespaces are just three separate `EventBus` values the facade keeps.

use std::collections::HashMap;

use ck_core::Value;

/// A subscriber callback. Generalizes `dt_behavior::BehaviorModel`'s
/// one-method-per-callback shape to event delivery: `invoke` receives the
/// event payload and may fail, but a
/// failure never aborts the fan-out — `EventBus::update_event_buses`
/// logs it via `tracing::warn!` and moves on to the next subscriber.
pub trait EventSubscriber: Send + Sync {
    fn invoke(&self, payload: &Value) -> Result<(), String>;
}

impl<F> EventSubscriber for F
where
    F: Fn(&Value) -> Result<(), String> + Send + Sync,
{
    fn invoke(&self, payload: &Value) -> Result<(), String> {
        self(payload)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

#[derive(Default)]
pub struct EventBus {
    incoming: HashMap<String, Vec<Value>>,
    readable: HashMap<String, Vec<Value>>,
    subscribers: HashMap<String, Vec<(SubscriberId, Box<dyn EventSubscriber>)>>,
    next_subscriber: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `payload` under `event_type`. Not visible to `poll_event` or
    /// subscribers until the next `update_event_buses()` call: events sent
    /// during tick N are delivered to polling/subscribing callers only
    /// after `update_event_buses()` runs.
    pub fn send_event(&mut self, event_type: impl Into<String>, payload: Value) {
        self.incoming.entry(event_type.into()).or_default().push(payload);
    }

    /// Drain and return every readable event of `event_type`.
    pub fn poll_event(&mut self, event_type: &str) -> Vec<Value> {
        self.readable.remove(event_type).unwrap_or_default()
    }

    /// Register `subscriber` against `event_type`, run in registration
    /// order on every future `update_event_buses()` call.
    pub fn subscribe(&mut self, event_type: impl Into<String>, subscriber: Box<dyn EventSubscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.subscribers.entry(event_type.into()).or_default().push((id, subscriber));
        id
    }

    /// Remove a previously registered subscriber. A no-op if `id` is
    /// already gone or never existed.
    pub fn unsubscribe(&mut self, event_type: &str, id: SubscriberId) {
        if let Some(subs) = self.subscribers.get_mut(event_type) {
            subs.retain(|(existing, _)| *existing != id);
        }
    }

    /// Promote `incoming` to `readable` (replacing whatever was left in
    /// `readable` from the prior call), then fan out every newly-readable
    /// event to its type's subscribers in registration order. A subscriber
    /// that returns `Err` is logged via `tracing::warn!` and does not stop
    /// the remaining subscribers or abort the caller.
    pub fn update_event_buses(&mut self) {
        let promoted: HashMap<String, Vec<Value>> = std::mem::take(&mut self.incoming);

        for (event_type, payloads) in &promoted {
            if let Some(subs) = self.subscribers.get(event_type) {
                for payload in payloads {
                    for (_, subscriber) in subs {
                        if let Err(err) = subscriber.invoke(payload) {
                            tracing::warn!(event_type, error = %err, "event subscriber failed");
                        }
                    }
                }
            }
        }

        self.readable = promoted;
    }
}
