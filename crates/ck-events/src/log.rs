//! `JobEventLog` — the append-only chronological record of job lifecycle
//! events.
//!
//! Grounded on `dt-output::row`/`writer`'s "typed row + persist to a
//! backend" shape, narrowed to a single JSON-array file format for job
//! event logs — a pluggable CSV/SQLite/Parquet backend choice doesn't
//! apply here, since there's exactly one on-disk shape to support.

use std::path::Path;

use ck_core::{value_from_json, value_to_json, Value};

use crate::error::EventsResult;

/// One entry in the job event log. `timestamp_ms` is monotonic
/// non-decreasing within a session; the log itself never reorders or
/// merges entries.
#[derive(Clone, Debug, PartialEq)]
pub struct JobEvent {
    pub timestamp_ms: u64,
    pub event_type: String,
    pub payload: Value,
}

impl JobEvent {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "timestamp_ms": self.timestamp_ms,
            "event_type": self.event_type,
            "payload": value_to_json(&self.payload),
        })
    }

    fn from_json(json: &serde_json::Value) -> Option<JobEvent> {
        Some(JobEvent {
            timestamp_ms: json.get("timestamp_ms")?.as_u64()?,
            event_type: json.get("event_type")?.as_str()?.to_string(),
            payload: value_from_json(json.get("payload").unwrap_or(&serde_json::Value::Null)),
        })
    }
}

#[derive(Default)]
pub struct JobEventLog {
    entries: Vec<JobEvent>,
    /// Monotonic clock driving `timestamp_ms`. Advanced by the facade once
    /// per tick rather than read from the wall clock, so replays of a saved
    /// log are byte-for-byte reproducible.
    clock_ms: u64,
}

impl JobEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the log's internal clock. Called once per `World::tick`.
    pub fn advance_clock(&mut self, delta_ms: u64) {
        self.clock_ms += delta_ms;
    }

    /// Append one entry, stamped with the log's current clock value.
    pub fn append(&mut self, event_type: impl Into<String>, payload: Value) {
        self.entries.push(JobEvent { timestamp_ms: self.clock_ms, event_type: event_type.into(), payload });
    }

    pub fn get_job_event_log(&self) -> &[JobEvent] {
        &self.entries
    }

    pub fn get_job_events_by_type(&self, event_type: &str) -> Vec<&JobEvent> {
        self.entries.iter().filter(|e| e.event_type == event_type).collect()
    }

    pub fn get_job_events_since(&self, ts_ms: u64) -> Vec<&JobEvent> {
        self.entries.iter().filter(|e| e.timestamp_ms >= ts_ms).collect()
    }

    pub fn get_job_events_where<P>(&self, predicate: P) -> Vec<&JobEvent>
    where
        P: Fn(&JobEvent) -> bool,
    {
        self.entries.iter().filter(|e| predicate(e)).collect()
    }

    pub fn clear_job_event_log(&mut self) {
        self.entries.clear();
    }

    /// Serialize the log to a JSON array of
    /// `{timestamp_ms,event_type,payload}` objects.
    pub fn save_job_event_log(&self, path: &Path) -> EventsResult<()> {
        let array: Vec<serde_json::Value> = self.entries.iter().map(JobEvent::to_json).collect();
        let text = serde_json::to_string_pretty(&serde_json::Value::Array(array))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Append one entry with an explicit timestamp rather than the current
    /// clock value, advancing the clock to match if needed. Used when
    /// restoring a log embedded in a world save file (as opposed to
    /// `load_job_event_log`, which reads a standalone log file).
    pub fn restore_entry(&mut self, timestamp_ms: u64, event_type: impl Into<String>, payload: Value) {
        self.clock_ms = self.clock_ms.max(timestamp_ms);
        self.entries.push(JobEvent { timestamp_ms, event_type: event_type.into(), payload });
    }

    /// Replace the in-memory log with the contents of `path` — entries are
    /// taken verbatim, and the internal clock is fast-forwarded to the
    /// latest timestamp read so subsequent `append` calls stay monotonic.
    pub fn load_job_event_log(&mut self, path: &Path) -> EventsResult<()> {
        let text = std::fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&text)?;
        let array = json.as_array().cloned().unwrap_or_default();
        let entries: Vec<JobEvent> = array.iter().filter_map(JobEvent::from_json).collect();
        self.clock_ms = entries.iter().map(|e| e.timestamp_ms).max().unwrap_or(self.clock_ms);
        self.entries = entries;
        Ok(())
    }
}
