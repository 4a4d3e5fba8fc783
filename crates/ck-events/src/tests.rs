//! Unit tests for the event bus and job event log.

use ck_core::Value;

use crate::bus::EventBus;
use crate::log::JobEventLog;

#[test]
fn send_then_update_then_poll() {
    let mut bus = EventBus::new();
    bus.send_event("test_event", Value::Int(42));
    assert!(bus.poll_event("test_event").is_empty(), "not visible before update");

    bus.update_event_buses();
    let events = bus.poll_event("test_event");
    assert_eq!(events, vec![Value::Int(42)]);
}

#[test]
fn poll_drains_and_second_update_clears() {
    let mut bus = EventBus::new();
    bus.send_event("test_event", Value::Int(0));
    bus.update_event_buses();
    bus.poll_event("test_event");
    bus.update_event_buses();
    assert!(bus.poll_event("test_event").is_empty());
}

#[test]
fn subscribers_run_in_registration_order_after_update() {
    use std::sync::{Arc, Mutex};
    let mut bus = EventBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let o1 = order.clone();
    bus.subscribe("job_assigned", Box::new(move |_: &Value| {
        o1.lock().unwrap().push(1);
        Ok(())
    }));
    let o2 = order.clone();
    bus.subscribe("job_assigned", Box::new(move |_: &Value| {
        o2.lock().unwrap().push(2);
        Ok(())
    }));

    bus.send_event("job_assigned", Value::Null);
    assert!(order.lock().unwrap().is_empty());
    bus.update_event_buses();
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
}

#[test]
fn subscriber_error_is_swallowed() {
    let mut bus = EventBus::new();
    bus.subscribe("x", Box::new(|_: &Value| Err("boom".to_string())));
    bus.send_event("x", Value::Null);
    bus.update_event_buses(); // must not panic
}

#[test]
fn job_event_log_save_load_round_trip() {
    let dir = std::env::temp_dir().join(format!("ck-events-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("log.json");

    let mut log = JobEventLog::new();
    log.advance_clock(10);
    log.append("job_assigned", Value::object([("job", Value::Int(1))]));
    log.advance_clock(5);
    log.append("job_completed", Value::object([("job", Value::Int(1))]));

    log.save_job_event_log(&path).unwrap();

    let mut loaded = JobEventLog::new();
    loaded.load_job_event_log(&path).unwrap();

    assert_eq!(loaded.get_job_event_log().len(), 2);
    assert_eq!(loaded.get_job_event_log(), log.get_job_event_log());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn queries_filter_by_type_and_timestamp() {
    let mut log = JobEventLog::new();
    log.append("job_assigned", Value::Null);
    log.advance_clock(100);
    log.append("job_completed", Value::Null);

    assert_eq!(log.get_job_events_by_type("job_assigned").len(), 1);
    assert_eq!(log.get_job_events_since(50).len(), 1);
    assert_eq!(log.get_job_events_where(|e| e.event_type.starts_with("job_")).len(), 2);
}

#[test]
fn clear_empties_the_log() {
    let mut log = JobEventLog::new();
    log.append("job_assigned", Value::Null);
    log.clear_job_event_log();
    assert!(log.get_job_event_log().is_empty());
}
