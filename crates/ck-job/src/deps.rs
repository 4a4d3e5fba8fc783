//! Dependency-expression evaluator.
//!
//! A small recursive-descent interpreter over a `Value` tree, in the same
//! "walk a small grammar of tagged nodes" shape as `ck_schema::node`'s
//! `oneOf` matching — here the grammar is `job:<type>` / `all_of` /
//! `any_of` / `not` / bare-list-is-`all_of` instead of JSON-schema types.

use std::collections::HashSet;

use ck_core::Value;
use ck_ecs::ComponentStore;

/// The set of job types with at least one `complete`, non-cancelled job,
/// computed fresh from the Component Store. Dependencies reference job
/// *types*, not ids, so this predicate — not the event log — is what
/// dependency evaluation is a pure function of.
pub fn completed_job_types(components: &ComponentStore) -> HashSet<String> {
    components
        .entities_with("Job")
        .into_iter()
        .filter_map(|entity| {
            let job = components.get(entity, "Job")?;
            let state = job.get("state").and_then(Value::as_str)?;
            let cancelled = job.get("cancelled").and_then(Value::as_bool).unwrap_or(false);
            if state == "complete" && !cancelled {
                job.get("job_type").and_then(Value::as_str).map(str::to_string)
            } else {
                None
            }
        })
        .collect()
}

/// Evaluate a dependency expression against the set of currently-completed
/// job types. An absent/null expression is trivially satisfied.
pub fn evaluate(expr: &Value, completed: &HashSet<String>) -> bool {
    match expr {
        Value::Null => true,
        Value::String(s) => s.strip_prefix("job:").is_some_and(|job_type| completed.contains(job_type)),
        // A bare list of strings is shorthand for `all_of`.
        Value::Seq(items) => items.iter().all(|item| evaluate(item, completed)),
        Value::Map(map) => {
            if let Some(Value::Seq(items)) = map.get("all_of") {
                items.iter().all(|item| evaluate(item, completed))
            } else if let Some(Value::Seq(items)) = map.get("any_of") {
                items.iter().any(|item| evaluate(item, completed))
            } else if let Some(Value::Seq(items)) = map.get("not") {
                !items.iter().all(|item| evaluate(item, completed))
            } else {
                false
            }
        }
        _ => false,
    }
}
