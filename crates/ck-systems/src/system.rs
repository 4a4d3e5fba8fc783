use crate::context::SystemContext;
use crate::error::SystemResult;
use crate::event::SystemEvent;

/// A named, once-per-tick callable unit.
///
/// Grounded on `dt_behavior::BehaviorModel`'s "trait the host implements,
/// engine calls once per tick" shape — generalized from one fixed behavior
/// model per simulation to any number of named systems looked up in a
/// registry.
pub trait System {
    fn run(&mut self, ctx: &mut SystemContext) -> SystemResult<Vec<SystemEvent>>;
}
