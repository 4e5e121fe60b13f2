// Event triggers
//
// Catalog rules that react to one event type: conditions over the event and
// the profile, per-user cooldown and cap, then an ordered list of actions,
// some of them delayed.

pub use conditions::{compare, condition_met, conditions_met};
pub use executor::ActionExecutor;
pub use models::{
    ActionKind, ActionOutcome, ActionStatus, EventTrigger, FieldSource, Operator, TriggerAction,
    TriggerCondition, TriggerOutcome, TriggerResult, TriggerState,
};
pub use scheduler::ActionScheduler;
pub use service::TriggerSystem;

mod conditions;
mod executor;
mod models;
mod scheduler;
mod service;
