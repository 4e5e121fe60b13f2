// Engine facade
//
// The single entry point presentation layers talk to. Owns the per-user lock
// registry and wires the ledger, achievements, rewards, triggers and
// leaderboards over one storage collaborator.

pub use builder::GamificationEngineBuilder;
pub use facade::{GamificationEngine, TrackedEvent};

mod builder;
mod facade;
