// Storage collaborator
//
// Repository traits the engine persists through, an in-memory implementation,
// a timeout decorator and the per-user lock registry that serializes writes.

// Public API - what other modules can use
pub use locks::UserLocks;
pub use memory::InMemoryStorage;
pub use repository::{
    AchievementRepository, ClaimRepository, EventRepository, LedgerRepository, ProfileRepository,
    Storage, TriggerStateRepository,
};
pub use timed::TimedStorage;

// Internal modules
mod locks;
mod memory;
mod repository;
mod timed;
