// Library crate for the gamification engine
// This file exposes the public API for the server binary and integration tests

pub mod achievement;
pub mod api;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod event;
pub mod leaderboard;
pub mod ledger;
pub mod notification;
pub mod profile;
pub mod progression;
pub mod reward;
pub mod shared;
pub mod storage;
pub mod trigger;

// Re-export commonly used types for easier access in tests
pub use catalog::Catalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{GamificationEngine, GamificationEngineBuilder, TrackedEvent};
pub use event::{ActivityEvent, EventType, Metadata, MetadataValue};
pub use leaderboard::{LeaderboardMetric, LeaderboardScope, Timeframe};
pub use ledger::{PointsCategory, PointsLedgerEntry};
pub use notification::{Notification, NotificationKind};
pub use profile::UserProfile;
pub use shared::{AppError, AppState};
pub use storage::{InMemoryStorage, Storage};
