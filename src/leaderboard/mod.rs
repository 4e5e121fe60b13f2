// Leaderboards
//
// Pure ranking over a snapshot of profiles, served from a per-scope cache that
// a background task keeps warm.

pub use models::{
    Leaderboard, LeaderboardEntry, LeaderboardMetric, LeaderboardScope, Timeframe, Trend,
    UserRank,
};
pub use ranker::{percentile, rank_profiles};
pub use refresh_task::{spawn_refresh_task, start_refresh_task};
pub use service::LeaderboardService;

mod models;
mod ranker;
mod refresh_task;
mod service;
