use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Timeframe {
    #[default]
    AllTime,
    /// Rolling 30 days
    Monthly,
    /// Rolling 7 days
    Weekly,
}

impl Timeframe {
    /// Start of the scoring window, `None` for all time
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Timeframe::AllTime => None,
            Timeframe::Monthly => Some(now - Duration::days(30)),
            Timeframe::Weekly => Some(now - Duration::days(7)),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LeaderboardMetric {
    #[default]
    Points,
    Invested,
    Referrals,
    Contributions,
    Streak,
}

/// Which ranking to compute
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaderboardScope {
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub metric: LeaderboardMetric,
}

impl LeaderboardScope {
    pub fn new(timeframe: Timeframe, metric: LeaderboardMetric) -> Self {
        Self { timeframe, metric }
    }

    /// Every timeframe and metric combination
    pub fn all() -> Vec<Self> {
        Timeframe::iter()
            .flat_map(|timeframe| {
                LeaderboardMetric::iter().map(move |metric| Self::new(timeframe, metric))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub user_id: String,
    pub display_name: Option<String>,
    pub wallet_address: Option<String>,
    pub score: f64,
    pub total_points: u64,
    pub level: u32,
    pub projects_applied: u64,
    pub projects_approved: u64,
    pub total_invested: f64,
    pub referrals_count: u64,
    pub community_contributions: u64,
    pub current_streak: u32,
    pub joined_at: DateTime<Utc>,
}

/// A computed ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub scope: LeaderboardScope,
    pub entries: Vec<LeaderboardEntry>,
    pub total_users: u64,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Same,
    /// Not ranked in the previous computation
    New,
}

impl Trend {
    pub fn between(previous: Option<u64>, current: u64) -> Self {
        match previous {
            None => Trend::New,
            Some(previous) if previous > current => Trend::Up,
            Some(previous) if previous < current => Trend::Down,
            Some(_) => Trend::Same,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRank {
    pub user_id: String,
    pub scope: LeaderboardScope,
    pub rank: u64,
    pub total_users: u64,
    /// Share of users ranked at or below this user; the leader is at 100
    pub percentile: f64,
    pub score: f64,
    pub trend: Trend,
}
