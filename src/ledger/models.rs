use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::event::Metadata;

/// Why points moved
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PointsCategory {
    Activity,
    Achievement,
    Reward,
    Trigger,
    Bonus,
    Administrative,
    Penalty,
}

/// Immutable record of a point movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsLedgerEntry {
    pub id: String,
    pub user_id: String,
    /// Delta actually applied to the total
    pub delta: i64,
    /// Delta the caller asked for. Differs from `delta` only when the floor clamped a penalty.
    pub requested_delta: i64,
    pub reason: String,
    pub category: PointsCategory,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}
