use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::achievement::Rarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RewardType {
    Discount,
    Points,
    Access,
    Badge,
    Title,
    Feature,
    Crypto,
    Merchandise,
}

/// Catalog entry for something a user can claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub reward_type: RewardType,
    pub value: f64,
    pub rarity: Rarity,
    #[serde(default)]
    pub required_level: u32,
    #[serde(default)]
    pub required_points: u64,
    #[serde(default)]
    pub required_achievements: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_limited: bool,
    #[serde(default)]
    pub max_claims: Option<u64>,
    /// Claims made before this catalog was loaded
    #[serde(default)]
    pub total_claims: u64,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl RewardDefinition {
    /// Global supply cap, if the reward is limited
    pub fn supply_cap(&self) -> Option<u64> {
        if self.is_limited {
            self.max_claims
        } else {
            None
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClaimStatus {
    Available,
    Claimed,
    Expired,
    Used,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRewardClaim {
    pub id: String,
    pub user_id: String,
    pub reward_id: String,
    pub status: ClaimStatus,
    pub claimed_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Outcome of the atomic claim-and-count storage operation
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimRewardResult {
    Claimed(UserRewardClaim),
    AlreadyClaimed(UserRewardClaim),
    LimitReached { total_claims: u64 },
}
