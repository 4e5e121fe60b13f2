use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::profile::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AchievementCategory {
    Onboarding,
    Investment,
    Community,
    Governance,
    Engagement,
    Milestone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// Profile quantity an achievement requirement measures
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequirementType {
    ProjectsApplied,
    ProjectsApproved,
    TotalInvested,
    CommunityContributions,
    ReferralsCount,
    VotesCast,
    CurrentStreak,
    LongestStreak,
    TotalActiveDays,
    TotalPoints,
    Level,
    ReputationScore,
}

impl RequirementType {
    /// Reads the profile's current value for this requirement
    pub fn current_value(&self, profile: &UserProfile) -> f64 {
        match self {
            RequirementType::ProjectsApplied => profile.projects_applied as f64,
            RequirementType::ProjectsApproved => profile.projects_approved as f64,
            RequirementType::TotalInvested => profile.total_invested,
            RequirementType::CommunityContributions => profile.community_contributions as f64,
            RequirementType::ReferralsCount => profile.referrals_count as f64,
            RequirementType::VotesCast => profile.votes_cast as f64,
            RequirementType::CurrentStreak => f64::from(profile.current_streak),
            RequirementType::LongestStreak => f64::from(profile.longest_streak),
            RequirementType::TotalActiveDays => f64::from(profile.total_active_days),
            RequirementType::TotalPoints => profile.total_points as f64,
            RequirementType::Level => f64::from(profile.current_level),
            RequirementType::ReputationScore => profile.reputation_score as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "type")]
    pub requirement_type: RequirementType,
    pub target: f64,
}

/// Catalog entry describing a milestone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    #[serde(default)]
    pub point_reward: u64,
    pub requirements: Vec<Requirement>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_secret: bool,
}

fn default_true() -> bool {
    true
}

/// Current value of one requirement for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementValue {
    pub requirement_type: RequirementType,
    pub current: f64,
    pub target: f64,
    pub satisfied: bool,
}

/// Result of evaluating an achievement against a profile snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementEvaluation {
    pub eligible: bool,
    pub progress_percent: u8,
    pub requirement_values: Vec<RequirementValue>,
}

/// Per (user, achievement) progress record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAchievementProgress {
    pub user_id: String,
    pub achievement_id: String,
    pub progress_percent: u8,
    pub requirement_values: Vec<RequirementValue>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
