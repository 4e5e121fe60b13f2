use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    achievement::UserAchievementProgress,
    event::ActivityEvent,
    ledger::PointsLedgerEntry,
    profile::UserProfile,
    reward::{ClaimRewardResult, UserRewardClaim},
    shared::AppError,
    trigger::TriggerState,
};

/// Trait for user profile storage
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;
    async fn put_profile(&self, profile: &UserProfile) -> Result<(), AppError>;
    /// Point-in-time snapshot of every profile, used for ranking
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError>;
}

/// Trait for the append-only points ledger
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn append_entry(&self, entry: &PointsLedgerEntry) -> Result<(), AppError>;
    /// Appends `entry` and stores `profile` as one write. Either both land or neither.
    async fn book_entry(
        &self,
        entry: &PointsLedgerEntry,
        profile: &UserProfile,
    ) -> Result<(), AppError>;
    /// A user's entries in append order
    async fn list_entries(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, AppError>;
    /// Every user's entries created at or after `since`
    async fn list_entries_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PointsLedgerEntry>, AppError>;
}

/// Trait for per (user, achievement) progress records
#[async_trait]
pub trait AchievementRepository: Send + Sync {
    async fn get_progress(
        &self,
        user_id: &str,
        achievement_id: &str,
    ) -> Result<Option<UserAchievementProgress>, AppError>;
    async fn put_progress(&self, progress: &UserAchievementProgress) -> Result<(), AppError>;
    async fn list_progress(&self, user_id: &str) -> Result<Vec<UserAchievementProgress>, AppError>;
}

/// Trait for reward claim records and supply counters
#[async_trait]
pub trait ClaimRepository: Send + Sync {
    async fn get_claim(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<Option<UserRewardClaim>, AppError>;
    async fn put_claim(&self, claim: &UserRewardClaim) -> Result<(), AppError>;
    async fn list_claims(&self, user_id: &str) -> Result<Vec<UserRewardClaim>, AppError>;

    /// Atomically checks for an existing claim, checks the supply cap, stores the
    /// claim and increments the reward's counter. Either all of it happens or none.
    /// `initial_claims` seeds the counter the first time a reward is seen.
    async fn try_claim(
        &self,
        claim: &UserRewardClaim,
        initial_claims: u64,
        max_claims: Option<u64>,
    ) -> Result<ClaimRewardResult, AppError>;

    /// Current counter value, `None` if the reward was never claimed through this store
    async fn claim_count(&self, reward_id: &str) -> Result<Option<u64>, AppError>;
}

/// Trait for the raw event log
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn record_event(&self, event: &ActivityEvent) -> Result<(), AppError>;
    /// Most recent first
    async fn list_events(&self, user_id: &str, limit: usize)
        -> Result<Vec<ActivityEvent>, AppError>;
}

/// Trait for per (trigger, user) cooldown and cap state
#[async_trait]
pub trait TriggerStateRepository: Send + Sync {
    async fn get_trigger_state(
        &self,
        trigger_id: &str,
        user_id: &str,
    ) -> Result<Option<TriggerState>, AppError>;
    async fn put_trigger_state(&self, state: &TriggerState) -> Result<(), AppError>;
}

/// Everything the engine needs from its storage collaborator
pub trait Storage:
    ProfileRepository
    + LedgerRepository
    + AchievementRepository
    + ClaimRepository
    + EventRepository
    + TriggerStateRepository
{
}

impl<T> Storage for T where
    T: ProfileRepository
        + LedgerRepository
        + AchievementRepository
        + ClaimRepository
        + EventRepository
        + TriggerStateRepository
{
}
