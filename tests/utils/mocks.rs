#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};

use gamification::{
    achievement::UserAchievementProgress,
    event::ActivityEvent,
    ledger::PointsLedgerEntry,
    profile::UserProfile,
    reward::{ClaimRewardResult, UserRewardClaim},
    shared::AppError,
    storage::{
        AchievementRepository, ClaimRepository, EventRepository, InMemoryStorage,
        LedgerRepository, ProfileRepository, TriggerStateRepository,
    },
    trigger::TriggerState,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// In-memory store whose write paths can be switched to fail
#[derive(Default)]
pub struct MockStorage {
    inner: InMemoryStorage,
    fail_profile_writes: AtomicBool,
    fail_ledger_writes: AtomicBool,
    fail_trigger_state_writes: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// `put_profile` fails while set
    pub fn fail_profile_writes(&self, fail: bool) {
        self.fail_profile_writes.store(fail, Ordering::SeqCst);
    }

    /// `append_entry` and `book_entry` fail while set
    pub fn fail_ledger_writes(&self, fail: bool) {
        self.fail_ledger_writes.store(fail, Ordering::SeqCst);
    }

    /// `put_trigger_state` fails while set
    pub fn fail_trigger_state_writes(&self, fail: bool) {
        self.fail_trigger_state_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<(), AppError> {
        if flag.load(Ordering::SeqCst) {
            return Err(AppError::StorageUnavailable(format!(
                "{} rejected by mock",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for MockStorage {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.inner.get_profile(user_id).await
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        Self::check(&self.fail_profile_writes, "put_profile")?;
        self.inner.put_profile(profile).await
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        self.inner.list_profiles().await
    }
}

#[async_trait]
impl LedgerRepository for MockStorage {
    async fn append_entry(&self, entry: &PointsLedgerEntry) -> Result<(), AppError> {
        Self::check(&self.fail_ledger_writes, "append_entry")?;
        self.inner.append_entry(entry).await
    }

    async fn book_entry(
        &self,
        entry: &PointsLedgerEntry,
        profile: &UserProfile,
    ) -> Result<(), AppError> {
        Self::check(&self.fail_ledger_writes, "book_entry")?;
        self.inner.book_entry(entry, profile).await
    }

    async fn list_entries(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, AppError> {
        self.inner.list_entries(user_id).await
    }

    async fn list_entries_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PointsLedgerEntry>, AppError> {
        self.inner.list_entries_since(since).await
    }
}

#[async_trait]
impl AchievementRepository for MockStorage {
    async fn get_progress(
        &self,
        user_id: &str,
        achievement_id: &str,
    ) -> Result<Option<UserAchievementProgress>, AppError> {
        self.inner.get_progress(user_id, achievement_id).await
    }

    async fn put_progress(&self, progress: &UserAchievementProgress) -> Result<(), AppError> {
        self.inner.put_progress(progress).await
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<UserAchievementProgress>, AppError> {
        self.inner.list_progress(user_id).await
    }
}

#[async_trait]
impl ClaimRepository for MockStorage {
    async fn get_claim(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<Option<UserRewardClaim>, AppError> {
        self.inner.get_claim(user_id, reward_id).await
    }

    async fn put_claim(&self, claim: &UserRewardClaim) -> Result<(), AppError> {
        self.inner.put_claim(claim).await
    }

    async fn list_claims(&self, user_id: &str) -> Result<Vec<UserRewardClaim>, AppError> {
        self.inner.list_claims(user_id).await
    }

    async fn try_claim(
        &self,
        claim: &UserRewardClaim,
        initial_claims: u64,
        max_claims: Option<u64>,
    ) -> Result<ClaimRewardResult, AppError> {
        self.inner
            .try_claim(claim, initial_claims, max_claims)
            .await
    }

    async fn claim_count(&self, reward_id: &str) -> Result<Option<u64>, AppError> {
        self.inner.claim_count(reward_id).await
    }
}

#[async_trait]
impl EventRepository for MockStorage {
    async fn record_event(&self, event: &ActivityEvent) -> Result<(), AppError> {
        self.inner.record_event(event).await
    }

    async fn list_events(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityEvent>, AppError> {
        self.inner.list_events(user_id, limit).await
    }
}

#[async_trait]
impl TriggerStateRepository for MockStorage {
    async fn get_trigger_state(
        &self,
        trigger_id: &str,
        user_id: &str,
    ) -> Result<Option<TriggerState>, AppError> {
        self.inner.get_trigger_state(trigger_id, user_id).await
    }

    async fn put_trigger_state(&self, state: &TriggerState) -> Result<(), AppError> {
        Self::check(&self.fail_trigger_state_writes, "put_trigger_state")?;
        self.inner.put_trigger_state(state).await
    }
}
