use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use super::repository::{
    AchievementRepository, ClaimRepository, EventRepository, LedgerRepository, ProfileRepository,
    Storage, TriggerStateRepository,
};
use crate::{
    achievement::UserAchievementProgress,
    event::ActivityEvent,
    ledger::PointsLedgerEntry,
    profile::UserProfile,
    reward::{ClaimRewardResult, UserRewardClaim},
    shared::AppError,
    trigger::TriggerState,
};

/// Storage decorator that bounds every call. A call that exceeds the timeout
/// fails with `StorageUnavailable` instead of hanging the caller.
pub struct TimedStorage {
    inner: Arc<dyn Storage>,
    timeout: Duration,
}

impl TimedStorage {
    pub fn new(inner: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        match timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Storage call timed out"
                );
                Err(AppError::StorageUnavailable(format!(
                    "{} timed out after {}ms",
                    operation,
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl ProfileRepository for TimedStorage {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.bounded("get_profile", self.inner.get_profile(user_id))
            .await
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.bounded("put_profile", self.inner.put_profile(profile))
            .await
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        self.bounded("list_profiles", self.inner.list_profiles())
            .await
    }
}

#[async_trait]
impl LedgerRepository for TimedStorage {
    async fn append_entry(&self, entry: &PointsLedgerEntry) -> Result<(), AppError> {
        self.bounded("append_entry", self.inner.append_entry(entry))
            .await
    }

    async fn book_entry(
        &self,
        entry: &PointsLedgerEntry,
        profile: &UserProfile,
    ) -> Result<(), AppError> {
        self.bounded("book_entry", self.inner.book_entry(entry, profile))
            .await
    }

    async fn list_entries(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, AppError> {
        self.bounded("list_entries", self.inner.list_entries(user_id))
            .await
    }

    async fn list_entries_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PointsLedgerEntry>, AppError> {
        self.bounded("list_entries_since", self.inner.list_entries_since(since))
            .await
    }
}

#[async_trait]
impl AchievementRepository for TimedStorage {
    async fn get_progress(
        &self,
        user_id: &str,
        achievement_id: &str,
    ) -> Result<Option<UserAchievementProgress>, AppError> {
        self.bounded(
            "get_progress",
            self.inner.get_progress(user_id, achievement_id),
        )
        .await
    }

    async fn put_progress(&self, progress: &UserAchievementProgress) -> Result<(), AppError> {
        self.bounded("put_progress", self.inner.put_progress(progress))
            .await
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<UserAchievementProgress>, AppError> {
        self.bounded("list_progress", self.inner.list_progress(user_id))
            .await
    }
}

#[async_trait]
impl ClaimRepository for TimedStorage {
    async fn get_claim(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<Option<UserRewardClaim>, AppError> {
        self.bounded("get_claim", self.inner.get_claim(user_id, reward_id))
            .await
    }

    async fn put_claim(&self, claim: &UserRewardClaim) -> Result<(), AppError> {
        self.bounded("put_claim", self.inner.put_claim(claim)).await
    }

    async fn list_claims(&self, user_id: &str) -> Result<Vec<UserRewardClaim>, AppError> {
        self.bounded("list_claims", self.inner.list_claims(user_id))
            .await
    }

    async fn try_claim(
        &self,
        claim: &UserRewardClaim,
        initial_claims: u64,
        max_claims: Option<u64>,
    ) -> Result<ClaimRewardResult, AppError> {
        self.bounded(
            "try_claim",
            self.inner.try_claim(claim, initial_claims, max_claims),
        )
        .await
    }

    async fn claim_count(&self, reward_id: &str) -> Result<Option<u64>, AppError> {
        self.bounded("claim_count", self.inner.claim_count(reward_id))
            .await
    }
}

#[async_trait]
impl EventRepository for TimedStorage {
    async fn record_event(&self, event: &ActivityEvent) -> Result<(), AppError> {
        self.bounded("record_event", self.inner.record_event(event))
            .await
    }

    async fn list_events(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityEvent>, AppError> {
        self.bounded("list_events", self.inner.list_events(user_id, limit))
            .await
    }
}

#[async_trait]
impl TriggerStateRepository for TimedStorage {
    async fn get_trigger_state(
        &self,
        trigger_id: &str,
        user_id: &str,
    ) -> Result<Option<TriggerState>, AppError> {
        self.bounded(
            "get_trigger_state",
            self.inner.get_trigger_state(trigger_id, user_id),
        )
        .await
    }

    async fn put_trigger_state(&self, state: &TriggerState) -> Result<(), AppError> {
        self.bounded("put_trigger_state", self.inner.put_trigger_state(state))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    /// Profile store that never answers
    struct StalledStorage;

    #[async_trait]
    impl ProfileRepository for StalledStorage {
        async fn get_profile(&self, _user_id: &str) -> Result<Option<UserProfile>, AppError> {
            std::future::pending().await
        }
        async fn put_profile(&self, _profile: &UserProfile) -> Result<(), AppError> {
            std::future::pending().await
        }
        async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl LedgerRepository for StalledStorage {
        async fn append_entry(&self, _entry: &PointsLedgerEntry) -> Result<(), AppError> {
            std::future::pending().await
        }
        async fn book_entry(
            &self,
            _entry: &PointsLedgerEntry,
            _profile: &UserProfile,
        ) -> Result<(), AppError> {
            std::future::pending().await
        }
        async fn list_entries(&self, _user_id: &str) -> Result<Vec<PointsLedgerEntry>, AppError> {
            std::future::pending().await
        }
        async fn list_entries_since(
            &self,
            _since: DateTime<Utc>,
        ) -> Result<Vec<PointsLedgerEntry>, AppError> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl AchievementRepository for StalledStorage {
        async fn get_progress(
            &self,
            _user_id: &str,
            _achievement_id: &str,
        ) -> Result<Option<UserAchievementProgress>, AppError> {
            std::future::pending().await
        }
        async fn put_progress(&self, _progress: &UserAchievementProgress) -> Result<(), AppError> {
            std::future::pending().await
        }
        async fn list_progress(
            &self,
            _user_id: &str,
        ) -> Result<Vec<UserAchievementProgress>, AppError> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl ClaimRepository for StalledStorage {
        async fn get_claim(
            &self,
            _user_id: &str,
            _reward_id: &str,
        ) -> Result<Option<UserRewardClaim>, AppError> {
            std::future::pending().await
        }
        async fn put_claim(&self, _claim: &UserRewardClaim) -> Result<(), AppError> {
            std::future::pending().await
        }
        async fn list_claims(&self, _user_id: &str) -> Result<Vec<UserRewardClaim>, AppError> {
            std::future::pending().await
        }
        async fn try_claim(
            &self,
            _claim: &UserRewardClaim,
            _initial_claims: u64,
            _max_claims: Option<u64>,
        ) -> Result<ClaimRewardResult, AppError> {
            std::future::pending().await
        }
        async fn claim_count(&self, _reward_id: &str) -> Result<Option<u64>, AppError> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl EventRepository for StalledStorage {
        async fn record_event(&self, _event: &ActivityEvent) -> Result<(), AppError> {
            std::future::pending().await
        }
        async fn list_events(
            &self,
            _user_id: &str,
            _limit: usize,
        ) -> Result<Vec<ActivityEvent>, AppError> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl TriggerStateRepository for StalledStorage {
        async fn get_trigger_state(
            &self,
            _trigger_id: &str,
            _user_id: &str,
        ) -> Result<Option<TriggerState>, AppError> {
            std::future::pending().await
        }
        async fn put_trigger_state(&self, _state: &TriggerState) -> Result<(), AppError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn stalled_calls_become_storage_unavailable() {
        let storage = TimedStorage::new(Arc::new(StalledStorage), Duration::from_millis(20));

        let result = storage.get_profile("alice").await;
        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));

        let result = storage.list_entries("alice").await;
        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let storage = TimedStorage::new(Arc::new(InMemoryStorage::new()), Duration::from_secs(1));
        assert_eq!(storage.get_profile("alice").await.unwrap(), None);
        assert_eq!(storage.claim_count("badge").await.unwrap(), None);
    }
}
