use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::repository::{
    AchievementRepository, ClaimRepository, EventRepository, LedgerRepository, ProfileRepository,
    TriggerStateRepository,
};
use crate::{
    achievement::UserAchievementProgress,
    event::ActivityEvent,
    ledger::PointsLedgerEntry,
    profile::UserProfile,
    reward::{ClaimRewardResult, ClaimStatus, UserRewardClaim},
    shared::AppError,
    trigger::TriggerState,
};

type UserKey = (String, String);

#[derive(Debug, Default)]
struct ClaimTable {
    claims: HashMap<UserKey, UserRewardClaim>,
    counters: HashMap<String, u64>,
}

/// In-memory implementation of every storage trait for development and testing
///
/// Data is lost when the process exits. Claims and their supply counters share
/// one lock so `try_claim` is atomic.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    profiles: RwLock<HashMap<String, UserProfile>>,
    ledger: RwLock<HashMap<String, Vec<PointsLedgerEntry>>>,
    achievements: RwLock<HashMap<UserKey, UserAchievementProgress>>,
    claims: RwLock<ClaimTable>,
    events: RwLock<HashMap<String, Vec<ActivityEvent>>>,
    trigger_states: RwLock<HashMap<UserKey, TriggerState>>,
}

impl InMemoryStorage {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-populated profiles
    pub async fn with_profiles(profiles: Vec<UserProfile>) -> Self {
        let storage = Self::new();
        {
            let mut guard = storage.profiles.write().await;
            for profile in profiles {
                guard.insert(profile.user_id.clone(), profile);
            }
        }
        storage
    }

    /// Returns the current number of profiles
    pub async fn profile_count(&self) -> usize {
        self.profiles.read().await.len()
    }
}

fn key(first: &str, second: &str) -> UserKey {
    (first.to_string(), second.to_string())
}

#[async_trait]
impl ProfileRepository for InMemoryStorage {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }

    #[instrument(skip(self, profile), fields(user_id = %profile.user_id))]
    async fn put_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        debug!(total_points = profile.total_points, "Storing profile in memory");
        self.profiles
            .write()
            .await
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        Ok(self.profiles.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl LedgerRepository for InMemoryStorage {
    async fn append_entry(&self, entry: &PointsLedgerEntry) -> Result<(), AppError> {
        self.ledger
            .write()
            .await
            .entry(entry.user_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    #[instrument(skip(self, entry, profile), fields(user_id = %profile.user_id))]
    async fn book_entry(
        &self,
        entry: &PointsLedgerEntry,
        profile: &UserProfile,
    ) -> Result<(), AppError> {
        if entry.user_id != profile.user_id {
            return Err(AppError::InvalidInput(format!(
                "ledger entry for '{}' booked against profile '{}'",
                entry.user_id, profile.user_id
            )));
        }

        // Ledger before profiles, the only place both are held
        let mut ledger = self.ledger.write().await;
        let mut profiles = self.profiles.write().await;
        ledger
            .entry(entry.user_id.clone())
            .or_default()
            .push(entry.clone());
        profiles.insert(profile.user_id.clone(), profile.clone());
        debug!(total_points = profile.total_points, "Booked ledger entry");
        Ok(())
    }

    async fn list_entries(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, AppError> {
        Ok(self
            .ledger
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_entries_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PointsLedgerEntry>, AppError> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .values()
            .flatten()
            .filter(|entry| entry.created_at >= since)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AchievementRepository for InMemoryStorage {
    async fn get_progress(
        &self,
        user_id: &str,
        achievement_id: &str,
    ) -> Result<Option<UserAchievementProgress>, AppError> {
        Ok(self
            .achievements
            .read()
            .await
            .get(&key(user_id, achievement_id))
            .cloned())
    }

    async fn put_progress(&self, progress: &UserAchievementProgress) -> Result<(), AppError> {
        self.achievements.write().await.insert(
            key(&progress.user_id, &progress.achievement_id),
            progress.clone(),
        );
        Ok(())
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<UserAchievementProgress>, AppError> {
        let achievements = self.achievements.read().await;
        let mut progress: Vec<UserAchievementProgress> = achievements
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        progress.sort_by(|a, b| a.achievement_id.cmp(&b.achievement_id));
        Ok(progress)
    }
}

#[async_trait]
impl ClaimRepository for InMemoryStorage {
    async fn get_claim(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<Option<UserRewardClaim>, AppError> {
        Ok(self
            .claims
            .read()
            .await
            .claims
            .get(&key(user_id, reward_id))
            .cloned())
    }

    async fn put_claim(&self, claim: &UserRewardClaim) -> Result<(), AppError> {
        self.claims
            .write()
            .await
            .claims
            .insert(key(&claim.user_id, &claim.reward_id), claim.clone());
        Ok(())
    }

    async fn list_claims(&self, user_id: &str) -> Result<Vec<UserRewardClaim>, AppError> {
        let table = self.claims.read().await;
        let mut claims: Vec<UserRewardClaim> = table
            .claims
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        claims.sort_by(|a, b| a.claimed_at.cmp(&b.claimed_at));
        Ok(claims)
    }

    #[instrument(skip(self, claim), fields(user_id = %claim.user_id, reward_id = %claim.reward_id))]
    async fn try_claim(
        &self,
        claim: &UserRewardClaim,
        initial_claims: u64,
        max_claims: Option<u64>,
    ) -> Result<ClaimRewardResult, AppError> {
        let mut table = self.claims.write().await;
        let claim_key = key(&claim.user_id, &claim.reward_id);

        if let Some(existing) = table.claims.get(&claim_key) {
            if matches!(existing.status, ClaimStatus::Claimed | ClaimStatus::Used) {
                debug!("Reward already claimed by user");
                return Ok(ClaimRewardResult::AlreadyClaimed(existing.clone()));
            }
        }

        let total_claims = *table
            .counters
            .entry(claim.reward_id.clone())
            .or_insert(initial_claims);

        if let Some(max_claims) = max_claims {
            if total_claims >= max_claims {
                debug!(total_claims, max_claims, "Reward supply exhausted");
                return Ok(ClaimRewardResult::LimitReached { total_claims });
            }
        }

        table.claims.insert(claim_key, claim.clone());
        table
            .counters
            .insert(claim.reward_id.clone(), total_claims + 1);

        debug!(total_claims = total_claims + 1, "Reward claimed (atomic)");
        Ok(ClaimRewardResult::Claimed(claim.clone()))
    }

    async fn claim_count(&self, reward_id: &str) -> Result<Option<u64>, AppError> {
        Ok(self.claims.read().await.counters.get(reward_id).copied())
    }
}

#[async_trait]
impl EventRepository for InMemoryStorage {
    async fn record_event(&self, event: &ActivityEvent) -> Result<(), AppError> {
        self.events
            .write()
            .await
            .entry(event.user_id.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn list_events(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityEvent>, AppError> {
        let events = self.events.read().await;
        Ok(events
            .get(user_id)
            .map(|events| events.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl TriggerStateRepository for InMemoryStorage {
    async fn get_trigger_state(
        &self,
        trigger_id: &str,
        user_id: &str,
    ) -> Result<Option<TriggerState>, AppError> {
        Ok(self
            .trigger_states
            .read()
            .await
            .get(&key(trigger_id, user_id))
            .cloned())
    }

    async fn put_trigger_state(&self, state: &TriggerState) -> Result<(), AppError> {
        self.trigger_states
            .write()
            .await
            .insert(key(&state.trigger_id, &state.user_id), state.clone());
        Ok(())
    }
}
