use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::builder::GamificationEngineBuilder;
use crate::{
    achievement::{AchievementService, AchievementStatus, UserAchievementProgress},
    catalog::Catalog,
    clock::Clock,
    config::EngineConfig,
    event::{ActivityEvent, EventType, Metadata, METADATA_SCHEMA_VERSION},
    leaderboard::{Leaderboard, LeaderboardScope, LeaderboardService, UserRank},
    ledger::{PointsCategory, PointsLedger, PointsLedgerEntry},
    notification::{Notification, NotificationBus},
    profile::UserProfile,
    reward::{RewardDefinition, RewardService, UserRewardClaim},
    shared::AppError,
    storage::{Storage, UserLocks},
    trigger::{TriggerOutcome, TriggerResult, TriggerSystem},
};

/// Everything that happened while tracking one event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedEvent {
    pub event: ActivityEvent,
    pub profile: UserProfile,
    pub trigger_outcomes: Vec<TriggerOutcome>,
    pub newly_unlocked: Vec<String>,
    /// Trigger or achievement processing errors. The event itself was recorded.
    pub follow_up_errors: Vec<String>,
}

pub struct GamificationEngine {
    pub(super) storage: Arc<dyn Storage>,
    pub(super) catalog: Arc<Catalog>,
    pub(super) config: EngineConfig,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) locks: Arc<UserLocks>,
    pub(super) notifications: NotificationBus,
    pub(super) ledger: Arc<PointsLedger>,
    pub(super) achievements: Arc<AchievementService>,
    pub(super) rewards: Arc<RewardService>,
    pub(super) triggers: TriggerSystem,
    pub(super) leaderboard: Arc<LeaderboardService>,
}

impl GamificationEngine {
    pub fn builder(storage: Arc<dyn Storage>) -> GamificationEngineBuilder {
        GamificationEngineBuilder::new(storage)
    }

    /// Records an activity event: counters and streak, base points, the raw
    /// event, triggers, then achievements. The first four commit before
    /// triggers run; trigger and achievement failures are reported in the
    /// result, never returned as errors.
    #[instrument(skip(self, metadata))]
    pub async fn track_event(
        &self,
        user_id: &str,
        event_type: EventType,
        metadata: Metadata,
    ) -> Result<TrackedEvent, AppError> {
        validate_user_id(user_id)?;
        event_type.validate_metadata(&metadata)?;

        let _guard = self.locks.lock(user_id).await;
        let now = self.clock.now();

        let mut profile = self.ledger.ensure_profile(user_id).await?;
        profile.apply_event(event_type, &metadata, now);
        self.storage.put_profile(&profile).await?;

        let points_awarded = self.catalog.base_points(event_type);
        if points_awarded > 0 {
            let delta = i64::try_from(points_awarded).map_err(|_| AppError::Internal)?;
            self.ledger
                .award(
                    user_id,
                    delta,
                    &format!("Activity: {}", event_type),
                    PointsCategory::Activity,
                    metadata.clone(),
                )
                .await?;
        }

        let event = ActivityEvent {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            event_type,
            metadata,
            schema_version: METADATA_SCHEMA_VERSION,
            points_awarded,
            occurred_at: now,
        };
        self.storage.record_event(&event).await?;

        let mut follow_up_errors = Vec::new();

        let trigger_outcomes = self.triggers.process(&event).await;
        for outcome in &trigger_outcomes {
            if let TriggerResult::Errored { error } = &outcome.result {
                follow_up_errors.push(format!("trigger {}: {}", outcome.trigger_id, error));
            }
        }

        let newly_unlocked = self
            .settle_achievements(user_id, &mut follow_up_errors)
            .await;

        let profile = self
            .storage
            .get_profile(user_id)
            .await?
            .ok_or(AppError::Internal)?;

        info!(
            user_id = %user_id,
            event_type = %event_type,
            points_awarded,
            triggers_fired = trigger_outcomes.iter().filter(|outcome| outcome.fired()).count(),
            unlocked = newly_unlocked.len(),
            "Event tracked"
        );

        Ok(TrackedEvent {
            event,
            profile,
            trigger_outcomes,
            newly_unlocked,
            follow_up_errors,
        })
    }

    /// Direct point award or correction. Negative deltas need the penalty category.
    #[instrument(skip(self, metadata))]
    pub async fn award_points(
        &self,
        user_id: &str,
        delta: i64,
        reason: &str,
        category: PointsCategory,
        metadata: Metadata,
    ) -> Result<PointsLedgerEntry, AppError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.lock(user_id).await;

        let entry = self
            .ledger
            .award(user_id, delta, reason, category, metadata)
            .await?;
        self.settle_achievements(user_id, &mut Vec::new()).await;
        Ok(entry)
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        self.storage
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile for user '{}'", user_id)))
    }

    pub async fn get_achievements(&self, user_id: &str) -> Result<Vec<AchievementStatus>, AppError> {
        self.achievements.list(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn unlock_achievement(
        &self,
        user_id: &str,
        achievement_id: &str,
    ) -> Result<UserAchievementProgress, AppError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.lock(user_id).await;

        let progress = self.achievements.unlock(user_id, achievement_id).await?;
        self.settle_achievements(user_id, &mut Vec::new()).await;
        Ok(progress)
    }

    pub async fn get_available_rewards(
        &self,
        user_id: &str,
    ) -> Result<Vec<RewardDefinition>, AppError> {
        self.rewards.list_available(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn claim_reward(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<UserRewardClaim, AppError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.lock(user_id).await;

        let claim = self.rewards.claim(user_id, reward_id).await?;
        self.settle_achievements(user_id, &mut Vec::new()).await;
        Ok(claim)
    }

    #[instrument(skip(self))]
    pub async fn use_reward(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<UserRewardClaim, AppError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.lock(user_id).await;
        self.rewards.use_reward(user_id, reward_id).await
    }

    pub async fn get_claims(&self, user_id: &str) -> Result<Vec<UserRewardClaim>, AppError> {
        self.rewards.claims(user_id).await
    }

    pub async fn get_leaderboard(
        &self,
        scope: LeaderboardScope,
        limit: usize,
    ) -> Result<Leaderboard, AppError> {
        self.leaderboard.leaderboard(scope, limit).await
    }

    pub async fn get_user_rank(
        &self,
        user_id: &str,
        scope: LeaderboardScope,
    ) -> Result<UserRank, AppError> {
        self.leaderboard.user_rank(user_id, scope).await
    }

    /// The user's ledger in append order
    pub async fn get_ledger(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, AppError> {
        self.ledger.entries(user_id).await
    }

    /// Most recent first
    pub async fn get_recent_events(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityEvent>, AppError> {
        self.storage.list_events(user_id, limit).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.notifications
    }

    pub fn leaderboard_service(&self) -> Arc<LeaderboardService> {
        self.leaderboard.clone()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Delayed trigger actions still waiting to run
    pub async fn pending_actions(&self) -> usize {
        self.triggers.scheduler().pending().await
    }

    /// Cancels delayed trigger actions that have not run yet
    pub async fn shutdown(&self) {
        self.triggers.scheduler().abort_all().await;
        info!("Gamification engine stopped");
    }

    /// Caller holds the user's lock
    async fn settle_achievements(&self, user_id: &str, errors: &mut Vec<String>) -> Vec<String> {
        match self.achievements.refresh(user_id).await {
            Ok(unlocked) => unlocked,
            Err(e) => {
                warn!(user_id = %user_id, "Achievement refresh failed: {}", e);
                errors.push(format!("achievements: {}", e));
                Vec::new()
            }
        }
    }
}

fn validate_user_id(user_id: &str) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("user id must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::event::MetadataValue;
    use crate::storage::InMemoryStorage;

    fn engine_with(catalog: Catalog) -> (GamificationEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let engine = GamificationEngine::builder(Arc::new(InMemoryStorage::new()))
            .with_catalog(catalog)
            .with_clock(clock.clone())
            .build()
            .unwrap();
        (engine, clock)
    }

    fn points_only() -> Catalog {
        Catalog::from_json(r#"{"point_table": {"project_application_submitted": 50}}"#).unwrap()
    }

    #[tokio::test]
    async fn first_event_creates_the_profile() {
        let (engine, _) = engine_with(points_only());

        let tracked = engine
            .track_event("alice", EventType::ProjectApplicationSubmitted, Metadata::new())
            .await
            .unwrap();

        assert_eq!(tracked.event.points_awarded, 50);
        assert_eq!(tracked.profile.total_points, 50);
        assert_eq!(tracked.profile.current_level, 1);
        assert_eq!(tracked.profile.projects_applied, 1);
        assert_eq!(tracked.profile.current_streak, 1);
        assert!(tracked.follow_up_errors.is_empty());
    }

    #[tokio::test]
    async fn invalid_metadata_changes_nothing() {
        let (engine, _) = engine_with(points_only());

        let result = engine
            .track_event("alice", EventType::InvestmentMade, Metadata::new())
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(matches!(
            engine.get_profile("alice").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn events_without_base_points_still_count() {
        let (engine, _) = engine_with(points_only());
        let metadata = Metadata::from([("amount".to_string(), MetadataValue::Float(250.5))]);

        let tracked = engine
            .track_event("alice", EventType::InvestmentMade, metadata)
            .await
            .unwrap();

        assert_eq!(tracked.event.points_awarded, 0);
        assert_eq!(tracked.profile.total_invested, 250.5);
        assert!(engine.get_ledger("alice").await.unwrap().is_empty());
        assert_eq!(engine.get_recent_events("alice", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_blank_user_ids() {
        let (engine, _) = engine_with(points_only());
        assert!(matches!(
            engine
                .track_event(" ", EventType::DailyLogin, Metadata::new())
                .await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn builder_rejects_invalid_catalog() {
        let mut catalog = Catalog::builtin().unwrap();
        let duplicate = catalog.rewards[0].clone();
        catalog.rewards.push(duplicate);

        let result = GamificationEngine::builder(Arc::new(InMemoryStorage::new()))
            .with_catalog(catalog)
            .build();
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn builder_rejects_achievements_without_requirements() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog.achievements[0].requirements.clear();

        let result = GamificationEngine::builder(Arc::new(InMemoryStorage::new()))
            .with_catalog(catalog)
            .build();
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn use_reward_rejects_blank_user_ids() {
        let (engine, _) = engine_with(points_only());
        assert!(matches!(
            engine.use_reward("", "anything").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn builtin_catalog_unlocks_first_application() {
        let engine = GamificationEngine::builder(Arc::new(InMemoryStorage::new()))
            .with_clock(Arc::new(ManualClock::default()))
            .build()
            .unwrap();

        let tracked = engine
            .track_event("alice", EventType::ProjectApplicationSubmitted, Metadata::new())
            .await
            .unwrap();

        assert_eq!(tracked.newly_unlocked, vec!["first_application".to_string()]);
        assert_eq!(tracked.profile.total_points, 75);
    }
}
