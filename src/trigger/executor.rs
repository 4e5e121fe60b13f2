use std::sync::Arc;

use tracing::debug;

use super::models::ActionKind;
use crate::{
    achievement::AchievementService,
    clock::Clock,
    event::{Metadata, MetadataValue},
    ledger::{PointsCategory, PointsLedger},
    notification::{Notification, NotificationBus, NotificationKind},
    reward::RewardService,
    shared::AppError,
};

/// Runs trigger actions against the engine's services. Callers hold the
/// user's lock.
pub struct ActionExecutor {
    ledger: Arc<PointsLedger>,
    achievements: Arc<AchievementService>,
    rewards: Arc<RewardService>,
    notifications: NotificationBus,
    clock: Arc<dyn Clock>,
}

impl ActionExecutor {
    pub fn new(
        ledger: Arc<PointsLedger>,
        achievements: Arc<AchievementService>,
        rewards: Arc<RewardService>,
        notifications: NotificationBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            achievements,
            rewards,
            notifications,
            clock,
        }
    }

    pub async fn execute(
        &self,
        user_id: &str,
        trigger_id: &str,
        action: &ActionKind,
    ) -> Result<(), AppError> {
        debug!(user_id = %user_id, trigger_id, action = action.name(), "Executing trigger action");

        match action {
            ActionKind::AwardPoints { points, reason } => {
                let category = if *points < 0 {
                    PointsCategory::Penalty
                } else {
                    PointsCategory::Trigger
                };
                let metadata = Metadata::from([(
                    "trigger_id".to_string(),
                    MetadataValue::from(trigger_id),
                )]);
                self.ledger
                    .award(user_id, *points, reason, category, metadata)
                    .await?;
            }
            ActionKind::UnlockAchievement { achievement_id } => {
                self.achievements.unlock(user_id, achievement_id).await?;
            }
            ActionKind::GrantReward { reward_id } => {
                self.rewards.claim(user_id, reward_id).await?;
            }
            ActionKind::Notify { title, message } => {
                self.notifications.emit(Notification::new(
                    user_id,
                    NotificationKind::Message {
                        title: title.clone(),
                        message: message.clone(),
                        trigger_id: Some(trigger_id.to_string()),
                    },
                    self.clock.now(),
                ));
            }
        }

        Ok(())
    }

    /// Re-evaluates achievements after actions changed the profile outside
    /// of event processing
    pub async fn settle(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        self.achievements.refresh(user_id).await
    }
}
