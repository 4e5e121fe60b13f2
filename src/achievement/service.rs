use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use super::evaluator::evaluate;
use super::models::{
    AchievementDefinition, AchievementEvaluation, RequirementValue, UserAchievementProgress,
};
use crate::{
    catalog::Catalog,
    clock::Clock,
    event::{Metadata, MetadataValue},
    ledger::{PointsCategory, PointsLedger},
    notification::{Notification, NotificationBus, NotificationKind},
    shared::AppError,
    storage::Storage,
};

/// An achievement as one user sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub definition: AchievementDefinition,
    pub progress_percent: u8,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub requirement_values: Vec<RequirementValue>,
}

pub struct AchievementService {
    storage: Arc<dyn Storage>,
    catalog: Arc<Catalog>,
    ledger: Arc<PointsLedger>,
    clock: Arc<dyn Clock>,
    notifications: NotificationBus,
}

impl AchievementService {
    pub fn new(
        storage: Arc<dyn Storage>,
        catalog: Arc<Catalog>,
        ledger: Arc<PointsLedger>,
        clock: Arc<dyn Clock>,
        notifications: NotificationBus,
    ) -> Self {
        Self {
            storage,
            catalog,
            ledger,
            clock,
            notifications,
        }
    }

    /// Marks an achievement complete for the user regardless of its
    /// requirements and books its point reward. Unlocking twice returns the
    /// existing record without paying again.
    #[instrument(skip(self))]
    pub async fn unlock(
        &self,
        user_id: &str,
        achievement_id: &str,
    ) -> Result<UserAchievementProgress, AppError> {
        let definition = self
            .catalog
            .achievement(achievement_id)
            .ok_or_else(|| AppError::NotFound(format!("achievement '{}'", achievement_id)))?;
        if !definition.is_active {
            return Err(AppError::NotEligible(format!(
                "achievement '{}' is not active",
                achievement_id
            )));
        }

        if let Some(existing) = self.storage.get_progress(user_id, achievement_id).await? {
            if existing.completed {
                debug!(user_id = %user_id, achievement_id, "Achievement already unlocked");
                return Ok(existing);
            }
        }

        let profile = self.ledger.ensure_profile(user_id).await?;
        let evaluation = evaluate(&profile, definition);
        self.complete(user_id, definition, evaluation.requirement_values)
            .await
    }

    /// Evaluates every active achievement, records progress and unlocks the
    /// newly eligible ones. Repeats while unlocks keep happening, since an
    /// unlock's point reward can satisfy point or level requirements.
    /// Returns the ids unlocked by this call.
    #[instrument(skip(self))]
    pub async fn refresh(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let mut completed: HashSet<String> = self
            .storage
            .list_progress(user_id)
            .await?
            .into_iter()
            .filter(|progress| progress.completed)
            .map(|progress| progress.achievement_id)
            .collect();
        let mut unlocked = Vec::new();

        loop {
            let Some(profile) = self.storage.get_profile(user_id).await? else {
                return Ok(unlocked);
            };

            let mut unlocked_this_round = false;
            for definition in self.catalog.active_achievements() {
                if completed.contains(&definition.id) {
                    continue;
                }

                let evaluation = evaluate(&profile, definition);
                if evaluation.eligible {
                    self.complete(user_id, definition, evaluation.requirement_values)
                        .await?;
                    completed.insert(definition.id.clone());
                    unlocked.push(definition.id.clone());
                    unlocked_this_round = true;
                } else {
                    self.record_progress(user_id, definition, evaluation).await?;
                }
            }

            if !unlocked_this_round {
                return Ok(unlocked);
            }
        }
    }

    /// Active achievements with the user's progress. Secret achievements stay
    /// hidden until completed; completed ones stay listed even if retired.
    pub async fn list(&self, user_id: &str) -> Result<Vec<AchievementStatus>, AppError> {
        let profile = self.ledger.profile_or_new(user_id).await?;
        let records: HashMap<String, UserAchievementProgress> = self
            .storage
            .list_progress(user_id)
            .await?
            .into_iter()
            .map(|progress| (progress.achievement_id.clone(), progress))
            .collect();

        let statuses = self
            .catalog
            .achievements
            .iter()
            .filter_map(|definition| {
                let record = records.get(&definition.id).filter(|record| record.completed);
                match record {
                    Some(record) => Some(AchievementStatus {
                        definition: definition.clone(),
                        progress_percent: 100,
                        completed: true,
                        completed_at: record.completed_at,
                        requirement_values: record.requirement_values.clone(),
                    }),
                    None if !definition.is_active || definition.is_secret => None,
                    None => {
                        let evaluation = evaluate(&profile, definition);
                        Some(AchievementStatus {
                            definition: definition.clone(),
                            progress_percent: evaluation.progress_percent,
                            completed: false,
                            completed_at: None,
                            requirement_values: evaluation.requirement_values,
                        })
                    }
                }
            })
            .collect();

        Ok(statuses)
    }

    async fn complete(
        &self,
        user_id: &str,
        definition: &AchievementDefinition,
        requirement_values: Vec<RequirementValue>,
    ) -> Result<UserAchievementProgress, AppError> {
        let now = self.clock.now();
        let progress = UserAchievementProgress {
            user_id: user_id.to_string(),
            achievement_id: definition.id.clone(),
            progress_percent: 100,
            requirement_values,
            completed: true,
            completed_at: Some(now),
            updated_at: now,
        };
        self.storage.put_progress(&progress).await?;

        if definition.point_reward > 0 {
            let points = i64::try_from(definition.point_reward).map_err(|_| {
                AppError::InvalidInput(format!(
                    "achievement '{}' point reward is too large",
                    definition.id
                ))
            })?;
            let metadata = Metadata::from([(
                "achievement_id".to_string(),
                MetadataValue::from(definition.id.as_str()),
            )]);
            self.ledger
                .award(
                    user_id,
                    points,
                    &format!("Achievement unlocked: {}", definition.name),
                    PointsCategory::Achievement,
                    metadata,
                )
                .await?;
        }

        info!(
            user_id = %user_id,
            achievement_id = %definition.id,
            points = definition.point_reward,
            "Achievement unlocked"
        );
        self.notifications.emit(Notification::new(
            user_id,
            NotificationKind::AchievementUnlocked {
                achievement_id: definition.id.clone(),
                name: definition.name.clone(),
                points: definition.point_reward,
            },
            now,
        ));

        Ok(progress)
    }

    async fn record_progress(
        &self,
        user_id: &str,
        definition: &AchievementDefinition,
        evaluation: AchievementEvaluation,
    ) -> Result<(), AppError> {
        let existing = self.storage.get_progress(user_id, &definition.id).await?;
        let unchanged = existing.is_some_and(|existing| {
            existing.progress_percent == evaluation.progress_percent
                && existing.requirement_values == evaluation.requirement_values
        });
        if unchanged {
            return Ok(());
        }

        self.storage
            .put_progress(&UserAchievementProgress {
                user_id: user_id.to_string(),
                achievement_id: definition.id.clone(),
                progress_percent: evaluation.progress_percent,
                requirement_values: evaluation.requirement_values,
                completed: false,
                completed_at: None,
                updated_at: self.clock.now(),
            })
            .await
    }
}
