use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::info;

use crate::{
    achievement::AchievementDefinition,
    event::EventType,
    reward::RewardDefinition,
    shared::AppError,
    trigger::{ActionKind, EventTrigger},
};

/// Catalog shipped with the binary
pub const DEFAULT_CATALOG_JSON: &str = include_str!("../../config/default_catalog.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Base points per event type. Missing types earn nothing.
    #[serde(default)]
    pub point_table: BTreeMap<EventType, u64>,
    #[serde(default)]
    pub achievements: Vec<AchievementDefinition>,
    #[serde(default)]
    pub rewards: Vec<RewardDefinition>,
    #[serde(default)]
    pub triggers: Vec<EventTrigger>,
}

impl Catalog {
    /// Parses and validates the embedded default catalog
    pub fn builtin() -> Result<Self, AppError> {
        Self::from_json(DEFAULT_CATALOG_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let catalog: Catalog = serde_json::from_str(json)
            .map_err(|e| AppError::InvalidInput(format!("catalog is not valid: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::InvalidInput(format!("cannot read catalog {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&json)?;
        info!(
            path = %path.display(),
            achievements = catalog.achievements.len(),
            rewards = catalog.rewards.len(),
            triggers = catalog.triggers.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    pub fn base_points(&self, event_type: EventType) -> u64 {
        self.point_table.get(&event_type).copied().unwrap_or_default()
    }

    pub fn achievement(&self, achievement_id: &str) -> Option<&AchievementDefinition> {
        self.achievements
            .iter()
            .find(|achievement| achievement.id == achievement_id)
    }

    pub fn active_achievements(&self) -> impl Iterator<Item = &AchievementDefinition> {
        self.achievements
            .iter()
            .filter(|achievement| achievement.is_active)
    }

    pub fn reward(&self, reward_id: &str) -> Option<&RewardDefinition> {
        self.rewards.iter().find(|reward| reward.id == reward_id)
    }

    /// Active triggers listening for `event_type`, in catalog order
    pub fn triggers_for(&self, event_type: EventType) -> impl Iterator<Item = &EventTrigger> {
        self.triggers
            .iter()
            .filter(move |trigger| trigger.is_active && trigger.event_type == event_type)
    }

    /// Rejects duplicate ids, dangling references and definitions that could
    /// never be satisfied or executed.
    pub fn validate(&self) -> Result<(), AppError> {
        unique_ids("achievement", self.achievements.iter().map(|a| a.id.as_str()))?;
        unique_ids("reward", self.rewards.iter().map(|r| r.id.as_str()))?;
        unique_ids("trigger", self.triggers.iter().map(|t| t.id.as_str()))?;

        for achievement in &self.achievements {
            if achievement.requirements.is_empty() {
                return Err(invalid(format!(
                    "achievement '{}' has no requirements",
                    achievement.id
                )));
            }
            for requirement in &achievement.requirements {
                if !requirement.target.is_finite() || requirement.target < 0.0 {
                    return Err(invalid(format!(
                        "achievement '{}' has an invalid {} target",
                        achievement.id, requirement.requirement_type
                    )));
                }
            }
        }

        for reward in &self.rewards {
            if !reward.value.is_finite() || reward.value < 0.0 {
                return Err(invalid(format!("reward '{}' has an invalid value", reward.id)));
            }
            if reward.is_limited && reward.max_claims.is_none() {
                return Err(invalid(format!(
                    "reward '{}' is limited but has no max_claims",
                    reward.id
                )));
            }
            for achievement_id in &reward.required_achievements {
                if self.achievement(achievement_id).is_none() {
                    return Err(invalid(format!(
                        "reward '{}' requires unknown achievement '{}'",
                        reward.id, achievement_id
                    )));
                }
            }
        }

        for trigger in &self.triggers {
            if trigger.actions.is_empty() {
                return Err(invalid(format!("trigger '{}' has no actions", trigger.id)));
            }
            for action in &trigger.actions {
                self.validate_action(&trigger.id, &action.kind)?;
            }
        }

        Ok(())
    }

    fn validate_action(&self, trigger_id: &str, action: &ActionKind) -> Result<(), AppError> {
        match action {
            ActionKind::AwardPoints { points, reason } => {
                if *points == 0 || reason.trim().is_empty() {
                    return Err(invalid(format!(
                        "trigger '{}' awards zero points or has no reason",
                        trigger_id
                    )));
                }
            }
            ActionKind::UnlockAchievement { achievement_id } => {
                if self.achievement(achievement_id).is_none() {
                    return Err(invalid(format!(
                        "trigger '{}' unlocks unknown achievement '{}'",
                        trigger_id, achievement_id
                    )));
                }
            }
            ActionKind::GrantReward { reward_id } => {
                if self.reward(reward_id).is_none() {
                    return Err(invalid(format!(
                        "trigger '{}' grants unknown reward '{}'",
                        trigger_id, reward_id
                    )));
                }
            }
            ActionKind::Notify { .. } => {}
        }
        Ok(())
    }
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(invalid(format!("{} with an empty id", kind)));
        }
        if !seen.insert(id) {
            return Err(invalid(format!("duplicate {} id '{}'", kind, id)));
        }
    }
    Ok(())
}

fn invalid(message: String) -> AppError {
    AppError::InvalidInput(message)
}
