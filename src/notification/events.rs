use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something worth telling a user about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    LevelUp {
        previous_level: u32,
        new_level: u32,
    },
    AchievementUnlocked {
        achievement_id: String,
        name: String,
        points: u64,
    },
    RewardClaimed {
        reward_id: String,
        name: String,
    },
    /// Free-form message produced by a trigger's `notify` action
    Message {
        title: String,
        message: String,
        trigger_id: Option<String>,
    },
}

impl Notification {
    pub fn new(user_id: &str, kind: NotificationKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            created_at,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NotificationKind::LevelUp { .. } => "level_up",
            NotificationKind::AchievementUnlocked { .. } => "achievement_unlocked",
            NotificationKind::RewardClaimed { .. } => "reward_claimed",
            NotificationKind::Message { .. } => "message",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let notification = Notification::new(
            "user-1",
            NotificationKind::LevelUp {
                previous_level: 1,
                new_level: 2,
            },
            Utc::now(),
        );

        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["kind"]["type"], "level_up");
        assert_eq!(json["kind"]["new_level"], 2);
        assert_eq!(notification.kind_name(), "level_up");
    }
}
