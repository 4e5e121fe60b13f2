use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::event::{EventType, MetadataValue};

/// Where a condition reads its field from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldSource {
    /// `event_type` or a metadata key of the incoming event
    Event,
    /// A field of the user's profile, read after the event's points were applied
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operator {
    #[serde(alias = "=", alias = "==")]
    Eq,
    #[serde(alias = "!=")]
    Ne,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = ">=")]
    Gte,
    #[serde(alias = "<=")]
    Lte,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCondition {
    pub source: FieldSource,
    pub field: String,
    pub operator: Operator,
    pub value: MetadataValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Negative points are booked as a penalty
    AwardPoints { points: i64, reason: String },
    UnlockAchievement { achievement_id: String },
    GrantReward { reward_id: String },
    Notify { title: String, message: String },
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::AwardPoints { .. } => "award_points",
            ActionKind::UnlockAchievement { .. } => "unlock_achievement",
            ActionKind::GrantReward { .. } => "grant_reward",
            ActionKind::Notify { .. } => "notify",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerAction {
    #[serde(flatten)]
    pub kind: ActionKind,
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

/// Rule that reacts to one event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTrigger {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub event_type: EventType,
    #[serde(default)]
    pub conditions: Vec<TriggerCondition>,
    pub actions: Vec<TriggerAction>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Per-user minimum gap between firings
    #[serde(default)]
    pub cooldown_secs: Option<u64>,
    /// Per-user limit on firings
    #[serde(default)]
    pub max_triggers: Option<u64>,
}

fn default_true() -> bool {
    true
}

/// Per (trigger, user) firing history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerState {
    pub trigger_id: String,
    pub user_id: String,
    pub trigger_count: u64,
    pub last_triggered_at: Option<DateTime<Utc>>,
}

impl TriggerState {
    pub fn new(trigger_id: &str, user_id: &str) -> Self {
        Self {
            trigger_id: trigger_id.to_string(),
            user_id: user_id.to_string(),
            trigger_count: 0,
            last_triggered_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStatus {
    Succeeded,
    Scheduled { run_at: DateTime<Utc> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: String,
    #[serde(flatten)]
    pub status: ActionStatus,
}

impl ActionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ActionStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TriggerResult {
    Fired { actions: Vec<ActionOutcome> },
    ConditionsNotMet,
    CoolingDown { remaining_secs: i64 },
    CapReached { trigger_count: u64 },
    /// Storage failed before the trigger could fire. No action ran.
    Errored { error: String },
}

/// What happened to one matching trigger during event processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerOutcome {
    pub trigger_id: String,
    #[serde(flatten)]
    pub result: TriggerResult,
}

impl TriggerOutcome {
    pub fn fired(&self) -> bool {
        matches!(self.result, TriggerResult::Fired { .. })
    }
}
