use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{EventType, Metadata, MetadataValue};
use crate::progression::{LevelCurve, LevelProgress};

/// Per-user progression state
///
/// `current_level`, `points_to_next_level` and `level_progress` are caches of
/// `LevelCurve::level_for(total_points)` and are rewritten on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub wallet_address: Option<String>,
    pub display_name: Option<String>,
    pub total_points: u64,
    pub current_level: u32,
    pub points_to_next_level: u64,
    pub level_progress: u8,
    pub projects_applied: u64,
    pub projects_approved: u64,
    pub total_invested: f64,
    pub community_contributions: u64,
    pub referrals_count: u64,
    pub votes_cast: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub total_active_days: u32,
    pub reputation_score: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates a zeroed profile at level 1
    pub fn new(user_id: &str, curve: &LevelCurve, now: DateTime<Utc>) -> Self {
        let mut profile = Self {
            user_id: user_id.to_string(),
            wallet_address: None,
            display_name: None,
            total_points: 0,
            current_level: 1,
            points_to_next_level: 0,
            level_progress: 0,
            projects_applied: 0,
            projects_approved: 0,
            total_invested: 0.0,
            community_contributions: 0,
            referrals_count: 0,
            votes_cast: 0,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
            total_active_days: 0,
            reputation_score: 0,
            created_at: now,
            updated_at: now,
        };
        profile.apply_level(curve);
        profile
    }

    /// Rewrites the cached level fields from `total_points`
    pub fn apply_level(&mut self, curve: &LevelCurve) -> LevelProgress {
        let progress = curve.level_for(self.total_points);
        self.current_level = progress.level;
        self.points_to_next_level = progress.points_to_next;
        self.level_progress = progress.progress_percent;
        progress
    }

    /// Applies the counter side effects of an event. Metadata has already
    /// been validated against the event type's schema.
    pub fn apply_event(&mut self, event_type: EventType, metadata: &Metadata, now: DateTime<Utc>) {
        match event_type {
            EventType::ProjectApplicationSubmitted => self.projects_applied += 1,
            EventType::ProjectApproved => self.projects_approved += 1,
            EventType::InvestmentMade => {
                let amount = metadata
                    .get("amount")
                    .and_then(MetadataValue::as_f64)
                    .unwrap_or_default();
                self.total_invested += amount.max(0.0);
            }
            EventType::CommunityContribution => self.community_contributions += 1,
            EventType::ReferralCompleted => self.referrals_count += 1,
            EventType::GovernanceVoteCast => self.votes_cast += 1,
            EventType::WalletConnected => {
                if let Some(address) = metadata.get("wallet_address").and_then(MetadataValue::as_str)
                {
                    self.wallet_address = Some(address.to_string());
                }
            }
            EventType::DailyLogin
            | EventType::ProfileCompleted
            | EventType::ProposalCreated => {}
        }

        if self.display_name.is_none() {
            if let Some(name) = metadata.get("display_name").and_then(MetadataValue::as_str) {
                self.display_name = Some(name.to_string());
            }
        }

        self.record_activity_day(now.date_naive());
        self.recompute_reputation();
        self.updated_at = now;
    }

    /// Advances the daily streak for activity on `today`
    pub fn record_activity_day(&mut self, today: NaiveDate) {
        match self.last_activity_date {
            Some(last) if last == today => return,
            Some(last) if last > today => return,
            Some(last) if last.succ_opt() == Some(today) => self.current_streak += 1,
            _ => self.current_streak = 1,
        }
        self.total_active_days += 1;
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_activity_date = Some(today);
    }

    /// Reputation weighs the contributions that need other people's approval
    /// above raw activity.
    pub fn recompute_reputation(&mut self) {
        self.reputation_score = self.projects_approved * 25
            + self.referrals_count * 15
            + self.community_contributions * 5
            + self.votes_cast * 3
            + self.projects_applied
            + u64::from(self.longest_streak) * 2;
    }

    /// Looks up a profile field by its wire name, for trigger conditions
    pub fn field(&self, name: &str) -> Option<MetadataValue> {
        let value = match name {
            "user_id" => MetadataValue::Text(self.user_id.clone()),
            "wallet_address" => MetadataValue::Text(self.wallet_address.clone()?),
            "display_name" => MetadataValue::Text(self.display_name.clone()?),
            "total_points" => self.total_points.into(),
            "current_level" | "level" => self.current_level.into(),
            "points_to_next_level" => self.points_to_next_level.into(),
            "level_progress" => u32::from(self.level_progress).into(),
            "projects_applied" => self.projects_applied.into(),
            "projects_approved" => self.projects_approved.into(),
            "total_invested" => self.total_invested.into(),
            "community_contributions" => self.community_contributions.into(),
            "referrals_count" => self.referrals_count.into(),
            "votes_cast" => self.votes_cast.into(),
            "current_streak" => self.current_streak.into(),
            "longest_streak" => self.longest_streak.into(),
            "total_active_days" => self.total_active_days.into(),
            "reputation_score" => self.reputation_score.into(),
            "has_wallet" => self.wallet_address.is_some().into(),
            _ => return None,
        };
        Some(value)
    }
}
