#![allow(dead_code)] // Test utilities may not all be used in every test

use chrono::Duration;

use gamification::{
    engine::TrackedEvent,
    event::{EventType, Metadata, MetadataValue},
    ledger::{PointsCategory, PointsLedgerEntry},
};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Track an event without metadata
    pub async fn track(&self, user_id: &str, event_type: EventType) -> TrackedEvent {
        self.engine
            .track_event(user_id, event_type, Metadata::new())
            .await
            .unwrap()
    }

    /// Track the same event `times` times, returning the last result
    pub async fn track_times(
        &self,
        user_id: &str,
        event_type: EventType,
        times: usize,
    ) -> TrackedEvent {
        let mut last = None;
        for _ in 0..times {
            last = Some(self.track(user_id, event_type).await);
        }
        last.expect("times must be at least 1")
    }

    pub async fn invest(&self, user_id: &str, amount: f64) -> TrackedEvent {
        let metadata = Metadata::from([("amount".to_string(), MetadataValue::Float(amount))]);
        self.engine
            .track_event(user_id, EventType::InvestmentMade, metadata)
            .await
            .unwrap()
    }

    pub async fn award(&self, user_id: &str, delta: i64) -> PointsLedgerEntry {
        self.engine
            .award_points(
                user_id,
                delta,
                "test award",
                PointsCategory::Administrative,
                Metadata::new(),
            )
            .await
            .unwrap()
    }

    pub async fn penalize(&self, user_id: &str, delta: i64) -> PointsLedgerEntry {
        self.engine
            .award_points(
                user_id,
                delta,
                "test penalty",
                PointsCategory::Penalty,
                Metadata::new(),
            )
            .await
            .unwrap()
    }

    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance(Duration::seconds(secs));
    }

    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }
}
