use serde::{Deserialize, Serialize};

use crate::event::Metadata;
use crate::leaderboard::{LeaderboardMetric, LeaderboardScope, Timeframe};
use crate::ledger::PointsCategory;

/// Body of `POST /users/:user_id/events`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackEventRequest {
    /// Wire name, e.g. `daily_login`
    pub event_type: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Body of `POST /users/:user_id/points`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwardPointsRequest {
    pub delta: i64,
    pub reason: String,
    #[serde(default = "default_award_category")]
    pub category: PointsCategory,
    #[serde(default)]
    pub metadata: Metadata,
}

fn default_award_category() -> PointsCategory {
    PointsCategory::Administrative
}

/// Query string shared by the ranking endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardQuery {
    pub timeframe: Option<Timeframe>,
    pub metric: Option<LeaderboardMetric>,
    pub limit: Option<usize>,
}

impl LeaderboardQuery {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn scope(&self) -> LeaderboardScope {
        LeaderboardScope::new(
            self.timeframe.unwrap_or_default(),
            self.metric.unwrap_or_default(),
        )
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MetadataValue;

    #[test]
    fn award_request_defaults_to_administrative() {
        let request: AwardPointsRequest =
            serde_json::from_str(r#"{"delta": 40, "reason": "hackathon prize"}"#).unwrap();

        assert_eq!(request.category, PointsCategory::Administrative);
        assert!(request.metadata.is_empty());
    }

    #[test]
    fn event_request_keeps_typed_metadata() {
        let request: TrackEventRequest = serde_json::from_str(
            r#"{"event_type": "investment_made", "metadata": {"amount": 1500.5, "round": "seed"}}"#,
        )
        .unwrap();

        assert_eq!(request.metadata["amount"], MetadataValue::Float(1500.5));
        assert_eq!(
            request.metadata["round"],
            MetadataValue::Text("seed".to_string())
        );
    }

    #[test]
    fn empty_query_uses_defaults() {
        let query = LeaderboardQuery::default();
        assert_eq!(query.scope(), LeaderboardScope::default());
        assert_eq!(query.limit(), LeaderboardQuery::DEFAULT_LIMIT);
    }
}
