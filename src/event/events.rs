use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::metadata::{Metadata, MetadataValue};
use crate::shared::AppError;

/// Activity a user can perform on the dashboard
///
/// Events represent facts about things that have already happened. The engine
/// turns them into points, counter updates and trigger evaluations.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EventType {
    ProjectApplicationSubmitted,
    ProjectApproved,
    InvestmentMade,
    DailyLogin,
    ProfileCompleted,
    WalletConnected,
    ReferralCompleted,
    CommunityContribution,
    GovernanceVoteCast,
    ProposalCreated,
}

impl EventType {
    /// Parses a wire name, mapping unknown names to `InvalidInput`
    pub fn parse(name: &str) -> Result<Self, AppError> {
        EventType::from_str(name)
            .map_err(|_| AppError::InvalidInput(format!("unknown event type '{}'", name)))
    }

    /// Metadata keys this event type must carry
    pub fn required_metadata(&self) -> &'static [&'static str] {
        match self {
            EventType::InvestmentMade => &["amount"],
            EventType::WalletConnected => &["wallet_address"],
            _ => &[],
        }
    }

    /// Checks the metadata against the schema of this event type
    pub fn validate_metadata(&self, metadata: &Metadata) -> Result<(), AppError> {
        for key in self.required_metadata() {
            let value = metadata.get(*key).ok_or_else(|| {
                AppError::InvalidInput(format!("{} requires metadata '{}'", self, key))
            })?;

            match (*key, value) {
                ("amount", value) => match value.as_f64() {
                    Some(amount) if amount.is_finite() && amount >= 0.0 => {}
                    _ => {
                        return Err(AppError::InvalidInput(format!(
                            "{} metadata 'amount' must be a non-negative number, got {}",
                            self,
                            value.type_name()
                        )))
                    }
                },
                ("wallet_address", MetadataValue::Text(address)) if !address.trim().is_empty() => {}
                ("wallet_address", _) => {
                    return Err(AppError::InvalidInput(format!(
                        "{} metadata 'wallet_address' must be a non-empty string",
                        self
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// A tracked event as recorded in storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: String,
    pub user_id: String,
    pub event_type: EventType,
    pub metadata: Metadata,
    pub schema_version: u32,
    pub points_awarded: u64,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("project_application_submitted", EventType::ProjectApplicationSubmitted)]
    #[case("DAILY_LOGIN", EventType::DailyLogin)]
    #[case("governance_vote_cast", EventType::GovernanceVoteCast)]
    fn parses_wire_names(#[case] name: &str, #[case] expected: EventType) {
        assert_eq!(EventType::parse(name).unwrap(), expected);
    }

    #[test]
    fn unknown_event_type_is_invalid_input() {
        assert!(matches!(
            EventType::parse("moon_landing"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn display_matches_serde_name() {
        let json = serde_json::to_string(&EventType::ReferralCompleted).unwrap();
        assert_eq!(json, format!("\"{}\"", EventType::ReferralCompleted));
    }

    #[test]
    fn investment_requires_non_negative_amount() {
        let mut metadata = Metadata::new();
        assert!(EventType::InvestmentMade.validate_metadata(&metadata).is_err());

        metadata.insert("amount".into(), MetadataValue::Int(-5));
        assert!(EventType::InvestmentMade.validate_metadata(&metadata).is_err());

        metadata.insert("amount".into(), MetadataValue::Text("lots".into()));
        assert!(EventType::InvestmentMade.validate_metadata(&metadata).is_err());

        metadata.insert("amount".into(), MetadataValue::Float(1500.5));
        assert!(EventType::InvestmentMade.validate_metadata(&metadata).is_ok());
    }

    #[test]
    fn wallet_connected_requires_address() {
        let mut metadata = Metadata::new();
        metadata.insert("wallet_address".into(), MetadataValue::Text("  ".into()));
        assert!(EventType::WalletConnected.validate_metadata(&metadata).is_err());

        metadata.insert("wallet_address".into(), "0xabc".into());
        assert!(EventType::WalletConnected.validate_metadata(&metadata).is_ok());
    }

    #[test]
    fn events_without_schema_accept_anything() {
        let mut metadata = Metadata::new();
        metadata.insert("anything".into(), MetadataValue::Bool(true));
        assert!(EventType::DailyLogin.validate_metadata(&metadata).is_ok());
    }
}
