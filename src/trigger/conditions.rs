use super::models::{FieldSource, Operator, TriggerCondition};
use crate::event::{ActivityEvent, MetadataValue};
use crate::profile::UserProfile;

/// True when every condition holds. An empty list always holds.
pub fn conditions_met(
    conditions: &[TriggerCondition],
    event: &ActivityEvent,
    profile: &UserProfile,
) -> bool {
    conditions
        .iter()
        .all(|condition| condition_met(condition, event, profile))
}

/// Missing fields and mismatched types make a condition false
pub fn condition_met(condition: &TriggerCondition, event: &ActivityEvent, profile: &UserProfile) -> bool {
    let actual = match condition.source {
        FieldSource::Event => event_field(event, &condition.field),
        FieldSource::Profile => profile.field(&condition.field),
    };

    actual.is_some_and(|actual| compare(&actual, condition.operator, &condition.value))
}

fn event_field(event: &ActivityEvent, field: &str) -> Option<MetadataValue> {
    match field {
        "event_type" => Some(MetadataValue::Text(event.event_type.to_string())),
        "user_id" => Some(MetadataValue::Text(event.user_id.clone())),
        _ => event.metadata.get(field).cloned(),
    }
}

pub fn compare(actual: &MetadataValue, operator: Operator, expected: &MetadataValue) -> bool {
    match operator {
        Operator::Eq => same_value(actual, expected) == Some(true),
        Operator::Ne => same_value(actual, expected) == Some(false),
        Operator::Gt => numeric(actual, expected).is_some_and(|(a, b)| a > b),
        Operator::Lt => numeric(actual, expected).is_some_and(|(a, b)| a < b),
        Operator::Gte => numeric(actual, expected).is_some_and(|(a, b)| a >= b),
        Operator::Lte => numeric(actual, expected).is_some_and(|(a, b)| a <= b),
        Operator::Contains => match actual {
            MetadataValue::Text(text) => expected
                .as_str()
                .is_some_and(|needle| text.contains(needle)),
            MetadataValue::List(items) => items
                .iter()
                .any(|item| same_value(item, expected) == Some(true)),
            _ => false,
        },
    }
}

/// `None` when the two values are not comparable. Ints and floats compare
/// numerically.
fn same_value(a: &MetadataValue, b: &MetadataValue) -> Option<bool> {
    if let Some((a, b)) = numeric(a, b) {
        return Some(a == b);
    }
    match (a, b) {
        (MetadataValue::Text(a), MetadataValue::Text(b)) => Some(a == b),
        (MetadataValue::Bool(a), MetadataValue::Bool(b)) => Some(a == b),
        (MetadataValue::List(a), MetadataValue::List(b)) => Some(a == b),
        _ => None,
    }
}

fn numeric(a: &MetadataValue, b: &MetadataValue) -> Option<(f64, f64)> {
    Some((a.as_f64()?, b.as_f64()?))
}
