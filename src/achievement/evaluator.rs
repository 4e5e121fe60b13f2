use super::models::{AchievementDefinition, AchievementEvaluation, Requirement, RequirementValue};
use crate::profile::UserProfile;

/// Evaluates an achievement against a profile snapshot.
///
/// Eligible once every requirement is met. Progress is the least advanced
/// requirement's share of its target, floored, so a half-done achievement
/// never reports more than its weakest requirement.
pub fn evaluate(profile: &UserProfile, achievement: &AchievementDefinition) -> AchievementEvaluation {
    let requirement_values: Vec<RequirementValue> = achievement
        .requirements
        .iter()
        .map(|requirement| requirement_value(profile, requirement))
        .collect();

    let eligible = requirement_values.iter().all(|value| value.satisfied);
    let progress_percent = requirement_values
        .iter()
        .map(percent_of)
        .min()
        .unwrap_or(100);

    AchievementEvaluation {
        eligible,
        progress_percent,
        requirement_values,
    }
}

fn requirement_value(profile: &UserProfile, requirement: &Requirement) -> RequirementValue {
    let current = requirement.requirement_type.current_value(profile);
    RequirementValue {
        requirement_type: requirement.requirement_type,
        current,
        target: requirement.target,
        satisfied: requirement.target <= 0.0 || current >= requirement.target,
    }
}

fn percent_of(value: &RequirementValue) -> u8 {
    if value.satisfied {
        return 100;
    }
    let percent = (value.current.max(0.0) * 100.0 / value.target).floor();
    // unsatisfied never rounds up to done
    percent.clamp(0.0, 99.0) as u8
}
