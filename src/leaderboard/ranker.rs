use std::collections::HashMap;

use super::models::{LeaderboardEntry, LeaderboardMetric};
use crate::profile::UserProfile;
use crate::progression::clamp_points;

/// Ranks profiles by `metric`, highest first. Ties go to the earlier joiner,
/// then to the lower user id. Ranks are 1-based and contiguous.
///
/// `window_points` replaces lifetime totals for the points metric when a
/// timeframe is in effect; users without entries in the window score zero.
pub fn rank_profiles(
    profiles: &[UserProfile],
    metric: LeaderboardMetric,
    window_points: Option<&HashMap<String, i64>>,
) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(f64, &UserProfile)> = profiles
        .iter()
        .map(|profile| (score(profile, metric, window_points), profile))
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (score, profile))| LeaderboardEntry {
            rank: index as u64 + 1,
            user_id: profile.user_id.clone(),
            display_name: profile.display_name.clone(),
            wallet_address: profile.wallet_address.clone(),
            score,
            total_points: profile.total_points,
            level: profile.current_level,
            projects_applied: profile.projects_applied,
            projects_approved: profile.projects_approved,
            total_invested: profile.total_invested,
            referrals_count: profile.referrals_count,
            community_contributions: profile.community_contributions,
            current_streak: profile.current_streak,
            joined_at: profile.created_at,
        })
        .collect()
}

fn score(
    profile: &UserProfile,
    metric: LeaderboardMetric,
    window_points: Option<&HashMap<String, i64>>,
) -> f64 {
    match metric {
        LeaderboardMetric::Points => match window_points {
            Some(window) => {
                clamp_points(window.get(&profile.user_id).copied().unwrap_or_default()) as f64
            }
            None => profile.total_points as f64,
        },
        LeaderboardMetric::Invested => profile.total_invested,
        LeaderboardMetric::Referrals => profile.referrals_count as f64,
        LeaderboardMetric::Contributions => profile.community_contributions as f64,
        LeaderboardMetric::Streak => f64::from(profile.current_streak),
    }
}

/// `(total - rank + 1) / total * 100`
pub fn percentile(rank: u64, total: u64) -> f64 {
    if total == 0 || rank == 0 || rank > total {
        return 0.0;
    }
    (total - rank + 1) as f64 / total as f64 * 100.0
}
