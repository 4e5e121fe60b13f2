//! Test assertion helpers - fluent API for verifying engine state
#![allow(dead_code)] // Test utilities may not all be used in every test

use gamification::profile::UserProfile;

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct ProfileAssertion {
    profile: UserProfile,
}

impl ProfileAssertion {
    /// Load the stored profile for `user_id`
    pub async fn for_user(setup: &TestSetup, user_id: &str) -> Self {
        let profile = setup
            .engine
            .get_profile(user_id)
            .await
            .unwrap_or_else(|e| panic!("{} should have a profile: {}", user_id, e));
        Self { profile }
    }

    pub fn has_points(self, expected: u64) -> Self {
        assert_eq!(
            self.profile.total_points, expected,
            "{} has wrong total points",
            self.profile.user_id
        );
        self
    }

    pub fn is_at_level(self, level: u32, progress_percent: u8) -> Self {
        assert_eq!(self.profile.current_level, level, "wrong level");
        assert_eq!(self.profile.level_progress, progress_percent, "wrong level progress");
        self
    }

    pub fn has_streak(self, current: u32, longest: u32) -> Self {
        assert_eq!(self.profile.current_streak, current, "wrong current streak");
        assert_eq!(self.profile.longest_streak, longest, "wrong longest streak");
        self
    }

    pub fn profile(self) -> UserProfile {
        self.profile
    }
}

/// Assert the cached total equals the clamped sum of the user's ledger
pub async fn assert_ledger_matches_total(setup: &TestSetup, user_id: &str) {
    let profile = setup.engine.get_profile(user_id).await.unwrap();
    let ledger = setup.engine.get_ledger(user_id).await.unwrap();
    let sum: i64 = ledger.iter().map(|entry| entry.delta).sum();

    assert!(sum >= 0, "applied deltas never take the total below zero");
    assert_eq!(
        sum as u64, profile.total_points,
        "ledger sum must equal the cached total for {}",
        user_id
    );
}
