use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::models::{PointsCategory, PointsLedgerEntry};
use crate::{
    clock::Clock,
    event::Metadata,
    notification::{Notification, NotificationBus, NotificationKind},
    profile::UserProfile,
    progression::LevelCurve,
    shared::AppError,
    storage::Storage,
};

/// Books point movements and keeps the profile's cached total and level in step.
///
/// None of these methods lock. Callers hold the user's lock from
/// `UserLocks` for the whole read-modify-write.
pub struct PointsLedger {
    storage: Arc<dyn Storage>,
    curve: LevelCurve,
    points_floor: u64,
    clock: Arc<dyn Clock>,
    notifications: NotificationBus,
}

impl PointsLedger {
    pub fn new(
        storage: Arc<dyn Storage>,
        curve: LevelCurve,
        points_floor: u64,
        clock: Arc<dyn Clock>,
        notifications: NotificationBus,
    ) -> Self {
        Self {
            storage,
            curve,
            points_floor,
            clock,
            notifications,
        }
    }

    pub fn curve(&self) -> &LevelCurve {
        &self.curve
    }

    /// Loads a profile, creating a level 1 profile on first contact. A new
    /// profile is not persisted until the caller writes it.
    pub async fn profile_or_new(&self, user_id: &str) -> Result<UserProfile, AppError> {
        match self.storage.get_profile(user_id).await? {
            Some(profile) => Ok(profile),
            None => {
                debug!(user_id = %user_id, "Creating profile");
                Ok(UserProfile::new(user_id, &self.curve, self.clock.now()))
            }
        }
    }

    /// Like `profile_or_new`, but a created profile is written immediately
    pub async fn ensure_profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        if let Some(profile) = self.storage.get_profile(user_id).await? {
            return Ok(profile);
        }
        let profile = UserProfile::new(user_id, &self.curve, self.clock.now());
        self.storage.put_profile(&profile).await?;
        info!(user_id = %user_id, "Profile created");
        Ok(profile)
    }

    #[instrument(skip(self, reason, metadata), fields(user_id = %user_id))]
    pub async fn award(
        &self,
        user_id: &str,
        delta: i64,
        reason: &str,
        category: PointsCategory,
        metadata: Metadata,
    ) -> Result<PointsLedgerEntry, AppError> {
        validate_award(delta, reason, category)?;

        let now = self.clock.now();
        let mut profile = self.profile_or_new(user_id).await?;
        let previous_total = profile.total_points;
        let previous_level = profile.current_level;

        let new_total = self.next_total(previous_total, delta);
        let applied = i64::try_from(i128::from(new_total) - i128::from(previous_total))
            .map_err(|_| AppError::Internal)?;

        profile.total_points = new_total;
        let progress = profile.apply_level(&self.curve);
        profile.updated_at = now;

        let entry = PointsLedgerEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            delta: applied,
            requested_delta: delta,
            reason: reason.to_string(),
            category,
            metadata,
            created_at: now,
        };

        self.storage.book_entry(&entry, &profile).await?;

        info!(
            user_id = %user_id,
            delta = applied,
            requested_delta = delta,
            category = %category,
            total_points = new_total,
            "Points booked"
        );

        if progress.level > previous_level {
            info!(
                user_id = %user_id,
                previous_level,
                new_level = progress.level,
                "Level up"
            );
            self.notifications.emit(Notification::new(
                user_id,
                NotificationKind::LevelUp {
                    previous_level,
                    new_level: progress.level,
                },
                now,
            ));
        }

        Ok(entry)
    }

    /// A user's entries in append order
    pub async fn entries(&self, user_id: &str) -> Result<Vec<PointsLedgerEntry>, AppError> {
        self.storage.list_entries(user_id).await
    }

    /// Positive deltas saturate. Penalties stop at the floor, or at the current
    /// total if that is already below the floor.
    fn next_total(&self, total: u64, delta: i64) -> u64 {
        if delta >= 0 {
            total.saturating_add(delta.unsigned_abs())
        } else {
            let lowest = self.points_floor.min(total);
            total.saturating_sub(delta.unsigned_abs()).max(lowest)
        }
    }
}

fn validate_award(delta: i64, reason: &str, category: PointsCategory) -> Result<(), AppError> {
    if delta == 0 {
        return Err(AppError::InvalidInput(
            "points delta must not be zero".to_string(),
        ));
    }
    if reason.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "points award needs a reason".to_string(),
        ));
    }
    match (delta < 0, category == PointsCategory::Penalty) {
        (true, false) => Err(AppError::InvalidInput(format!(
            "negative delta {} requires the penalty category, got {}",
            delta, category
        ))),
        (false, true) => Err(AppError::InvalidInput(format!(
            "penalty delta must be negative, got {}",
            delta
        ))),
        _ => Ok(()),
    }
}
