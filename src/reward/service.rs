use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::models::{ClaimRewardResult, ClaimStatus, RewardDefinition, RewardType, UserRewardClaim};
use crate::{
    catalog::Catalog,
    clock::Clock,
    event::{Metadata, MetadataValue},
    ledger::{PointsCategory, PointsLedger},
    notification::{Notification, NotificationBus, NotificationKind},
    profile::UserProfile,
    shared::AppError,
    storage::Storage,
};

/// Gatekeeper for the reward catalog and the user's claims
pub struct RewardService {
    storage: Arc<dyn Storage>,
    catalog: Arc<Catalog>,
    ledger: Arc<PointsLedger>,
    clock: Arc<dyn Clock>,
    notifications: NotificationBus,
}

impl RewardService {
    pub fn new(
        storage: Arc<dyn Storage>,
        catalog: Arc<Catalog>,
        ledger: Arc<PointsLedger>,
        clock: Arc<dyn Clock>,
        notifications: NotificationBus,
    ) -> Self {
        Self {
            storage,
            catalog,
            ledger,
            clock,
            notifications,
        }
    }

    /// Rewards the user could claim right now. `total_claims` on each returned
    /// definition reflects the live counter.
    pub async fn list_available(&self, user_id: &str) -> Result<Vec<RewardDefinition>, AppError> {
        let now = self.clock.now();
        let profile = self.ledger.profile_or_new(user_id).await?;
        let completed = self.completed_achievements(user_id).await?;
        let claimed: HashSet<String> = self
            .storage
            .list_claims(user_id)
            .await?
            .into_iter()
            .filter(|claim| matches!(claim.status, ClaimStatus::Claimed | ClaimStatus::Used))
            .map(|claim| claim.reward_id)
            .collect();

        let mut available = Vec::new();
        for reward in &self.catalog.rewards {
            if claimed.contains(&reward.id)
                || check_gates(reward, &profile, &completed, now).is_err()
            {
                continue;
            }

            let total_claims = self.total_claims(reward).await?;
            if reward
                .supply_cap()
                .is_some_and(|max_claims| total_claims >= max_claims)
            {
                continue;
            }

            available.push(RewardDefinition {
                total_claims,
                ..reward.clone()
            });
        }

        Ok(available)
    }

    /// Claims a reward after re-checking every gate. The claim record and the
    /// supply counter are written in one atomic storage call. A rejected claim
    /// writes nothing.
    ///
    /// Points-type rewards are credited after the claim commits. If that
    /// credit fails the claim stands and the failure is logged at `error`.
    #[instrument(skip(self))]
    pub async fn claim(&self, user_id: &str, reward_id: &str) -> Result<UserRewardClaim, AppError> {
        let reward = self
            .catalog
            .reward(reward_id)
            .ok_or_else(|| AppError::NotFound(format!("reward '{}'", reward_id)))?;

        if let Some(existing) = self.storage.get_claim(user_id, reward_id).await? {
            if matches!(existing.status, ClaimStatus::Claimed | ClaimStatus::Used) {
                return Err(AppError::AlreadyClaimed(format!(
                    "reward '{}' was claimed at {}",
                    reward_id, existing.claimed_at
                )));
            }
        }

        let now = self.clock.now();
        let profile = self.ledger.profile_or_new(user_id).await?;
        let completed = self.completed_achievements(user_id).await?;
        check_gates(reward, &profile, &completed, now).map_err(AppError::NotEligible)?;

        let claim = UserRewardClaim {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            reward_id: reward_id.to_string(),
            status: ClaimStatus::Claimed,
            claimed_at: now,
            used_at: None,
        };

        let claim = match self
            .storage
            .try_claim(&claim, reward.total_claims, reward.supply_cap())
            .await?
        {
            ClaimRewardResult::Claimed(claim) => claim,
            ClaimRewardResult::AlreadyClaimed(existing) => {
                return Err(AppError::AlreadyClaimed(format!(
                    "reward '{}' was claimed at {}",
                    reward_id, existing.claimed_at
                )));
            }
            ClaimRewardResult::LimitReached { total_claims } => {
                warn!(user_id = %user_id, reward_id, total_claims, "Reward supply exhausted");
                return Err(AppError::LimitReached(format!(
                    "reward '{}' has been claimed {} times",
                    reward_id, total_claims
                )));
            }
        };

        if reward.reward_type == RewardType::Points {
            let points = reward.value.floor() as i64;
            if points > 0 {
                let metadata = Metadata::from([(
                    "reward_id".to_string(),
                    MetadataValue::from(reward_id),
                )]);
                if let Err(e) = self
                    .ledger
                    .award(
                        user_id,
                        points,
                        &format!("Reward claimed: {}", reward.name),
                        PointsCategory::Reward,
                        metadata,
                    )
                    .await
                {
                    error!(
                        user_id = %user_id,
                        reward_id,
                        claim_id = %claim.id,
                        points,
                        error = %e,
                        "Reward points not credited"
                    );
                }
            }
        }

        info!(user_id = %user_id, reward_id, claim_id = %claim.id, "Reward claimed");
        self.notifications.emit(Notification::new(
            user_id,
            NotificationKind::RewardClaimed {
                reward_id: reward.id.clone(),
                name: reward.name.clone(),
            },
            now,
        ));

        Ok(claim)
    }

    /// Moves a claimed reward to `used`
    #[instrument(skip(self))]
    pub async fn use_reward(
        &self,
        user_id: &str,
        reward_id: &str,
    ) -> Result<UserRewardClaim, AppError> {
        let mut claim = self
            .storage
            .get_claim(user_id, reward_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no claim for reward '{}'", reward_id)))?;

        let now = self.clock.now();
        let status = self.effective_status(&claim, now);
        if status != ClaimStatus::Claimed {
            return Err(AppError::NotEligible(format!(
                "claim for reward '{}' is {}",
                reward_id, status
            )));
        }

        claim.status = ClaimStatus::Used;
        claim.used_at = Some(now);
        self.storage.put_claim(&claim).await?;
        info!(user_id = %user_id, reward_id, "Reward used");
        Ok(claim)
    }

    /// The user's claims, with lapsed rewards reported as `expired`
    pub async fn claims(&self, user_id: &str) -> Result<Vec<UserRewardClaim>, AppError> {
        let now = self.clock.now();
        let claims = self.storage.list_claims(user_id).await?;
        Ok(claims
            .into_iter()
            .map(|mut claim| {
                claim.status = self.effective_status(&claim, now);
                claim
            })
            .collect())
    }

    fn effective_status(&self, claim: &UserRewardClaim, now: DateTime<Utc>) -> ClaimStatus {
        let expired = self
            .catalog
            .reward(&claim.reward_id)
            .is_some_and(|reward| reward.is_expired(now));
        match claim.status {
            ClaimStatus::Claimed if expired => ClaimStatus::Expired,
            status => status,
        }
    }

    async fn total_claims(&self, reward: &RewardDefinition) -> Result<u64, AppError> {
        Ok(self
            .storage
            .claim_count(&reward.id)
            .await?
            .unwrap_or(reward.total_claims))
    }

    async fn completed_achievements(&self, user_id: &str) -> Result<HashSet<String>, AppError> {
        Ok(self
            .storage
            .list_progress(user_id)
            .await?
            .into_iter()
            .filter(|progress| progress.completed)
            .map(|progress| progress.achievement_id)
            .collect())
    }
}

/// Everything but supply and prior claims. Returns the first unmet gate.
fn check_gates(
    reward: &RewardDefinition,
    profile: &UserProfile,
    completed: &HashSet<String>,
    now: DateTime<Utc>,
) -> Result<(), String> {
    if !reward.is_active {
        return Err(format!("reward '{}' is not active", reward.id));
    }
    if reward.is_expired(now) {
        return Err(format!("reward '{}' has expired", reward.id));
    }
    if profile.current_level < reward.required_level {
        return Err(format!(
            "reward '{}' requires level {}, user is level {}",
            reward.id, reward.required_level, profile.current_level
        ));
    }
    if profile.total_points < reward.required_points {
        return Err(format!(
            "reward '{}' requires {} points, user has {}",
            reward.id, reward.required_points, profile.total_points
        ));
    }
    if let Some(missing) = reward
        .required_achievements
        .iter()
        .find(|achievement_id| !completed.contains(*achievement_id))
    {
        return Err(format!(
            "reward '{}' requires achievement '{}'",
            reward.id, missing
        ));
    }
    Ok(())
}
