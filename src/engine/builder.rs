use std::sync::Arc;

use tracing::info;

use super::facade::GamificationEngine;
use crate::{
    achievement::AchievementService,
    catalog::Catalog,
    clock::{Clock, SystemClock},
    config::EngineConfig,
    leaderboard::LeaderboardService,
    ledger::PointsLedger,
    notification::NotificationBus,
    reward::RewardService,
    shared::AppError,
    storage::{Storage, TimedStorage, UserLocks},
    trigger::{ActionExecutor, TriggerSystem},
};

pub struct GamificationEngineBuilder {
    storage: Arc<dyn Storage>,
    catalog: Option<Catalog>,
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    notifications: Option<NotificationBus>,
}

impl GamificationEngineBuilder {
    pub(super) fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            catalog: None,
            config: EngineConfig::default(),
            clock: None,
            notifications: None,
        }
    }

    /// Defaults to the built-in catalog
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to the system clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing bus instead of creating one sized from the config
    pub fn with_notifications(mut self, notifications: NotificationBus) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Validates the configuration and catalog, then wires the services.
    /// Every storage call is bounded by the configured timeout.
    pub fn build(self) -> Result<GamificationEngine, AppError> {
        let config = self.config;
        config.validate()?;

        let catalog = match self.catalog {
            Some(catalog) => {
                catalog.validate()?;
                catalog
            }
            None => Catalog::builtin()?,
        };
        let catalog = Arc::new(catalog);

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let notifications = self
            .notifications
            .unwrap_or_else(|| NotificationBus::new(config.notification_capacity));
        let storage: Arc<dyn Storage> =
            Arc::new(TimedStorage::new(self.storage, config.storage_timeout));
        let locks = Arc::new(UserLocks::new());

        let ledger = Arc::new(PointsLedger::new(
            storage.clone(),
            config.level_curve,
            config.points_floor,
            clock.clone(),
            notifications.clone(),
        ));
        let achievements = Arc::new(AchievementService::new(
            storage.clone(),
            catalog.clone(),
            ledger.clone(),
            clock.clone(),
            notifications.clone(),
        ));
        let rewards = Arc::new(RewardService::new(
            storage.clone(),
            catalog.clone(),
            ledger.clone(),
            clock.clone(),
            notifications.clone(),
        ));
        let executor = Arc::new(ActionExecutor::new(
            ledger.clone(),
            achievements.clone(),
            rewards.clone(),
            notifications.clone(),
            clock.clone(),
        ));
        let triggers = TriggerSystem::new(
            storage.clone(),
            catalog.clone(),
            executor,
            locks.clone(),
            clock.clone(),
        );
        let leaderboard = Arc::new(LeaderboardService::new(
            storage.clone(),
            clock.clone(),
            config.leaderboard_cache_ttl,
        ));

        info!(
            achievements = catalog.achievements.len(),
            rewards = catalog.rewards.len(),
            triggers = catalog.triggers.len(),
            "Gamification engine built"
        );

        Ok(GamificationEngine {
            storage,
            catalog,
            config,
            clock,
            locks,
            notifications,
            ledger,
            achievements,
            rewards,
            triggers,
            leaderboard,
        })
    }
}
