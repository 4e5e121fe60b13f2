use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::progression::LevelCurve;
use crate::shared::AppError;

/// Runtime settings for the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub level_curve: LevelCurve,
    /// Lowest total a penalty can push a user to
    pub points_floor: u64,
    pub storage_timeout: Duration,
    /// How long a computed leaderboard is served before it is recomputed
    pub leaderboard_cache_ttl: Duration,
    /// Period of the background leaderboard refresh task
    pub leaderboard_refresh_interval: Duration,
    pub notification_capacity: usize,
    /// Catalog file to load instead of the built-in catalog
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            level_curve: LevelCurve::default(),
            points_floor: 0,
            storage_timeout: Duration::from_secs(2),
            leaderboard_cache_ttl: Duration::from_secs(30),
            leaderboard_refresh_interval: Duration::from_secs(60),
            notification_capacity: 256,
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    /// Reads `GAMIFY_*` environment variables, falling back to defaults for
    /// anything missing or unparsable
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            lookup(key).and_then(|value| value.trim().parse().ok())
        }

        let defaults = Self::default();
        let level_curve = LevelCurve {
            base_points: parsed(&lookup, "GAMIFY_LEVEL_BASE_POINTS")
                .unwrap_or(defaults.level_curve.base_points),
            growth_factor: parsed(&lookup, "GAMIFY_LEVEL_GROWTH_FACTOR")
                .unwrap_or(defaults.level_curve.growth_factor),
            max_level: parsed(&lookup, "GAMIFY_MAX_LEVEL").unwrap_or(defaults.level_curve.max_level),
        };

        Self {
            level_curve,
            points_floor: parsed(&lookup, "GAMIFY_POINTS_FLOOR").unwrap_or(defaults.points_floor),
            storage_timeout: parsed(&lookup, "GAMIFY_STORAGE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.storage_timeout),
            leaderboard_cache_ttl: parsed(&lookup, "GAMIFY_LEADERBOARD_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.leaderboard_cache_ttl),
            leaderboard_refresh_interval: parsed(&lookup, "GAMIFY_LEADERBOARD_REFRESH_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.leaderboard_refresh_interval),
            notification_capacity: parsed(&lookup, "GAMIFY_NOTIFICATION_CAPACITY")
                .unwrap_or(defaults.notification_capacity),
            catalog_path: lookup("GAMIFY_CATALOG_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.level_curve.validate()?;
        if self.storage_timeout.is_zero() {
            return Err(AppError::InvalidInput(
                "storage timeout must be positive".to_string(),
            ));
        }
        if self.leaderboard_refresh_interval.is_zero() {
            return Err(AppError::InvalidInput(
                "leaderboard refresh interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
