use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, instrument};

use super::models::LeaderboardScope;
use super::service::LeaderboardService;

/// Spawns the background task that keeps `scopes` and every other cached
/// ranking warm
pub fn spawn_refresh_task(
    service: Arc<LeaderboardService>,
    refresh_interval: Duration,
    scopes: Vec<LeaderboardScope>,
) -> JoinHandle<()> {
    tokio::spawn(start_refresh_task(service, refresh_interval, scopes))
}

#[instrument(skip(service, scopes))]
pub async fn start_refresh_task(
    service: Arc<LeaderboardService>,
    refresh_interval: Duration,
    scopes: Vec<LeaderboardScope>,
) {
    info!(
        refresh_interval_secs = refresh_interval.as_secs(),
        scopes = scopes.len(),
        "Starting leaderboard refresh background task"
    );

    let mut ticker = interval(refresh_interval);

    loop {
        ticker.tick().await;

        match service.refresh_all(&scopes).await {
            Ok(Some(refreshed)) => {
                debug!(refreshed, "Leaderboard refresh completed");
            }
            Ok(None) => {
                debug!("Leaderboard refresh skipped, another refresh is running");
            }
            Err(e) => {
                error!(error = %e, "Leaderboard refresh failed");
            }
        }
    }
}
