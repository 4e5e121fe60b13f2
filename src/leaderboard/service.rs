use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use super::models::{Leaderboard, LeaderboardMetric, LeaderboardScope, Trend, UserRank};
use super::ranker::{percentile, rank_profiles};
use crate::{clock::Clock, shared::AppError, storage::Storage};

struct CachedBoard {
    board: Arc<Leaderboard>,
    /// Ranks from the computation before `board`
    previous_ranks: HashMap<String, u64>,
}

/// Serves rankings from a per-scope cache. Recomputation is single-flight:
/// concurrent callers that find a stale entry wait for one refresh instead of
/// all recomputing.
pub struct LeaderboardService {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    cache_ttl: Duration,
    cache: RwLock<HashMap<LeaderboardScope, CachedBoard>>,
    refresh_lock: Mutex<()>,
}

impl LeaderboardService {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, cache_ttl: Duration) -> Self {
        Self {
            storage,
            clock,
            cache_ttl,
            cache: RwLock::new(HashMap::new()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Top `limit` entries for the scope
    pub async fn leaderboard(
        &self,
        scope: LeaderboardScope,
        limit: usize,
    ) -> Result<Leaderboard, AppError> {
        let board = self.current(scope).await?;
        Ok(Leaderboard {
            scope: board.scope,
            entries: board.entries.iter().take(limit).cloned().collect(),
            total_users: board.total_users,
            computed_at: board.computed_at,
        })
    }

    pub async fn user_rank(
        &self,
        user_id: &str,
        scope: LeaderboardScope,
    ) -> Result<UserRank, AppError> {
        let board = self.current(scope).await?;
        let entry = board
            .entries
            .iter()
            .find(|entry| entry.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{}' is not ranked", user_id)))?;

        let previous = {
            let cache = self.cache.read().await;
            cache
                .get(&scope)
                .and_then(|cached| cached.previous_ranks.get(user_id).copied())
        };

        Ok(UserRank {
            user_id: user_id.to_string(),
            scope,
            rank: entry.rank,
            total_users: board.total_users,
            percentile: percentile(entry.rank, board.total_users),
            score: entry.score,
            trend: Trend::between(previous, entry.rank),
        })
    }

    /// Recomputes one scope now, waiting for any refresh in progress
    #[instrument(skip(self))]
    pub async fn refresh(&self, scope: LeaderboardScope) -> Result<Arc<Leaderboard>, AppError> {
        let _guard = self.refresh_lock.lock().await;
        self.recompute(scope).await
    }

    /// Recomputes `scopes` plus every cached scope. Returns `None` without
    /// doing anything when another refresh is running.
    pub async fn refresh_all(&self, scopes: &[LeaderboardScope]) -> Result<Option<usize>, AppError> {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            debug!("Leaderboard refresh already running, skipping");
            return Ok(None);
        };

        let mut targets: Vec<LeaderboardScope> = scopes.to_vec();
        for scope in self.cache.read().await.keys() {
            if !targets.contains(scope) {
                targets.push(*scope);
            }
        }

        for scope in &targets {
            self.recompute(*scope).await?;
        }
        Ok(Some(targets.len()))
    }

    /// Drops every cached ranking
    pub async fn invalidate(&self) {
        self.cache.write().await.clear();
    }

    async fn current(&self, scope: LeaderboardScope) -> Result<Arc<Leaderboard>, AppError> {
        if let Some(board) = self.fresh(scope).await {
            return Ok(board);
        }

        let _guard = self.refresh_lock.lock().await;
        // another caller may have refreshed while we waited
        if let Some(board) = self.fresh(scope).await {
            return Ok(board);
        }
        self.recompute(scope).await
    }

    async fn fresh(&self, scope: LeaderboardScope) -> Option<Arc<Leaderboard>> {
        let now = self.clock.now();
        let cache = self.cache.read().await;
        cache
            .get(&scope)
            .filter(|cached| !self.expired(cached.board.computed_at, now))
            .map(|cached| cached.board.clone())
    }

    fn expired(&self, computed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = (now - computed_at).to_std().unwrap_or_default();
        age >= self.cache_ttl
    }

    /// Caller holds `refresh_lock`
    async fn recompute(&self, scope: LeaderboardScope) -> Result<Arc<Leaderboard>, AppError> {
        let now = self.clock.now();
        let profiles = self.storage.list_profiles().await?;

        let window_points = match (scope.metric, scope.timeframe.window_start(now)) {
            (LeaderboardMetric::Points, Some(since)) => {
                let mut sums: HashMap<String, i64> = HashMap::new();
                for entry in self.storage.list_entries_since(since).await? {
                    let sum = sums.entry(entry.user_id).or_default();
                    *sum = sum.saturating_add(entry.delta);
                }
                Some(sums)
            }
            _ => None,
        };

        let entries = rank_profiles(&profiles, scope.metric, window_points.as_ref());
        let board = Arc::new(Leaderboard {
            scope,
            total_users: entries.len() as u64,
            entries,
            computed_at: now,
        });

        let mut cache = self.cache.write().await;
        let previous_ranks = cache
            .get(&scope)
            .map(|cached| {
                cached
                    .board
                    .entries
                    .iter()
                    .map(|entry| (entry.user_id.clone(), entry.rank))
                    .collect()
            })
            .unwrap_or_default();
        cache.insert(
            scope,
            CachedBoard {
                board: board.clone(),
                previous_ranks,
            },
        );

        info!(
            timeframe = %scope.timeframe,
            metric = %scope.metric,
            total_users = board.total_users,
            "Leaderboard computed"
        );
        Ok(board)
    }
}
