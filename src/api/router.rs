use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::shared::AppState;

/// All routes, without middleware layers
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/leaderboard", get(handlers::get_leaderboard))
        .route("/users/:user_id/events", post(handlers::track_event))
        .route("/users/:user_id/events/recent", get(handlers::get_recent_events))
        .route("/users/:user_id/points", post(handlers::award_points))
        .route("/users/:user_id/profile", get(handlers::get_profile))
        .route("/users/:user_id/achievements", get(handlers::get_achievements))
        .route("/users/:user_id/rewards", get(handlers::get_available_rewards))
        .route(
            "/users/:user_id/rewards/:reward_id/claim",
            post(handlers::claim_reward),
        )
        .route(
            "/users/:user_id/rewards/:reward_id/use",
            post(handlers::use_reward),
        )
        .route("/users/:user_id/claims", get(handlers::get_claims))
        .route("/users/:user_id/ledger", get(handlers::get_ledger))
        .route("/users/:user_id/rank", get(handlers::get_user_rank))
        .with_state(state)
}
