use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use super::types::{AwardPointsRequest, HealthResponse, LeaderboardQuery, TrackEventRequest};
use crate::{
    achievement::AchievementStatus,
    engine::TrackedEvent,
    event::{ActivityEvent, EventType},
    leaderboard::{Leaderboard, UserRank},
    ledger::PointsLedgerEntry,
    profile::UserProfile,
    reward::{RewardDefinition, UserRewardClaim},
    shared::{AppError, AppState},
};

const RECENT_EVENTS_LIMIT: usize = 50;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /users/:user_id/events
#[instrument(name = "track_event", skip(state, request))]
pub async fn track_event(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<TrackEventRequest>,
) -> Result<(StatusCode, Json<TrackedEvent>), AppError> {
    let event_type = EventType::parse(&request.event_type)?;
    let tracked = state
        .engine
        .track_event(&user_id, event_type, request.metadata)
        .await?;
    Ok((StatusCode::CREATED, Json(tracked)))
}

/// POST /users/:user_id/points
#[instrument(name = "award_points", skip(state, request))]
pub async fn award_points(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<AwardPointsRequest>,
) -> Result<(StatusCode, Json<PointsLedgerEntry>), AppError> {
    info!(delta = request.delta, category = %request.category, "Manual point award");
    let entry = state
        .engine
        .award_points(
            &user_id,
            request.delta,
            &request.reason,
            request.category,
            request.metadata,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.engine.get_profile(&user_id).await?))
}

pub async fn get_achievements(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AchievementStatus>>, AppError> {
    Ok(Json(state.engine.get_achievements(&user_id).await?))
}

pub async fn get_available_rewards(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<RewardDefinition>>, AppError> {
    Ok(Json(state.engine.get_available_rewards(&user_id).await?))
}

pub async fn get_claims(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UserRewardClaim>>, AppError> {
    Ok(Json(state.engine.get_claims(&user_id).await?))
}

/// POST /users/:user_id/rewards/:reward_id/claim
#[instrument(name = "claim_reward", skip(state))]
pub async fn claim_reward(
    State(state): State<AppState>,
    Path((user_id, reward_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<UserRewardClaim>), AppError> {
    let claim = state.engine.claim_reward(&user_id, &reward_id).await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

/// POST /users/:user_id/rewards/:reward_id/use
#[instrument(name = "use_reward", skip(state))]
pub async fn use_reward(
    State(state): State<AppState>,
    Path((user_id, reward_id)): Path<(String, String)>,
) -> Result<Json<UserRewardClaim>, AppError> {
    Ok(Json(state.engine.use_reward(&user_id, &reward_id).await?))
}

pub async fn get_ledger(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PointsLedgerEntry>>, AppError> {
    Ok(Json(state.engine.get_ledger(&user_id).await?))
}

pub async fn get_recent_events(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ActivityEvent>>, AppError> {
    Ok(Json(
        state
            .engine
            .get_recent_events(&user_id, RECENT_EVENTS_LIMIT)
            .await?,
    ))
}

/// GET /users/:user_id/rank?timeframe=weekly&metric=points
pub async fn get_user_rank(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<UserRank>, AppError> {
    Ok(Json(
        state.engine.get_user_rank(&user_id, query.scope()).await?,
    ))
}

/// GET /leaderboard?timeframe=all_time&metric=invested&limit=10
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Leaderboard>, AppError> {
    Ok(Json(
        state
            .engine
            .get_leaderboard(query.scope(), query.limit())
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::catalog::Catalog;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, Response},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt; // for `oneshot`

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_track_event_then_read_profile() {
        let app = router(AppStateBuilder::new().build());

        let response = app
            .clone()
            .oneshot(post(
                "/users/alice/events",
                json!({"event_type": "project_application_submitted"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let tracked = json_body(response).await;
        assert_eq!(tracked["event"]["points_awarded"], 50);
        assert_eq!(tracked["newly_unlocked"], json!(["first_application"]));

        let response = app.oneshot(get("/users/alice/profile")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let profile = json_body(response).await;
        assert_eq!(profile["total_points"], 75);
        assert_eq!(profile["projects_applied"], 1);
    }

    #[tokio::test]
    async fn test_unknown_event_type_is_bad_request() {
        let app = router(AppStateBuilder::new().build());

        let response = app
            .oneshot(post("/users/alice/events", json!({"event_type": "teleported"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("teleported"));
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_found() {
        let app = router(AppStateBuilder::new().build());

        let response = app.oneshot(get("/users/nobody/profile")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_claim_twice_conflicts() {
        let catalog = Catalog::from_json(
            r#"{"rewards": [{
                "id": "welcome_pack",
                "name": "Welcome Pack",
                "type": "badge",
                "value": 1.0,
                "rarity": "common"
            }]}"#,
        )
        .unwrap();
        let app = router(AppStateBuilder::new().with_catalog(catalog).build());

        let response = app
            .clone()
            .oneshot(post("/users/alice/rewards/welcome_pack/claim", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(post("/users/alice/rewards/welcome_pack/claim", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(post("/users/alice/rewards/welcome_pack/use", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "used");

        let response = app.oneshot(get("/users/alice/claims")).await.unwrap();
        let claims = json_body(response).await;
        assert_eq!(claims.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_penalty_through_points_endpoint() {
        let app = router(AppStateBuilder::new().build());

        app.clone()
            .oneshot(post(
                "/users/alice/points",
                json!({"delta": 30, "reason": "meetup host", "category": "bonus"}),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(post(
                "/users/alice/points",
                json!({"delta": -100, "reason": "spam", "category": "penalty"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let entry = json_body(response).await;
        assert_eq!(entry["delta"], -30);
        assert_eq!(entry["requested_delta"], -100);

        let response = app.oneshot(get("/users/alice/ledger")).await.unwrap();
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_leaderboard_and_rank() {
        let app = router(AppStateBuilder::new().build());

        for (user, delta) in [("alice", 300), ("bob", 150)] {
            app.clone()
                .oneshot(post(
                    &format!("/users/{}/points", user),
                    json!({"delta": delta, "reason": "seed"}),
                ))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(get("/leaderboard?metric=points&limit=10"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let board = json_body(response).await;
        assert_eq!(board["total_users"], 2);
        assert_eq!(board["entries"][0]["user_id"], "alice");
        assert_eq!(board["entries"][1]["rank"], 2);

        let response = app
            .oneshot(get("/users/bob/rank?timeframe=all_time"))
            .await
            .unwrap();
        let rank = json_body(response).await;
        assert_eq!(rank["rank"], 2);
        assert_eq!(rank["percentile"], 50.0);
    }
}
