use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::engine::GamificationEngine;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GamificationEngine>,
}

impl AppState {
    pub fn new(engine: Arc<GamificationEngine>) -> Self {
        Self { engine }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not eligible: {0}")]
    NotEligible(String),

    #[error("Already claimed: {0}")]
    AlreadyClaimed(String),

    #[error("Limit reached: {0}")]
    LimitReached(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotEligible(_) => StatusCode::FORBIDDEN,
            AppError::AlreadyClaimed(_) | AppError::LimitReached(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        let cases = vec![
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::NotEligible("x".into()), StatusCode::FORBIDDEN),
            (AppError::AlreadyClaimed("x".into()), StatusCode::CONFLICT),
            (AppError::LimitReached("x".into()), StatusCode::CONFLICT),
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::StorageUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
