use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use services::StatsError;
use signplay_core::model::GameResultError;
use thiserror::Error;
use tracing::error;

/// Request-level failures, rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("missing or invalid access token")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::Unauthorized => ApiError::Unauthorized,
            StatsError::UnknownUser => ApiError::NotFound("user not found".into()),
            StatsError::User(e) => ApiError::BadRequest(e.to_string()),
            StatsError::GameResult(e) => ApiError::BadRequest(e.to_string()),
            other => {
                error!(error = %other, "statistics request failed");
                ApiError::Internal
            }
        }
    }
}

impl From<GameResultError> for ApiError {
    fn from(err: GameResultError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
