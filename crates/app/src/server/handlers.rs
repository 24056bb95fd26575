use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::{Value, json};
use services::stats::{GameRecordView, SaveResultPayload, SaveResultResponse, StatsResponse};

use super::AppState;
use super::auth::Authenticated;
use super::error::ApiError;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "Backend running" }))
}

pub async fn save_result(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    payload: Result<Json<SaveResultPayload>, JsonRejection>,
) -> Result<Json<SaveResultResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let submission = payload.into_submission()?;
    let saved = state.stats.save_result(&identity, &submission).await?;
    Ok(Json(SaveResultResponse::from(&saved)))
}

pub async fn stats(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<Json<StatsResponse>, ApiError> {
    let overview = state.stats.overview(identity.user_id).await?;
    Ok(Json(StatsResponse::from(&overview)))
}

pub async fn history(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<Json<Vec<GameRecordView>>, ApiError> {
    let results = state.stats.history(identity.user_id).await?;
    Ok(Json(results.iter().map(GameRecordView::from).collect()))
}
