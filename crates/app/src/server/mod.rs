//! HTTP surface for saving results and reading statistics.

mod auth;
mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use services::{AppServices, StatisticsService, UserService};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<StatisticsService>,
    pub users: Arc<UserService>,
}

impl From<&AppServices> for AppState {
    fn from(services: &AppServices) -> Self {
        Self {
            stats: services.stats(),
            users: services.users(),
        }
    }
}

/// Browser access policy for the game routes.
///
/// `*` (or an empty list) admits any origin. Otherwise only the listed
/// origins are echoed back; entries that are not valid header values are
/// skipped with a warning.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(allow_origin)
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/game/save-result", post(handlers::save_result))
        .route("/api/game/stats", get(handlers::stats))
        .route("/api/game/history", get(handlers::history))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests;
