pub mod fallback;
pub mod pairings;

pub use fallback::request_fallback_partner;
pub use pairings::submit_pairing_photo;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::notifications::Notifier;
use crate::store::PairingStore;
use crate::utils::DaySchedule;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PairingStore>,
    pub notifier: Arc<dyn Notifier>,
    pub schedule: DaySchedule,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { error: message.into() }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/pairings/{id}/submissions", post(submit_pairing_photo))
        .route("/api/fallback", post(request_fallback_partner))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
