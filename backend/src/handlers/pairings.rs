use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiResult, AppState, api_error};
use crate::error::{LifecycleError, StoreError};
use crate::lifecycle::{SubmissionOutcome, submit_photo};

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub participant_id: Uuid,
}

pub async fn submit_pairing_photo(
    State(state): State<AppState>,
    Path(pairing_id): Path<Uuid>,
    Json(req): Json<SubmissionRequest>,
) -> ApiResult<SubmissionOutcome> {
    let outcome = submit_photo(
        state.store.as_ref(),
        state.notifier.as_ref(),
        &state.schedule,
        pairing_id,
        req.participant_id,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        let status = match &e {
            LifecycleError::PairingNotFound(_) => StatusCode::NOT_FOUND,
            LifecycleError::NotAParticipant { .. } => StatusCode::FORBIDDEN,
            LifecycleError::AlreadySubmitted { .. }
            | LifecycleError::PairingClosed { .. }
            | LifecycleError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            LifecycleError::PairingExpired { .. } => StatusCode::GONE,
            LifecycleError::Store(_) => {
                tracing::error!("❌ Submission for pairing {} failed: {}", pairing_id, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        api_error(status, e.to_string())
    })?;

    Ok(Json(outcome))
}
