use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiResult, AppState, api_error};
use crate::error::ProvisionError;
use crate::lifecycle::{ProvisionedPartner, provision_partner};

#[derive(Debug, Deserialize)]
pub struct FallbackRequest {
    pub participant_id: Uuid,
}

pub async fn request_fallback_partner(
    State(state): State<AppState>,
    Json(req): Json<FallbackRequest>,
) -> ApiResult<ProvisionedPartner> {
    let mut rng = StdRng::from_os_rng();

    let provisioned = provision_partner(
        state.store.as_ref(),
        state.notifier.as_ref(),
        &state.schedule,
        req.participant_id,
        Utc::now(),
        &mut rng,
    )
    .await
    .map_err(|e| {
        let status = match &e {
            ProvisionError::UnknownParticipant(_) => StatusCode::NOT_FOUND,
            ProvisionError::AlreadyPaired(_) => StatusCode::CONFLICT,
            ProvisionError::PlaceholderExhausted { .. } | ProvisionError::Store(_) => {
                tracing::error!("❌ Fallback provisioning for {} failed: {}", req.participant_id, e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        api_error(status, e.to_string())
    })?;

    Ok(Json(provisioned))
}
