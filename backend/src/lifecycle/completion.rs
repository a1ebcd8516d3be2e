use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LifecycleError;
use crate::models::{Pairing, PairingStatus};
use crate::notifications::{DeliveryReport, EventKind, Notifier, PairingEvent, dispatch};
use crate::store::{PairingStore, SubmissionBatch};
use crate::utils::DaySchedule;

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub pairing: Pairing,
    pub notifications: DeliveryReport,
}

/// Records one side's photo. When it completes the pairing, both
/// participants' consecutive failure streaks are reset in the same batch.
pub async fn submit_photo(
    store: &dyn PairingStore,
    notifier: &dyn Notifier,
    schedule: &DaySchedule,
    pairing_id: Uuid,
    participant_id: Uuid,
    now: DateTime<Utc>,
) -> Result<SubmissionOutcome, LifecycleError> {
    let mut pairing = store
        .get_pairing(pairing_id)
        .await?
        .ok_or(LifecycleError::PairingNotFound(pairing_id))?;

    let expected_status = pairing.status;
    let status = pairing.record_submission(participant_id, now)?;

    let reset_streaks = if status == PairingStatus::Completed {
        pairing.participants().to_vec()
    } else {
        Vec::new()
    };

    store
        .commit_submission(&SubmissionBatch {
            pairing: pairing.clone(),
            expected_status,
            reset_streaks,
        })
        .await?;

    info!("📸 Pairing {} submission from {} -> {}", pairing.id, participant_id, status);

    let notifications = if status == PairingStatus::Completed {
        notify_completed(store, notifier, schedule, &pairing, now).await
    } else {
        DeliveryReport::default()
    };

    Ok(SubmissionOutcome { pairing, notifications })
}

async fn notify_completed(
    store: &dyn PairingStore,
    notifier: &dyn Notifier,
    schedule: &DaySchedule,
    pairing: &Pairing,
    now: DateTime<Utc>,
) -> DeliveryReport {
    let participants = match store.participants_by_ids(&pairing.participants()).await {
        Ok(participants) => participants,
        Err(e) => {
            warn!("Could not load participants to notify completion of {}: {}", pairing.id, e);
            return DeliveryReport::default();
        }
    };

    let event = PairingEvent::new(
        EventKind::Completed,
        pairing.id,
        pairing.participants().to_vec(),
        json!({ "match_date": pairing.match_date }),
    );
    let recipients: Vec<_> = participants.iter().collect();
    dispatch(notifier, &event, &recipients, schedule.local_hour(now)).await
}
