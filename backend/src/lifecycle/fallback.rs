//! On-demand partner provisioning for participants left without an organic match.

use chrono::{DateTime, NaiveDate, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, RngCore};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::constants::*;
use crate::error::{ProvisionError, StoreError};
use crate::models::{Pairing, Participant};
use crate::notifications::{DeliveryReport, EventKind, Notifier, PairingEvent, dispatch};
use crate::store::{FallbackBatch, PairingStore};
use crate::utils::DaySchedule;

#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedPartner {
    pub partner_id: Uuid,
    pub created_placeholder: bool,
    pub pairing: Pairing,
    pub notifications: DeliveryReport,
}

/// Pairs `requester_id` with a waitlisted participant, or with a freshly
/// synthesized placeholder when nobody is waiting. Nothing is written unless
/// the whole pairing commits.
pub async fn provision_partner<R: RngCore + Send>(
    store: &dyn PairingStore,
    notifier: &dyn Notifier,
    schedule: &DaySchedule,
    requester_id: Uuid,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<ProvisionedPartner, ProvisionError> {
    let requester = store
        .get_participant(requester_id)
        .await?
        .ok_or(ProvisionError::UnknownParticipant(requester_id))?;

    let date = schedule.local_date(now);
    let (day_start, day_end) = schedule.day_bounds(date);
    let expires_at = schedule.expiry_for(date);

    if store.has_pairing_between(requester_id, day_start, day_end).await? {
        return Err(ProvisionError::AlreadyPaired(requester_id));
    }

    if let Some(partner) = store.find_waitlisted_partner(requester_id, day_start, day_end).await? {
        let mut pairing = Pairing::new(requester_id, partner.id, date, now, expires_at);
        pairing.meeting_ref = Some(meeting_ref(date, rng));

        store
            .commit_fallback(&FallbackBatch {
                pairing: pairing.clone(),
                placeholder: None,
                consumed_waitlist: Some(partner.id),
            })
            .await?;

        info!("🤝 Paired {} with waitlisted {}", requester.handle, partner.handle);
        let notifications = notify_created(notifier, schedule, &pairing, &[&requester, &partner], now).await;
        return Ok(ProvisionedPartner {
            partner_id: partner.id,
            created_placeholder: false,
            pairing,
            notifications,
        });
    }

    let mut sequence = store.count_placeholders().await? + 1;
    for attempt in 1..=MAX_PLACEHOLDER_ATTEMPTS {
        let placeholder = placeholder_participant(sequence, now);
        let mut pairing = Pairing::new(requester_id, placeholder.id, date, now, expires_at);
        pairing.meeting_ref = Some(meeting_ref(date, rng));

        let batch = FallbackBatch {
            pairing: pairing.clone(),
            placeholder: Some(placeholder.clone()),
            consumed_waitlist: None,
        };

        match store.commit_fallback(&batch).await {
            Ok(()) => {
                info!("🧸 Paired {} with new placeholder {}", requester.handle, placeholder.handle);
                let notifications = notify_created(notifier, schedule, &pairing, &[&requester], now).await;
                return Ok(ProvisionedPartner {
                    partner_id: placeholder.id,
                    created_placeholder: true,
                    pairing,
                    notifications,
                });
            }
            Err(StoreError::HandleTaken(handle)) => {
                warn!("Placeholder handle {} taken (attempt {}/{})", handle, attempt, MAX_PLACEHOLDER_ATTEMPTS);
                sequence += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ProvisionError::PlaceholderExhausted {
        attempts: MAX_PLACEHOLDER_ATTEMPTS,
    })
}

fn placeholder_participant(sequence: u32, now: DateTime<Utc>) -> Participant {
    let mut participant = Participant::new(placeholder_handle(sequence), PLACEHOLDER_DISPLAY_NAME, now);
    participant.is_placeholder = true;
    participant
}

/// `YYYYMMDD-xxxxxxxx`, unique enough to name a same-day meetup.
fn meeting_ref<R: RngCore>(date: NaiveDate, rng: &mut R) -> String {
    let suffix: String = rng
        .sample_iter(Alphanumeric)
        .take(MEETING_REF_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", date.format("%Y%m%d"), suffix)
}

async fn notify_created(
    notifier: &dyn Notifier,
    schedule: &DaySchedule,
    pairing: &Pairing,
    recipients: &[&Participant],
    now: DateTime<Utc>,
) -> DeliveryReport {
    let event = PairingEvent::new(
        EventKind::Created,
        pairing.id,
        pairing.participants().to_vec(),
        json!({
            "match_date": pairing.match_date,
            "expires_at": pairing.expires_at,
            "meeting_ref": pairing.meeting_ref,
        }),
    );
    dispatch(notifier, &event, recipients, schedule.local_hour(now)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn meeting_ref_carries_the_date() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap();
        let reference = meeting_ref(date, &mut StdRng::seed_from_u64(1));
        assert!(reference.starts_with("20260209-"));
        assert_eq!(reference.len(), "20260209-".len() + MEETING_REF_SUFFIX_LEN);
        assert!(reference["20260209-".len()..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn placeholder_defaults() {
        let placeholder = placeholder_participant(3, Utc::now());
        assert_eq!(placeholder.handle, "duo_buddy_3");
        assert!(placeholder.is_placeholder);
        assert!(placeholder.handle.starts_with(PLACEHOLDER_HANDLE_PREFIX));
        assert_eq!(placeholder.consecutive_failure_streak, 0);
        assert_eq!(placeholder.max_consecutive_failure_streak, 0);
        assert!(placeholder.notification_prefs.created && placeholder.notification_prefs.social);
    }
}
