//! Scheduled job bodies. Each job reads, computes, then commits one batch; a
//! failure before or during the commit leaves the store untouched.

use chrono::{DateTime, NaiveDate, Utc};
use rand::RngCore;
use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::info;
use uuid::Uuid;

use super::{build_match_batch, plan_sweep, reminder_targets};
use crate::error::RunError;
use crate::matching::{MatchKind, MatchSettings, filter_eligible, match_participants};
use crate::models::{PairingStatus, Participant};
use crate::notifications::{DeliveryReport, EventKind, Notifier, PairingEvent, dispatch};
use crate::store::PairingStore;
use crate::utils::DaySchedule;

#[derive(Debug, Clone, Serialize)]
pub struct MatchRunReport {
    pub match_date: NaiveDate,
    pub eligible: usize,
    /// Eligible participants skipped because they already have a pairing today.
    pub already_paired: usize,
    pub history_pairs: usize,
    pub pairs: usize,
    pub friend_pairs: usize,
    pub waitlisted: usize,
    pub notifications: DeliveryReport,
}

pub async fn run_daily_match<R: RngCore + Send>(
    store: &dyn PairingStore,
    notifier: &dyn Notifier,
    schedule: &DaySchedule,
    settings: &MatchSettings,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<MatchRunReport, RunError> {
    let criteria = settings.criteria(now);
    let eligible = store
        .eligible_participants(&criteria)
        .await
        .map_err(RunError::Eligibility)?;
    let eligible = filter_eligible(eligible, &criteria);

    // Anyone already holding a pairing for today (e.g. from a fallback) sits this run out.
    let match_date = schedule.local_date(now);
    let (day_start, day_end) = schedule.day_bounds(match_date);
    let paired_today: HashSet<Uuid> = store
        .pairings_created_between(day_start, day_end)
        .await
        .map_err(RunError::Pairings)?
        .iter()
        .flat_map(|p| p.participants())
        .collect();
    let (already_paired, eligible): (Vec<Participant>, Vec<Participant>) = eligible
        .into_iter()
        .partition(|p| paired_today.contains(&p.id));

    let history: Vec<(Uuid, Uuid)> = store
        .pair_history(settings.history_since(now))
        .await
        .map_err(RunError::History)?
        .into_iter()
        .map(|record| (record.participant_a, record.participant_b))
        .collect();

    info!(
        "🎲 Matching {} eligible participants against {} history rows ({} already paired today)",
        eligible.len(),
        history.len(),
        already_paired.len()
    );

    let outcome = match_participants(&eligible, &history, rng);
    let batch = build_match_batch(&outcome, schedule, now);

    if !batch.is_empty() {
        store.commit_match_run(&batch).await.map_err(RunError::Commit)?;
    }

    let friend_pairs = outcome.pairs.iter().filter(|p| p.kind == MatchKind::Friend).count();
    info!(
        "✅ Committed {} pairings ({} friend) and waitlisted {}",
        batch.pairings.len(),
        friend_pairs,
        batch.waitlisted.len()
    );

    let local_hour = schedule.local_hour(now);
    let mut notifications = DeliveryReport::default();
    for (pairing, pair) in batch.pairings.iter().zip(&outcome.pairs) {
        let event = PairingEvent::new(
            EventKind::Created,
            pairing.id,
            pairing.participants().to_vec(),
            json!({
                "match_date": pairing.match_date,
                "expires_at": pairing.expires_at,
                "kind": pair.kind,
            }),
        );
        notifications += dispatch(notifier, &event, &[&pair.first, &pair.second], local_hour).await;
    }

    Ok(MatchRunReport {
        match_date,
        eligible: eligible.len(),
        already_paired: already_paired.len(),
        history_pairs: history.len(),
        pairs: batch.pairings.len(),
        friend_pairs,
        waitlisted: batch.waitlisted.len(),
        notifications,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub date: NaiveDate,
    pub scanned: usize,
    pub flaked: usize,
    pub participants_updated: usize,
    pub already_flaked: usize,
    pub not_yet_expired: usize,
}

/// Flakes every expired, uncompleted pairing created on `date`.
pub async fn run_flake_sweep(
    store: &dyn PairingStore,
    schedule: &DaySchedule,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<SweepReport, RunError> {
    let (start, end) = schedule.day_bounds(date);
    let pairings: Vec<_> = store
        .pairings_created_between(start, end)
        .await
        .map_err(RunError::Pairings)?
        .into_iter()
        .filter(|p| p.status != PairingStatus::Completed)
        .collect();

    let mut flaker_ids: Vec<Uuid> = pairings
        .iter()
        .filter(|p| p.status != PairingStatus::Flaked)
        .flat_map(|p| p.missing_submitters())
        .collect();
    flaker_ids.sort();
    flaker_ids.dedup();

    let participants = if flaker_ids.is_empty() {
        Vec::new()
    } else {
        store
            .participants_by_ids(&flaker_ids)
            .await
            .map_err(RunError::Participants)?
    };

    let plan = plan_sweep(&pairings, &participants, now);
    if !plan.batch.is_empty() {
        store.commit_sweep(&plan.batch).await.map_err(RunError::Commit)?;
    }

    info!(
        "🧹 Sweep of {}: {} scanned, {} flaked, {} streaks bumped, {} already flaked, {} not yet expired",
        date,
        pairings.len(),
        plan.batch.flaked_pairings.len(),
        plan.batch.streak_updates.len(),
        plan.already_flaked,
        plan.not_yet_expired
    );

    Ok(SweepReport {
        date,
        scanned: pairings.len(),
        flaked: plan.batch.flaked_pairings.len(),
        participants_updated: plan.batch.streak_updates.len(),
        already_flaked: plan.already_flaked,
        not_yet_expired: plan.not_yet_expired,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderReport {
    pub date: NaiveDate,
    pub reminders: usize,
    pub notifications: DeliveryReport,
}

/// Nudges every side of today's open pairings that has not submitted yet.
pub async fn run_reminders(
    store: &dyn PairingStore,
    notifier: &dyn Notifier,
    schedule: &DaySchedule,
    now: DateTime<Utc>,
) -> Result<ReminderReport, RunError> {
    let date = schedule.local_date(now);
    let (start, end) = schedule.day_bounds(date);
    let pairings = store
        .pairings_created_between(start, end)
        .await
        .map_err(RunError::Pairings)?;

    let targets = reminder_targets(&pairings, now);
    let mut ids: Vec<Uuid> = targets.iter().map(|(_, participant)| *participant).collect();
    ids.sort();
    ids.dedup();

    let participants: HashMap<Uuid, Participant> = if ids.is_empty() {
        HashMap::new()
    } else {
        store
            .participants_by_ids(&ids)
            .await
            .map_err(RunError::Participants)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    let local_hour = schedule.local_hour(now);
    let mut notifications = DeliveryReport::default();
    for pairing in &pairings {
        let recipients: Vec<&Participant> = targets
            .iter()
            .filter(|(pairing_id, _)| *pairing_id == pairing.id)
            .filter_map(|(_, participant)| participants.get(participant))
            .collect();
        if recipients.is_empty() {
            continue;
        }

        let event = PairingEvent::new(
            EventKind::Reminder,
            pairing.id,
            pairing.participants().to_vec(),
            json!({ "expires_at": pairing.expires_at }),
        );
        notifications += dispatch(notifier, &event, &recipients, local_hour).await;
    }

    info!(
        "⏰ Sent {} reminders for {} ({} suppressed, {} failed)",
        notifications.sent, date, notifications.suppressed, notifications.failed
    );

    Ok(ReminderReport {
        date,
        reminders: targets.len(),
        notifications,
    })
}
