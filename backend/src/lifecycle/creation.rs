use chrono::{DateTime, Utc};

use crate::matching::MatchOutcome;
use crate::models::Pairing;
use crate::store::MatchRunBatch;
use crate::utils::DaySchedule;

/// Shapes a match outcome into the run's single write batch.
///
/// Every pair becomes a `pending` pairing expiring at the day's cutoff.
/// Matched participants have their waitlist priority consumed; waitlisted
/// ones are flagged for priority on the next run.
pub fn build_match_batch(outcome: &MatchOutcome, schedule: &DaySchedule, now: DateTime<Utc>) -> MatchRunBatch {
    let match_date = schedule.local_date(now);
    let expires_at = schedule.expiry_for(match_date);

    let pairings: Vec<Pairing> = outcome
        .pairs
        .iter()
        .map(|pair| Pairing::new(pair.first.id, pair.second.id, match_date, now, expires_at))
        .collect();

    let matched = outcome
        .pairs
        .iter()
        .flat_map(|pair| [pair.first.id, pair.second.id])
        .collect();

    let waitlisted: Vec<_> = outcome.waitlist.iter().map(|p| p.id).collect();

    MatchRunBatch {
        pairings,
        matched,
        waitlisted_at: (!waitlisted.is_empty()).then_some(now),
        waitlisted,
    }
}
