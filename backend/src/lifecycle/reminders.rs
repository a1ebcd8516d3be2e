use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::Pairing;

/// `(pairing, participant)` for every side of a still-open pairing that has not submitted.
pub fn reminder_targets(pairings: &[Pairing], now: DateTime<Utc>) -> Vec<(Uuid, Uuid)> {
    pairings
        .iter()
        .filter(|p| !p.status.is_terminal() && p.expires_at > now)
        .flat_map(|p| p.missing_submitters().into_iter().map(move |id| (p.id, id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PairingStatus;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn only_open_unsubmitted_sides_are_reminded() {
        let now = Utc::now();
        let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let later = now + Duration::hours(3);

        let mut partial = Pairing::new(Uuid::new_v4(), Uuid::new_v4(), date, now, later);
        partial.participant_1_submitted_at = Some(now);
        partial.status = PairingStatus::PartiallySubmitted;

        let untouched = Pairing::new(Uuid::new_v4(), Uuid::new_v4(), date, now, later);

        let mut completed = Pairing::new(Uuid::new_v4(), Uuid::new_v4(), date, now, later);
        completed.status = PairingStatus::Completed;

        let expired = Pairing::new(Uuid::new_v4(), Uuid::new_v4(), date, now, now - Duration::minutes(1));

        let targets = reminder_targets(&[partial.clone(), untouched.clone(), completed, expired], now);

        assert_eq!(
            targets,
            vec![
                (partial.id, partial.participant_2),
                (untouched.id, untouched.participant_1),
                (untouched.id, untouched.participant_2),
            ]
        );
    }
}
