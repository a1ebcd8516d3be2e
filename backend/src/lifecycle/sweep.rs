//! Flake sweep planning.
//!
//! A side that never submitted is a flaker. Each flaker's lifetime count grows
//! by the number of pairings they flaked, while the consecutive streak grows by
//! exactly one per sweep. Already-flaked pairings are skipped, so sweeping the
//! same day twice changes nothing the second time.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::models::{Pairing, PairingStatus, Participant};
use crate::store::{StreakUpdate, SweepBatch};

#[derive(Debug, Clone, Default)]
pub struct SweepPlan {
    pub batch: SweepBatch,
    pub already_flaked: usize,
    pub not_yet_expired: usize,
}

pub fn plan_sweep(pairings: &[Pairing], participants: &[Participant], now: DateTime<Utc>) -> SweepPlan {
    let mut plan = SweepPlan::default();
    let mut flakers: Vec<Uuid> = Vec::new();
    let mut flake_counts: HashMap<Uuid, i32> = HashMap::new();

    for pairing in pairings {
        match pairing.status {
            PairingStatus::Completed => continue,
            PairingStatus::Flaked => {
                plan.already_flaked += 1;
                continue;
            }
            PairingStatus::Pending | PairingStatus::PartiallySubmitted => {}
        }

        if pairing.expires_at > now {
            plan.not_yet_expired += 1;
            continue;
        }

        let missing = pairing.missing_submitters();
        if missing.is_empty() {
            warn!("Pairing {} has both submissions but is {}, leaving it", pairing.id, pairing.status);
            continue;
        }

        plan.batch.flaked_pairings.push(pairing.id);
        for id in missing {
            let count = flake_counts.entry(id).or_insert(0);
            if *count == 0 {
                flakers.push(id);
            }
            *count += 1;
        }
    }

    let by_id: HashMap<Uuid, &Participant> = participants.iter().map(|p| (p.id, p)).collect();

    for id in flakers {
        let Some(participant) = by_id.get(&id) else {
            warn!("Flaker {} not found, streak left untouched", id);
            continue;
        };
        let streak = participant.consecutive_failure_streak + 1;
        plan.batch.streak_updates.push(StreakUpdate {
            participant_id: id,
            consecutive_failure_streak: streak,
            max_consecutive_failure_streak: participant.max_consecutive_failure_streak.max(streak),
            total_flakes: participant.total_flakes + flake_counts[&id],
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn expired_pairing(a: &Participant, b: &Participant, now: DateTime<Utc>) -> Pairing {
        Pairing::new(
            a.id,
            b.id,
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            now - Duration::hours(12),
            now - Duration::hours(1),
        )
    }

    #[test]
    fn both_sides_flake_when_nobody_submitted() {
        let now = Utc::now();
        let a = Participant::new("a", "A", now);
        let mut b = Participant::new("b", "B", now);
        b.consecutive_failure_streak = 2;
        b.max_consecutive_failure_streak = 7;
        b.total_flakes = 9;

        let pairing = expired_pairing(&a, &b, now);
        let plan = plan_sweep(&[pairing.clone()], &[a.clone(), b.clone()], now);

        assert_eq!(plan.batch.flaked_pairings, vec![pairing.id]);
        assert_eq!(
            plan.batch.streak_updates,
            vec![
                StreakUpdate {
                    participant_id: a.id,
                    consecutive_failure_streak: 1,
                    max_consecutive_failure_streak: 1,
                    total_flakes: 1,
                },
                StreakUpdate {
                    participant_id: b.id,
                    consecutive_failure_streak: 3,
                    max_consecutive_failure_streak: 7,
                    total_flakes: 10,
                },
            ]
        );
    }

    #[test]
    fn only_the_missing_side_flakes() {
        let now = Utc::now();
        let a = Participant::new("a", "A", now);
        let b = Participant::new("b", "B", now);
        let mut pairing = expired_pairing(&a, &b, now);
        pairing.participant_1_submitted_at = Some(now - Duration::hours(3));
        pairing.status = PairingStatus::PartiallySubmitted;

        let plan = plan_sweep(&[pairing], &[a, b.clone()], now);

        assert_eq!(plan.batch.streak_updates.len(), 1);
        assert_eq!(plan.batch.streak_updates[0].participant_id, b.id);
    }

    #[test]
    fn streak_grows_by_one_but_lifetime_by_count() {
        let now = Utc::now();
        let a = Participant::new("a", "A", now);
        let b = Participant::new("b", "B", now);
        let c = Participant::new("c", "C", now);
        let mut first = expired_pairing(&a, &b, now);
        first.participant_2_submitted_at = Some(now - Duration::hours(2));
        let mut second = expired_pairing(&a, &c, now);
        second.participant_2_submitted_at = Some(now - Duration::hours(2));

        let plan = plan_sweep(&[first, second], &[a.clone(), b, c], now);

        assert_eq!(plan.batch.flaked_pairings.len(), 2);
        assert_eq!(
            plan.batch.streak_updates,
            vec![StreakUpdate {
                participant_id: a.id,
                consecutive_failure_streak: 1,
                max_consecutive_failure_streak: 1,
                total_flakes: 2,
            }]
        );
    }

    #[test]
    fn terminal_and_unexpired_pairings_are_left_alone() {
        let now = Utc::now();
        let a = Participant::new("a", "A", now);
        let b = Participant::new("b", "B", now);

        let mut flaked = expired_pairing(&a, &b, now);
        flaked.status = PairingStatus::Flaked;
        let mut completed = expired_pairing(&a, &b, now);
        completed.status = PairingStatus::Completed;
        let mut open = expired_pairing(&a, &b, now);
        open.expires_at = now + Duration::hours(1);

        let plan = plan_sweep(&[flaked, completed, open], &[a, b], now);

        assert!(plan.batch.is_empty());
        assert_eq!(plan.already_flaked, 1);
        assert_eq!(plan.not_yet_expired, 1);
    }
}
