//! Daily matching.
//!
//! Participants flagged `priority_next_run` are served first. Each participant
//! tries a friend match over a shuffled candidate list, then a general match
//! over the pool in order, and is waitlisted if both fail. The engine is pure:
//! history and randomness are supplied by the caller.

use rand::RngCore;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::HistoryIndex;
use crate::models::Participant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Friend,
    General,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub first: Participant,
    pub second: Participant,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub pairs: Vec<MatchedPair>,
    pub waitlist: Vec<Participant>,
}

/// Working set for a single run.
struct MatchState<'a> {
    pool: Vec<&'a Participant>,
    positions: HashMap<Uuid, usize>,
    claimed: Vec<bool>,
    history: HistoryIndex,
}

impl<'a> MatchState<'a> {
    fn new(participants: &'a [Participant], recent_history: &[(Uuid, Uuid)]) -> Self {
        let mut pool: Vec<&Participant> = participants.iter().collect();
        // Stable: ties keep input order.
        pool.sort_by_key(|p| !p.priority_next_run);

        let mut positions = HashMap::with_capacity(pool.len());
        for (i, p) in pool.iter().enumerate() {
            positions.entry(p.id).or_insert(i);
        }

        Self {
            claimed: vec![false; pool.len()],
            pool,
            positions,
            history: HistoryIndex::from_pairs(recent_history.iter().copied()),
        }
    }

    fn can_pair(&self, seeker: usize, candidate: usize) -> bool {
        if seeker == candidate || self.claimed[candidate] {
            return false;
        }
        let (a, b) = (self.pool[seeker], self.pool[candidate]);
        a.id != b.id && !a.is_blocked_with(b) && !self.history.contains(a.id, b.id)
    }
}

/// One step of the match pipeline.
trait MatchAttempt {
    fn kind(&self) -> MatchKind;

    fn attempt(
        &self,
        seeker: usize,
        state: &MatchState<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<usize>;
}

struct FriendAttempt;

impl MatchAttempt for FriendAttempt {
    fn kind(&self) -> MatchKind {
        MatchKind::Friend
    }

    fn attempt(
        &self,
        seeker: usize,
        state: &MatchState<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        let mut candidates: Vec<usize> = state.pool[seeker]
            .connections
            .iter()
            .filter_map(|id| state.positions.get(id).copied())
            .collect();
        candidates.shuffle(rng);

        candidates.into_iter().find(|&c| state.can_pair(seeker, c))
    }
}

struct GeneralAttempt;

impl MatchAttempt for GeneralAttempt {
    fn kind(&self) -> MatchKind {
        MatchKind::General
    }

    fn attempt(
        &self,
        seeker: usize,
        state: &MatchState<'_>,
        _rng: &mut dyn RngCore,
    ) -> Option<usize> {
        (0..state.pool.len()).find(|&c| state.can_pair(seeker, c))
    }
}

const PIPELINE: &[&dyn MatchAttempt] = &[&FriendAttempt, &GeneralAttempt];

/// Partitions `participants` into disjoint pairs and a waitlist.
///
/// `recent_history` holds pairs matched inside the lookback window; none of
/// them will be produced again. Deterministic for a seeded `rng`.
pub fn match_participants<R: RngCore>(
    participants: &[Participant],
    recent_history: &[(Uuid, Uuid)],
    rng: &mut R,
) -> MatchOutcome {
    let mut state = MatchState::new(participants, recent_history);
    let mut outcome = MatchOutcome::default();

    for seeker in 0..state.pool.len() {
        if state.claimed[seeker] {
            continue;
        }

        let found = PIPELINE
            .iter()
            .find_map(|step| {
                step.attempt(seeker, &state, rng)
                    .map(|partner| (partner, step.kind()))
            });

        match found {
            Some((partner, kind)) => {
                state.claimed[seeker] = true;
                state.claimed[partner] = true;
                outcome.pairs.push(MatchedPair {
                    first: state.pool[seeker].clone(),
                    second: state.pool[partner].clone(),
                    kind,
                });
            }
            None => {
                state.claimed[seeker] = true;
                outcome.waitlist.push(state.pool[seeker].clone());
            }
        }
    }

    tracing::debug!(
        "Matched {} pairs ({} friend), waitlisted {}",
        outcome.pairs.len(),
        outcome.pairs.iter().filter(|p| p.kind == MatchKind::Friend).count(),
        outcome.waitlist.len()
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn people(names: &[&str]) -> Vec<Participant> {
        let now = Utc::now();
        names.iter().map(|n| Participant::new(*n, n.to_uppercase(), now)).collect()
    }

    fn befriend(pool: &mut [Participant], a: usize, b: usize) {
        let (ida, idb) = (pool[a].id, pool[b].id);
        pool[a].connections.push(idb);
        pool[b].connections.push(ida);
    }

    fn block(pool: &mut [Participant], by: usize, target: usize) {
        let id = pool[target].id;
        pool[by].blocked_ids.push(id);
    }

    fn paired(outcome: &MatchOutcome, a: Uuid, b: Uuid) -> bool {
        outcome
            .pairs
            .iter()
            .any(|p| (p.first.id == a && p.second.id == b) || (p.first.id == b && p.second.id == a))
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn empty_pool_produces_nothing() {
        let outcome = match_participants(&[], &[], &mut rng());
        assert!(outcome.pairs.is_empty());
        assert!(outcome.waitlist.is_empty());
    }

    #[test]
    fn odd_pool_waitlists_exactly_one() {
        let pool = people(&["a", "b", "c"]);
        let outcome = match_participants(&pool, &[], &mut rng());
        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.waitlist.len(), 1);
        assert_eq!(outcome.waitlist[0].id, pool[2].id);
    }

    #[test]
    fn friend_match_wins_and_history_is_respected() {
        let mut pool = people(&["a", "b", "c", "d"]);
        befriend(&mut pool, 0, 1);
        let history = vec![(pool[0].id, pool[2].id)];

        let outcome = match_participants(&pool, &history, &mut rng());

        assert!(paired(&outcome, pool[0].id, pool[1].id));
        assert!(!paired(&outcome, pool[0].id, pool[2].id));
        assert!(paired(&outcome, pool[2].id, pool[3].id));
        assert_eq!(outcome.pairs[0].kind, MatchKind::Friend);
        assert_eq!(outcome.pairs[1].kind, MatchKind::General);
        assert!(outcome.waitlist.is_empty());
    }

    #[test]
    fn recent_partner_is_skipped_even_as_only_candidate() {
        let pool = people(&["a", "b"]);
        let history = vec![(pool[1].id, pool[0].id)];
        let outcome = match_participants(&pool, &history, &mut rng());
        assert!(outcome.pairs.is_empty());
        assert_eq!(outcome.waitlist.len(), 2);
    }

    #[test]
    fn one_sided_block_excludes_the_pair() {
        let mut pool = people(&["a", "b", "c"]);
        block(&mut pool, 1, 0);

        let outcome = match_participants(&pool, &[], &mut rng());

        assert!(!paired(&outcome, pool[0].id, pool[1].id));
        assert!(paired(&outcome, pool[0].id, pool[2].id));
        assert_eq!(outcome.waitlist[0].id, pool[1].id);
    }

    #[test]
    fn blocked_friend_falls_back_to_general() {
        let mut pool = people(&["a", "b", "c"]);
        befriend(&mut pool, 0, 1);
        block(&mut pool, 0, 1);

        let outcome = match_participants(&pool, &[], &mut rng());

        assert_eq!(outcome.pairs.len(), 1);
        assert!(paired(&outcome, pool[0].id, pool[2].id));
        assert_eq!(outcome.pairs[0].kind, MatchKind::General);
    }

    #[test]
    fn priority_participant_is_served_first() {
        let mut pool = people(&["a", "b", "flagged"]);
        pool[2].priority_next_run = true;

        let outcome = match_participants(&pool, &[], &mut rng());

        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.pairs[0].first.id, pool[2].id);
        assert_eq!(outcome.pairs[0].second.id, pool[0].id);
        assert_eq!(outcome.waitlist[0].id, pool[1].id);
    }

    #[test]
    fn priority_in_a_pool_of_four() {
        let mut pool = people(&["a", "b", "c", "flagged"]);
        pool[3].priority_next_run = true;

        let outcome = match_participants(&pool, &[], &mut rng());

        assert!(outcome.waitlist.iter().all(|p| p.id != pool[3].id));
        assert_eq!(outcome.pairs.len(), 2);
        assert_eq!(outcome.pairs[0].first.id, pool[3].id);
    }

    #[test]
    fn priority_sort_is_stable() {
        let mut pool = people(&["a", "b", "c", "d"]);
        pool[1].priority_next_run = true;
        pool[3].priority_next_run = true;

        let outcome = match_participants(&pool, &[], &mut rng());

        assert_eq!(outcome.pairs[0].first.id, pool[1].id);
        assert_eq!(outcome.pairs[0].second.id, pool[3].id);
        assert_eq!(outcome.pairs[1].first.id, pool[0].id);
        assert_eq!(outcome.pairs[1].second.id, pool[2].id);
    }

    #[test]
    fn self_connection_and_outside_friends_are_tolerated() {
        let mut pool = people(&["a"]);
        let own = pool[0].id;
        pool[0].connections.push(own);
        pool[0].connections.push(Uuid::new_v4());

        let outcome = match_participants(&pool, &[], &mut rng());

        assert!(outcome.pairs.is_empty());
        assert_eq!(outcome.waitlist.len(), 1);
    }

    #[test]
    fn friend_choice_varies_with_randomness() {
        let mut pool = people(&["seeker", "f1", "f2", "f3"]);
        befriend(&mut pool, 0, 1);
        befriend(&mut pool, 0, 2);
        befriend(&mut pool, 0, 3);

        let chosen: HashSet<Uuid> = (0..64)
            .map(|seed| {
                let outcome = match_participants(&pool, &[], &mut StdRng::seed_from_u64(seed));
                assert_eq!(outcome.pairs[0].first.id, pool[0].id);
                outcome.pairs[0].second.id
            })
            .collect();

        assert_eq!(chosen.len(), 3);
    }

    #[test]
    fn same_seed_same_outcome() {
        let mut pool = people(&["a", "b", "c", "d", "e", "f"]);
        befriend(&mut pool, 0, 1);
        befriend(&mut pool, 0, 2);
        befriend(&mut pool, 3, 4);
        befriend(&mut pool, 3, 5);

        let first = match_participants(&pool, &[], &mut StdRng::seed_from_u64(42));
        let second = match_participants(&pool, &[], &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn every_participant_lands_exactly_once() {
        let mut pool = people(&["a", "b", "c", "d", "e", "f", "g"]);
        befriend(&mut pool, 0, 4);
        block(&mut pool, 2, 3);
        let history = vec![(pool[1].id, pool[2].id), (pool[5].id, pool[6].id)];

        let outcome = match_participants(&pool, &history, &mut rng());

        let mut seen: Vec<Uuid> = outcome
            .pairs
            .iter()
            .flat_map(|p| [p.first.id, p.second.id])
            .chain(outcome.waitlist.iter().map(|p| p.id))
            .collect();
        seen.sort();
        let mut expected: Vec<Uuid> = pool.iter().map(|p| p.id).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }
}
