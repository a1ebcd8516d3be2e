use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{FallbackBatch, MatchRunBatch, PairingStore, SubmissionBatch, SweepBatch};
use crate::error::StoreError;
use crate::matching::{EligibilityCriteria, HistoryRecord};
use crate::models::{Pairing, Participant};

#[derive(Debug, Default)]
struct MemoryState {
    participants: Vec<Participant>,
    pairings: Vec<Pairing>,
}

impl MemoryState {
    fn participant_mut(&mut self, id: Uuid) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    fn has_participant(&self, id: Uuid) -> bool {
        self.participants.iter().any(|p| p.id == id)
    }

    fn require_participants<'a>(&self, ids: impl IntoIterator<Item = &'a Uuid>) -> Result<(), StoreError> {
        for id in ids {
            if !self.has_participant(*id) {
                return Err(StoreError::NotFound(*id));
            }
        }
        Ok(())
    }
}

/// Store kept entirely in memory. Each commit validates before it mutates, so
/// a failed batch leaves no trace.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    reject_commits: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participants(participants: impl IntoIterator<Item = Participant>) -> Self {
        let store = Self::new();
        for participant in participants {
            store.insert_participant(participant);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_participant(&self, participant: Participant) {
        self.lock().participants.push(participant);
    }

    pub fn insert_pairing(&self, pairing: Pairing) {
        self.lock().pairings.push(pairing);
    }

    pub fn participant(&self, id: Uuid) -> Option<Participant> {
        self.lock().participants.iter().find(|p| p.id == id).cloned()
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.lock().participants.clone()
    }

    pub fn pairing(&self, id: Uuid) -> Option<Pairing> {
        self.lock().pairings.iter().find(|p| p.id == id).cloned()
    }

    pub fn pairings(&self) -> Vec<Pairing> {
        self.lock().pairings.clone()
    }

    /// Makes every subsequent commit fail, simulating a store outage.
    pub fn reject_commits(&self, reject: bool) {
        self.reject_commits.store(reject, Ordering::SeqCst);
    }

    fn check_commit(&self) -> Result<(), StoreError> {
        if self.reject_commits.load(Ordering::SeqCst) {
            return Err(StoreError::CommitRejected("store is rejecting commits".to_string()));
        }
        Ok(())
    }
}

fn created_between(pairing: &Pairing, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    pairing.created_at >= start && pairing.created_at < end
}

#[async_trait]
impl PairingStore for InMemoryStore {
    async fn eligible_participants(&self, criteria: &EligibilityCriteria) -> Result<Vec<Participant>, StoreError> {
        Ok(self
            .lock()
            .participants
            .iter()
            .filter(|p| criteria.admits(p))
            .cloned()
            .collect())
    }

    async fn pair_history(&self, since: DateTime<Utc>) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(self
            .lock()
            .pairings
            .iter()
            .filter(|p| p.created_at >= since)
            .map(|p| HistoryRecord {
                participant_a: p.participant_1,
                participant_b: p.participant_2,
                match_date: p.match_date,
            })
            .collect())
    }

    async fn get_participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        Ok(self.participant(id))
    }

    async fn participants_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Participant>, StoreError> {
        Ok(self
            .lock()
            .participants
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn get_pairing(&self, id: Uuid) -> Result<Option<Pairing>, StoreError> {
        Ok(self.pairing(id))
    }

    async fn pairings_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Pairing>, StoreError> {
        let mut pairings: Vec<Pairing> = self
            .lock()
            .pairings
            .iter()
            .filter(|p| created_between(p, start, end))
            .cloned()
            .collect();
        pairings.sort_by_key(|p| p.created_at);
        Ok(pairings)
    }

    async fn has_pairing_between(
        &self,
        participant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .pairings
            .iter()
            .any(|p| created_between(p, start, end) && p.side_of(participant_id).is_some()))
    }

    async fn find_waitlisted_partner(
        &self,
        exclude: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Participant>, StoreError> {
        let state = self.lock();
        Ok(state
            .participants
            .iter()
            .filter(|p| p.waitlisted_today && p.active && p.id != exclude)
            .filter(|p| p.waitlisted_at.is_some_and(|at| at >= start && at < end))
            .filter(|p| {
                !state
                    .pairings
                    .iter()
                    .any(|pairing| created_between(pairing, start, end) && pairing.side_of(p.id).is_some())
            })
            .min_by_key(|p| (p.waitlisted_at, p.created_at))
            .cloned())
    }

    async fn count_placeholders(&self) -> Result<u32, StoreError> {
        Ok(self.lock().participants.iter().filter(|p| p.is_placeholder).count() as u32)
    }

    async fn commit_match_run(&self, batch: &MatchRunBatch) -> Result<(), StoreError> {
        self.check_commit()?;
        let mut state = self.lock();

        state.require_participants(
            batch
                .pairings
                .iter()
                .flat_map(|p| [&p.participant_1, &p.participant_2])
                .chain(&batch.matched)
                .chain(&batch.waitlisted),
        )?;

        state.pairings.extend(batch.pairings.iter().cloned());
        for id in &batch.matched {
            if let Some(p) = state.participant_mut(*id) {
                p.waitlisted_today = false;
                p.priority_next_run = false;
            }
        }
        for id in &batch.waitlisted {
            if let Some(p) = state.participant_mut(*id) {
                p.waitlisted_today = true;
                p.priority_next_run = true;
                p.waitlisted_at = batch.waitlisted_at;
            }
        }
        Ok(())
    }

    async fn commit_sweep(&self, batch: &SweepBatch) -> Result<(), StoreError> {
        self.check_commit()?;
        let mut state = self.lock();

        state.require_participants(batch.streak_updates.iter().map(|u| &u.participant_id))?;
        for id in &batch.flaked_pairings {
            if !state.pairings.iter().any(|p| p.id == *id) {
                return Err(StoreError::NotFound(*id));
            }
        }

        for pairing in state.pairings.iter_mut() {
            if batch.flaked_pairings.contains(&pairing.id) && !pairing.status.is_terminal() {
                pairing.status = crate::models::PairingStatus::Flaked;
            }
        }
        for update in &batch.streak_updates {
            if let Some(p) = state.participant_mut(update.participant_id) {
                p.consecutive_failure_streak = update.consecutive_failure_streak;
                p.max_consecutive_failure_streak = update.max_consecutive_failure_streak;
                p.total_flakes = update.total_flakes;
            }
        }
        Ok(())
    }

    async fn commit_submission(&self, batch: &SubmissionBatch) -> Result<(), StoreError> {
        self.check_commit()?;
        let mut state = self.lock();

        state.require_participants(&batch.reset_streaks)?;
        let slot = state
            .pairings
            .iter()
            .position(|p| p.id == batch.pairing.id)
            .ok_or(StoreError::NotFound(batch.pairing.id))?;
        if state.pairings[slot].status != batch.expected_status {
            return Err(StoreError::Conflict(batch.pairing.id));
        }

        state.pairings[slot] = batch.pairing.clone();
        for id in &batch.reset_streaks {
            if let Some(p) = state.participant_mut(*id) {
                p.consecutive_failure_streak = 0;
            }
        }
        Ok(())
    }

    async fn commit_fallback(&self, batch: &FallbackBatch) -> Result<(), StoreError> {
        self.check_commit()?;
        let mut state = self.lock();

        if let Some(placeholder) = &batch.placeholder {
            if state.participants.iter().any(|p| p.handle == placeholder.handle) {
                return Err(StoreError::HandleTaken(placeholder.handle.clone()));
            }
        }
        let placeholder_id = batch.placeholder.as_ref().map(|p| p.id);
        for id in [batch.pairing.participant_1, batch.pairing.participant_2]
            .into_iter()
            .chain(batch.consumed_waitlist)
        {
            if Some(id) != placeholder_id && !state.has_participant(id) {
                return Err(StoreError::NotFound(id));
            }
        }

        if let Some(placeholder) = &batch.placeholder {
            state.participants.push(placeholder.clone());
        }
        if let Some(id) = batch.consumed_waitlist {
            if let Some(p) = state.participant_mut(id) {
                p.waitlisted_today = false;
                p.priority_next_run = false;
            }
        }
        state.pairings.push(batch.pairing.clone());
        Ok(())
    }
}
