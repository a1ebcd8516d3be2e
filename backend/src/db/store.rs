use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{pairings, participants};
use crate::error::StoreError;
use crate::matching::{EligibilityCriteria, HistoryRecord};
use crate::models::{Pairing, Participant};
use crate::store::{FallbackBatch, MatchRunBatch, PairingStore, SubmissionBatch, SweepBatch};

const HANDLE_CONSTRAINT: &str = "participants_handle_key";

/// Postgres-backed store. Every commit runs inside one transaction.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn handle_error(err: sqlx::Error, handle: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() && db.constraint() == Some(HANDLE_CONSTRAINT) => {
            StoreError::HandleTaken(handle.to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn to_pairings(rows: Vec<pairings::PairingRow>) -> Result<Vec<Pairing>, StoreError> {
    rows.into_iter().map(Pairing::try_from).collect()
}

#[async_trait]
impl PairingStore for PgStore {
    async fn eligible_participants(&self, criteria: &EligibilityCriteria) -> Result<Vec<Participant>, StoreError> {
        Ok(participants::get_eligible_participants(&self.pool, criteria).await?)
    }

    async fn pair_history(&self, since: DateTime<Utc>) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(pairings::get_pair_history(&self.pool, since).await?)
    }

    async fn get_participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        Ok(participants::get_participant_by_id(&self.pool, id).await?)
    }

    async fn participants_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Participant>, StoreError> {
        Ok(participants::get_participants_by_ids(&self.pool, ids).await?)
    }

    async fn get_pairing(&self, id: Uuid) -> Result<Option<Pairing>, StoreError> {
        pairings::get_pairing_by_id(&self.pool, id)
            .await?
            .map(Pairing::try_from)
            .transpose()
    }

    async fn pairings_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Pairing>, StoreError> {
        to_pairings(pairings::get_pairings_created_between(&self.pool, start, end).await?)
    }

    async fn has_pairing_between(
        &self,
        participant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(pairings::has_pairing_between(&self.pool, participant_id, start, end).await?)
    }

    async fn find_waitlisted_partner(
        &self,
        exclude: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(participants::find_waitlisted_partner(&self.pool, exclude, start, end).await?)
    }

    async fn count_placeholders(&self) -> Result<u32, StoreError> {
        let count = participants::count_placeholders(&self.pool).await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn commit_match_run(&self, batch: &MatchRunBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for pairing in &batch.pairings {
            pairings::insert_pairing(&mut *tx, pairing).await?;
        }
        if !batch.matched.is_empty() {
            participants::clear_waitlist_flags(&mut *tx, &batch.matched).await?;
        }
        if !batch.waitlisted.is_empty() {
            participants::mark_waitlisted(&mut *tx, &batch.waitlisted, batch.waitlisted_at).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn commit_sweep(&self, batch: &SweepBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let flaked = pairings::mark_flaked(&mut *tx, &batch.flaked_pairings).await?;
        for update in &batch.streak_updates {
            if participants::apply_streak_update(&mut *tx, update).await? == 0 {
                return Err(StoreError::NotFound(update.participant_id));
            }
        }

        tx.commit().await?;
        tracing::debug!("Sweep flaked {} pairings, updated {} participants", flaked, batch.streak_updates.len());
        Ok(())
    }

    async fn commit_submission(&self, batch: &SubmissionBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        if pairings::update_submission(&mut *tx, &batch.pairing, batch.expected_status).await? == 0 {
            return Err(StoreError::Conflict(batch.pairing.id));
        }
        if !batch.reset_streaks.is_empty() {
            participants::reset_failure_streaks(&mut *tx, &batch.reset_streaks).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn commit_fallback(&self, batch: &FallbackBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        if let Some(placeholder) = &batch.placeholder {
            participants::insert_participant(&mut *tx, placeholder)
                .await
                .map_err(|e| handle_error(e, &placeholder.handle))?;
        }
        if let Some(partner) = batch.consumed_waitlist {
            if participants::consume_waitlisted(&mut *tx, partner).await? == 0 {
                return Err(StoreError::Conflict(partner));
            }
        }
        pairings::insert_pairing(&mut *tx, &batch.pairing).await?;

        tx.commit().await?;
        Ok(())
    }
}
