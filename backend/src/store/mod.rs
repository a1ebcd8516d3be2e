//! Persistence boundary.
//!
//! Reads feed the scheduled jobs; every write is a single all-or-nothing
//! batch. [`crate::db::PgStore`] backs production, [`InMemoryStore`] backs
//! tests and dry runs.

pub mod batches;
pub mod memory;

pub use batches::{FallbackBatch, MatchRunBatch, StreakUpdate, SubmissionBatch, SweepBatch};
pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::matching::{EligibilityCriteria, HistoryRecord};
use crate::models::{Pairing, Participant};

#[async_trait]
pub trait PairingStore: Send + Sync {
    /// Active, recently seen, unsuspended participants in stable order.
    async fn eligible_participants(&self, criteria: &EligibilityCriteria) -> Result<Vec<Participant>, StoreError>;

    /// Raw pairing history created at or after `since`. May contain repeats.
    async fn pair_history(&self, since: DateTime<Utc>) -> Result<Vec<HistoryRecord>, StoreError>;

    async fn get_participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError>;

    async fn participants_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Participant>, StoreError>;

    async fn get_pairing(&self, id: Uuid) -> Result<Option<Pairing>, StoreError>;

    /// Pairings created in `[start, end)`, oldest first.
    async fn pairings_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Pairing>, StoreError>;

    async fn has_pairing_between(
        &self,
        participant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// An active participant other than `exclude` who was waitlisted in
    /// `[start, end)` and has no pairing created in that window.
    async fn find_waitlisted_partner(
        &self,
        exclude: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Participant>, StoreError>;

    async fn count_placeholders(&self) -> Result<u32, StoreError>;

    async fn commit_match_run(&self, batch: &MatchRunBatch) -> Result<(), StoreError>;

    async fn commit_sweep(&self, batch: &SweepBatch) -> Result<(), StoreError>;

    /// Fails with [`StoreError::Conflict`] if the pairing is no longer in `batch.expected_status`.
    async fn commit_submission(&self, batch: &SubmissionBatch) -> Result<(), StoreError>;

    /// Fails with [`StoreError::HandleTaken`] if the placeholder handle exists.
    async fn commit_fallback(&self, batch: &FallbackBatch) -> Result<(), StoreError>;
}
