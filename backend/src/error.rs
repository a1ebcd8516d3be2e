use thiserror::Error;
use uuid::Uuid;

use crate::models::PairingStatus;

/// Failures at the persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("handle already taken: {0}")]
    HandleTaken(String),

    /// A compare-and-set write found the record in a different state.
    #[error("stale write for {0}")]
    Conflict(Uuid),

    #[error("record not found: {0}")]
    NotFound(Uuid),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("commit rejected: {0}")]
    CommitRejected(String),
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("pairing {0} not found")]
    PairingNotFound(Uuid),

    #[error("participant {participant_id} is not part of pairing {pairing_id}")]
    NotAParticipant { pairing_id: Uuid, participant_id: Uuid },

    #[error("participant {participant_id} already submitted for pairing {pairing_id}")]
    AlreadySubmitted { pairing_id: Uuid, participant_id: Uuid },

    #[error("pairing {pairing_id} is already {status}")]
    PairingClosed { pairing_id: Uuid, status: PairingStatus },

    #[error("pairing {pairing_id} has expired")]
    PairingExpired { pairing_id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("participant {0} not found")]
    UnknownParticipant(Uuid),

    #[error("participant {0} already has a pairing today")]
    AlreadyPaired(Uuid),

    #[error("could not allocate a placeholder participant after {attempts} attempts")]
    PlaceholderExhausted { attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A scheduled run failed before or during its commit; nothing was applied.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("eligibility lookup failed: {0}")]
    Eligibility(#[source] StoreError),

    #[error("history lookup failed: {0}")]
    History(#[source] StoreError),

    #[error("pairing lookup failed: {0}")]
    Pairings(#[source] StoreError),

    #[error("participant lookup failed: {0}")]
    Participants(#[source] StoreError),

    #[error("batch commit failed: {0}")]
    Commit(#[source] StoreError),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("delivery endpoint answered {0}")]
    Rejected(u16),
}
