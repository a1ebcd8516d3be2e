use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Pairing, PairingStatus, Participant};

/// Everything a matching run writes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchRunBatch {
    pub pairings: Vec<Pairing>,
    /// Participants whose waitlist flags are consumed (cleared).
    pub matched: Vec<Uuid>,
    /// Participants flagged `waitlisted_today` and `priority_next_run`.
    pub waitlisted: Vec<Uuid>,
    pub waitlisted_at: Option<DateTime<Utc>>,
}

impl MatchRunBatch {
    pub fn is_empty(&self) -> bool {
        self.pairings.is_empty() && self.matched.is_empty() && self.waitlisted.is_empty()
    }
}

/// Absolute post-sweep counters for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    pub participant_id: Uuid,
    pub consecutive_failure_streak: i32,
    pub max_consecutive_failure_streak: i32,
    pub total_flakes: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepBatch {
    pub flaked_pairings: Vec<Uuid>,
    pub streak_updates: Vec<StreakUpdate>,
}

impl SweepBatch {
    pub fn is_empty(&self) -> bool {
        self.flaked_pairings.is_empty() && self.streak_updates.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionBatch {
    pub pairing: Pairing,
    pub expected_status: PairingStatus,
    /// Set when the submission completed the pairing.
    pub reset_streaks: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FallbackBatch {
    pub pairing: Pairing,
    pub placeholder: Option<Participant>,
    /// Waitlisted partner whose flags are consumed.
    pub consumed_waitlist: Option<Uuid>,
}
