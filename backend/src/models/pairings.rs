use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::LifecycleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingStatus {
    Pending,
    PartiallySubmitted,
    Completed,
    Flaked,
}

impl PairingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PairingStatus::Completed | PairingStatus::Flaked)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PairingStatus::Pending => "pending",
            PairingStatus::PartiallySubmitted => "partially_submitted",
            PairingStatus::Completed => "completed",
            PairingStatus::Flaked => "flaked",
        }
    }
}

impl fmt::Display for PairingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PairingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PairingStatus::Pending),
            "partially_submitted" => Ok(PairingStatus::PartiallySubmitted),
            "completed" => Ok(PairingStatus::Completed),
            "flaked" => Ok(PairingStatus::Flaked),
            other => Err(format!("unknown pairing status: {}", other)),
        }
    }
}

/// Which slot of a pairing a participant occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingSide {
    First,
    Second,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub id: Uuid,
    pub participant_1: Uuid,
    pub participant_2: Uuid,
    /// Calendar day (in the matching time zone) the pairing belongs to.
    pub match_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: PairingStatus,
    pub participant_1_submitted_at: Option<DateTime<Utc>>,
    pub participant_2_submitted_at: Option<DateTime<Utc>>,
    pub like_count: i32,
    pub comment_count: i32,
    pub meeting_ref: Option<String>,
}

impl Pairing {
    pub fn new(
        participant_1: Uuid,
        participant_2: Uuid,
        match_date: NaiveDate,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            participant_1,
            participant_2,
            match_date,
            created_at,
            expires_at,
            status: PairingStatus::Pending,
            participant_1_submitted_at: None,
            participant_2_submitted_at: None,
            like_count: 0,
            comment_count: 0,
            meeting_ref: None,
        }
    }

    pub fn participants(&self) -> [Uuid; 2] {
        [self.participant_1, self.participant_2]
    }

    pub fn side_of(&self, participant_id: Uuid) -> Option<PairingSide> {
        if participant_id == self.participant_1 {
            Some(PairingSide::First)
        } else if participant_id == self.participant_2 {
            Some(PairingSide::Second)
        } else {
            None
        }
    }

    pub fn has_submitted(&self, side: PairingSide) -> bool {
        match side {
            PairingSide::First => self.participant_1_submitted_at.is_some(),
            PairingSide::Second => self.participant_2_submitted_at.is_some(),
        }
    }

    /// Participants who have not submitted; on an expired pairing these are the flakers.
    pub fn missing_submitters(&self) -> Vec<Uuid> {
        let mut missing = Vec::with_capacity(2);
        if !self.has_submitted(PairingSide::First) {
            missing.push(self.participant_1);
        }
        if !self.has_submitted(PairingSide::Second) {
            missing.push(self.participant_2);
        }
        missing
    }

    /// Records a photo submission and advances the status.
    ///
    /// `pending -> partially_submitted -> completed`. Terminal pairings and
    /// pairings past their expiry reject submissions.
    pub fn record_submission(
        &mut self,
        participant_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<PairingStatus, LifecycleError> {
        let side = self.side_of(participant_id).ok_or(LifecycleError::NotAParticipant {
            pairing_id: self.id,
            participant_id,
        })?;

        if self.status.is_terminal() {
            return Err(LifecycleError::PairingClosed {
                pairing_id: self.id,
                status: self.status,
            });
        }
        if at > self.expires_at {
            return Err(LifecycleError::PairingExpired { pairing_id: self.id });
        }
        if self.has_submitted(side) {
            return Err(LifecycleError::AlreadySubmitted {
                pairing_id: self.id,
                participant_id,
            });
        }

        match side {
            PairingSide::First => self.participant_1_submitted_at = Some(at),
            PairingSide::Second => self.participant_2_submitted_at = Some(at),
        }

        self.status = if self.missing_submitters().is_empty() {
            PairingStatus::Completed
        } else {
            PairingStatus::PartiallySubmitted
        };

        Ok(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample() -> Pairing {
        let created = Utc.with_ymd_and_hms(2026, 3, 2, 17, 0, 0).unwrap();
        Pairing::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            created,
            created + Duration::hours(6),
        )
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            PairingStatus::Pending,
            PairingStatus::PartiallySubmitted,
            PairingStatus::Completed,
            PairingStatus::Flaked,
        ] {
            assert_eq!(status.as_str().parse::<PairingStatus>(), Ok(status));
        }
        assert!("done".parse::<PairingStatus>().is_err());
    }

    #[test]
    fn two_submissions_complete_the_pairing() {
        let mut pairing = sample();
        let at = pairing.created_at + Duration::hours(1);

        let first = pairing.record_submission(pairing.participant_2, at).unwrap();
        assert_eq!(first, PairingStatus::PartiallySubmitted);
        assert_eq!(pairing.missing_submitters(), vec![pairing.participant_1]);

        let second = pairing.record_submission(pairing.participant_1, at).unwrap();
        assert_eq!(second, PairingStatus::Completed);
        assert!(pairing.missing_submitters().is_empty());
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let mut pairing = sample();
        let at = pairing.created_at;
        pairing.record_submission(pairing.participant_1, at).unwrap();

        let err = pairing.record_submission(pairing.participant_1, at).unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadySubmitted { .. }));
        assert_eq!(pairing.status, PairingStatus::PartiallySubmitted);
    }

    #[test]
    fn outsiders_and_closed_pairings_are_rejected() {
        let mut pairing = sample();
        let at = pairing.created_at;

        let err = pairing.record_submission(Uuid::new_v4(), at).unwrap_err();
        assert!(matches!(err, LifecycleError::NotAParticipant { .. }));

        pairing.status = PairingStatus::Flaked;
        let err = pairing.record_submission(pairing.participant_1, at).unwrap_err();
        assert!(matches!(err, LifecycleError::PairingClosed { status: PairingStatus::Flaked, .. }));
        assert!(pairing.participant_1_submitted_at.is_none());
    }

    #[test]
    fn late_submission_is_rejected() {
        let mut pairing = sample();
        let late = pairing.expires_at + Duration::seconds(1);

        let err = pairing.record_submission(pairing.participant_1, late).unwrap_err();
        assert!(matches!(err, LifecycleError::PairingExpired { .. }));
        assert_eq!(pairing.status, PairingStatus::Pending);
    }
}
