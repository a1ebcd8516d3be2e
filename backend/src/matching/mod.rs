pub mod eligibility;
pub mod engine;
pub mod history;

pub use eligibility::{EligibilityCriteria, filter_eligible};
pub use engine::{MatchKind, MatchOutcome, MatchedPair, match_participants};
pub use history::{HistoryIndex, HistoryRecord};

use chrono::{DateTime, Duration, Utc};

use crate::constants::{DEFAULT_ACTIVITY_RECENCY_DAYS, DEFAULT_HISTORY_WINDOW_DAYS, DEFAULT_MAX_FAILURE_STREAK};

/// Windows and thresholds for one matching run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSettings {
    pub history_window_days: i64,
    pub activity_recency_days: i64,
    pub max_failure_streak: i32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            history_window_days: DEFAULT_HISTORY_WINDOW_DAYS,
            activity_recency_days: DEFAULT_ACTIVITY_RECENCY_DAYS,
            max_failure_streak: DEFAULT_MAX_FAILURE_STREAK,
        }
    }
}

impl MatchSettings {
    pub fn criteria(&self, now: DateTime<Utc>) -> EligibilityCriteria {
        EligibilityCriteria {
            active_since: now - Duration::days(self.activity_recency_days),
            max_failure_streak: self.max_failure_streak,
        }
    }

    pub fn history_since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.history_window_days)
    }
}
