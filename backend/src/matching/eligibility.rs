use chrono::{DateTime, Utc};

use crate::models::Participant;

/// Who may enter a matching run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityCriteria {
    pub active_since: DateTime<Utc>,
    /// Streaks at or above this ceiling are suspended.
    pub max_failure_streak: i32,
}

impl EligibilityCriteria {
    pub fn admits(&self, participant: &Participant) -> bool {
        participant.active
            && participant.last_active >= self.active_since
            && participant.consecutive_failure_streak < self.max_failure_streak
    }
}

/// Keeps admitted participants in their original order.
pub fn filter_eligible(participants: Vec<Participant>, criteria: &EligibilityCriteria) -> Vec<Participant> {
    participants.into_iter().filter(|p| criteria.admits(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn applies_all_three_rules() {
        let now = Utc::now();
        let criteria = EligibilityCriteria {
            active_since: now - Duration::days(3),
            max_failure_streak: 5,
        };

        let fresh = Participant::new("fresh", "Fresh", now);

        let mut inactive = Participant::new("inactive", "Inactive", now);
        inactive.active = false;

        let mut stale = Participant::new("stale", "Stale", now);
        stale.last_active = now - Duration::days(4);

        let mut suspended = Participant::new("suspended", "Suspended", now);
        suspended.consecutive_failure_streak = 5;

        let mut borderline = Participant::new("borderline", "Borderline", now);
        borderline.consecutive_failure_streak = 4;
        borderline.last_active = now - Duration::days(3);

        let kept = filter_eligible(
            vec![fresh.clone(), inactive, stale, suspended, borderline.clone()],
            &criteria,
        );
        assert_eq!(kept, vec![fresh, borderline]);
    }
}
