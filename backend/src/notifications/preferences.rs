use serde::{Deserialize, Serialize};

use super::EventKind;
use crate::constants::{DEFAULT_QUIET_HOURS_END, DEFAULT_QUIET_HOURS_START};

/// Local hours `[start, end)` during which nothing is delivered.
/// `start > end` wraps past midnight; `start == end` is an empty interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: u8,
    pub end: u8,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            start: DEFAULT_QUIET_HOURS_START,
            end: DEFAULT_QUIET_HOURS_END,
        }
    }
}

impl QuietHours {
    pub fn contains(&self, hour: u8) -> bool {
        if self.start <= self.end {
            hour >= self.start && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub created: bool,
    pub reminder: bool,
    pub completed: bool,
    pub social: bool,
    pub quiet_hours: QuietHours,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            created: true,
            reminder: true,
            completed: true,
            social: true,
            quiet_hours: QuietHours::default(),
        }
    }
}

impl NotificationPreferences {
    pub fn allows(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Created => self.created,
            EventKind::Reminder => self.reminder,
            EventKind::Completed => self.completed,
            EventKind::Social => self.social,
        }
    }
}

/// Suppressed when the category is switched off or the local hour is quiet.
pub fn should_deliver(prefs: &NotificationPreferences, kind: EventKind, local_hour: u8) -> bool {
    prefs.allows(kind) && !prefs.quiet_hours.contains(local_hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_wrapping_interval_is_half_open() {
        let quiet = QuietHours { start: 13, end: 15 };
        assert!(!quiet.contains(12));
        assert!(quiet.contains(13));
        assert!(quiet.contains(14));
        assert!(!quiet.contains(15));
    }

    #[test]
    fn wrapping_interval_spans_midnight() {
        let quiet = QuietHours { start: 22, end: 8 };
        for hour in [22, 23, 0, 3, 7] {
            assert!(quiet.contains(hour), "hour {hour} should be quiet");
        }
        for hour in [8, 12, 21] {
            assert!(!quiet.contains(hour), "hour {hour} should not be quiet");
        }
    }

    #[test]
    fn equal_bounds_never_quiet() {
        let quiet = QuietHours { start: 9, end: 9 };
        assert!((0..24).all(|h| !quiet.contains(h)));
    }

    #[test]
    fn disabled_category_is_suppressed() {
        let prefs = NotificationPreferences {
            reminder: false,
            ..Default::default()
        };
        assert!(!should_deliver(&prefs, EventKind::Reminder, 12));
        assert!(should_deliver(&prefs, EventKind::Created, 12));
        assert!(!should_deliver(&prefs, EventKind::Created, 23));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let prefs: NotificationPreferences = serde_json::from_str(r#"{"social": false}"#).unwrap();
        assert!(!prefs.social);
        assert!(prefs.created);
        assert_eq!(prefs.quiet_hours, QuietHours::default());
    }
}
