use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::notifications::NotificationPreferences;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub handle: String,
    pub display_name: String,
    pub active: bool,
    pub last_active: DateTime<Utc>,
    /// Mutual social links.
    pub connections: Vec<Uuid>,
    /// Participants this one refuses to be paired with.
    pub blocked_ids: Vec<Uuid>,
    pub consecutive_failure_streak: i32,
    pub max_consecutive_failure_streak: i32,
    /// Lifetime count of flaked pairings.
    pub total_flakes: i32,
    pub waitlisted_today: bool,
    pub priority_next_run: bool,
    pub waitlisted_at: Option<DateTime<Utc>>,
    pub is_placeholder: bool,
    #[sqlx(json)]
    pub notification_prefs: NotificationPreferences,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// A fresh participant with zeroed streaks and default preferences.
    pub fn new(handle: impl Into<String>, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            handle: handle.into(),
            display_name: display_name.into(),
            active: true,
            last_active: now,
            connections: Vec::new(),
            blocked_ids: Vec::new(),
            consecutive_failure_streak: 0,
            max_consecutive_failure_streak: 0,
            total_flakes: 0,
            waitlisted_today: false,
            priority_next_run: false,
            waitlisted_at: None,
            is_placeholder: false,
            notification_prefs: NotificationPreferences::default(),
            created_at: now,
        }
    }

    /// Blocking is mutual: either side listing the other excludes the pair.
    pub fn is_blocked_with(&self, other: &Participant) -> bool {
        self.blocked_ids.contains(&other.id) || other.blocked_ids.contains(&self.id)
    }
}
