// =============================================================================
// Duo Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// SCHEDULING
// =============================================================================

/// Time zone all daily boundaries are computed in
pub const DEFAULT_MATCH_TIMEZONE: &str = "America/New_York";

/// Local time at which a day's pairings expire (HH:MM)
pub const DEFAULT_PAIRING_EXPIRY_TIME: &str = "23:59";

/// Local time the daily matching run fires (HH:MM)
pub const DEFAULT_MATCH_RUN_TIME: &str = "12:00";

/// Local time the flake sweep fires (HH:MM), the morning after the matching day
pub const DEFAULT_FLAKE_SWEEP_TIME: &str = "00:05";

/// Local time the reminder pass fires (HH:MM)
pub const DEFAULT_REMINDER_TIME: &str = "20:00";

// =============================================================================
// MATCHING
// =============================================================================

/// Trailing window (days) of pairing history used to avoid repeats
pub const DEFAULT_HISTORY_WINDOW_DAYS: i64 = 7;

/// A participant must have been active within this many days to be matched
pub const DEFAULT_ACTIVITY_RECENCY_DAYS: i64 = 3;

/// Participants whose consecutive failure streak reaches this are suspended
pub const DEFAULT_MAX_FAILURE_STREAK: i32 = 5;

// =============================================================================
// FALLBACK PROVISIONING
// =============================================================================

/// Reserved handle namespace for synthesized placeholder participants
pub const PLACEHOLDER_HANDLE_PREFIX: &str = "duo_buddy_";

/// Display name given to placeholder participants
pub const PLACEHOLDER_DISPLAY_NAME: &str = "Duo Buddy";

/// Maximum placeholder creation attempts before giving up on name collisions
pub const MAX_PLACEHOLDER_ATTEMPTS: u32 = 5;

/// Length of the random suffix in a meeting reference
pub const MEETING_REF_SUFFIX_LEN: usize = 8;

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Default quiet hours start (local hour of day)
pub const DEFAULT_QUIET_HOURS_START: u8 = 22;

/// Default quiet hours end (local hour of day)
pub const DEFAULT_QUIET_HOURS_END: u8 = 8;

/// Timeout for a single webhook delivery
pub const NOTIFY_WEBHOOK_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default server port if not specified in environment
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default database pool size
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Builds the placeholder handle for a sequence number
pub fn placeholder_handle(sequence: u32) -> String {
    format!("{}{}", PLACEHOLDER_HANDLE_PREFIX, sequence)
}
