//! Pairing lifecycle: creation, submission, flake sweep, fallback provisioning.
//!
//! ```text
//! pending --(one side submits)--> partially_submitted --(other side)--> completed
//! pending | partially_submitted --(sweep, past expiry)--> flaked
//! ```

pub mod completion;
pub mod creation;
pub mod fallback;
pub mod jobs;
pub mod reminders;
pub mod sweep;

pub use completion::{SubmissionOutcome, submit_photo};
pub use creation::build_match_batch;
pub use fallback::{ProvisionedPartner, provision_partner};
pub use jobs::{MatchRunReport, ReminderReport, SweepReport, run_daily_match, run_flake_sweep, run_reminders};
pub use reminders::reminder_targets;
pub use sweep::{SweepPlan, plan_sweep};
