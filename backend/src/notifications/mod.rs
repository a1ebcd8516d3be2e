//! Notification trigger contract.
//!
//! The core emits lifecycle events; whether and how a recipient is reached is
//! decided here from their preferences and quiet hours, then handed to a
//! [`Notifier`]. Delivery is best-effort and never affects pairing state.

pub mod dispatch;
pub mod events;
pub mod preferences;
pub mod webhook;

pub use dispatch::{DeliveryReport, Notifier, dispatch};
pub use events::{EventKind, PairingEvent};
pub use preferences::{NotificationPreferences, QuietHours, should_deliver};
pub use webhook::{LogNotifier, WebhookNotifier};

use std::sync::Arc;

use crate::error::NotifyError;
use crate::utils::Config;

/// Webhook delivery when an endpoint is configured, logging otherwise.
pub fn notifier_from_config(config: &Config) -> Result<Arc<dyn Notifier>, NotifyError> {
    match &config.notify_webhook_url {
        Some(url) => Ok(Arc::new(WebhookNotifier::new(url.clone())?)),
        None => {
            tracing::warn!("NOTIFY_WEBHOOK_URL not set, notifications will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}
