use async_trait::async_trait;
use serde::Serialize;
use std::ops::AddAssign;
use tracing::{debug, warn};

use super::{PairingEvent, should_deliver};
use crate::error::NotifyError;
use crate::models::Participant;

/// Hands a single event to a single recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(
        &self,
        recipient: &Participant,
        event: &PairingEvent,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub suppressed: usize,
    pub failed: usize,
}

impl AddAssign for DeliveryReport {
    fn add_assign(&mut self, other: Self) {
        self.sent += other.sent;
        self.suppressed += other.suppressed;
        self.failed += other.failed;
    }
}

/// Delivers `event` to every recipient whose preferences allow it at `local_hour`.
/// Failures are counted, never returned.
pub async fn dispatch(
    notifier: &dyn Notifier,
    event: &PairingEvent,
    recipients: &[&Participant],
    local_hour: u8,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for recipient in recipients {
        if !should_deliver(&recipient.notification_prefs, event.kind, local_hour) {
            debug!(
                "🔕 Suppressed {:?} for {} at hour {}",
                event.kind, recipient.handle, local_hour
            );
            report.suppressed += 1;
            continue;
        }

        match notifier.deliver(recipient, event).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!(
                    "Failed to deliver {:?} for pairing {} to {}: {}",
                    event.kind, event.pairing_id, recipient.handle, e
                );
                report.failed += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{EventKind, NotificationPreferences};
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct FlakyNotifier {
        fail_for: Uuid,
        delivered: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn deliver(
            &self,
            recipient: &Participant,
            _event: &PairingEvent,
        ) -> Result<(), NotifyError> {
            if recipient.id == self.fail_for {
                return Err(NotifyError::Rejected(503));
            }
            self.delivered.lock().unwrap().push(recipient.id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn counts_sent_suppressed_and_failed() {
        let now = Utc::now();
        let ok = Participant::new("ok", "Ok", now);
        let broken = Participant::new("broken", "Broken", now);
        let mut muted = Participant::new("muted", "Muted", now);
        muted.notification_prefs = NotificationPreferences {
            created: false,
            ..Default::default()
        };

        let notifier = FlakyNotifier {
            fail_for: broken.id,
            delivered: Mutex::new(Vec::new()),
        };
        let event = PairingEvent::new(
            EventKind::Created,
            Uuid::new_v4(),
            vec![ok.id, broken.id],
            serde_json::json!({}),
        );

        let report = dispatch(&notifier, &event, &[&ok, &broken, &muted], 12).await;

        assert_eq!(report, DeliveryReport { sent: 1, suppressed: 1, failed: 1 });
        assert_eq!(*notifier.delivered.lock().unwrap(), vec![ok.id]);
    }

    #[tokio::test]
    async fn quiet_hours_suppress_everyone() {
        let now = Utc::now();
        let a = Participant::new("a", "A", now);
        let notifier = FlakyNotifier {
            fail_for: Uuid::nil(),
            delivered: Mutex::new(Vec::new()),
        };
        let event = PairingEvent::new(
            EventKind::Reminder,
            Uuid::new_v4(),
            vec![a.id],
            serde_json::json!({}),
        );

        let report = dispatch(&notifier, &event, &[&a], 23).await;
        assert_eq!(report.suppressed, 1);
        assert_eq!(report.sent, 0);
    }
}
