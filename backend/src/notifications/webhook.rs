use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use super::{Notifier, PairingEvent};
use crate::constants::NOTIFY_WEBHOOK_TIMEOUT_SECS;
use crate::error::NotifyError;
use crate::models::Participant;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    recipient: Uuid,
    handle: &'a str,
    event: &'a PairingEvent,
}

/// Posts events as JSON to the push delivery subsystem.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(NOTIFY_WEBHOOK_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, recipient: &Participant, event: &PairingEvent) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            recipient: recipient.id,
            handle: &recipient.handle,
            event,
        };

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}

/// Used when no delivery endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, recipient: &Participant, event: &PairingEvent) -> Result<(), NotifyError> {
        tracing::info!("📣 {:?} event for pairing {} -> {}", event.kind, event.pairing_id, recipient.handle);
        Ok(())
    }
}
