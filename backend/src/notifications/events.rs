use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Reminder,
    Completed,
    Social,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairingEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub pairing_id: Uuid,
    pub participants: Vec<Uuid>,
    pub payload: Value,
}

impl PairingEvent {
    pub fn new(kind: EventKind, pairing_id: Uuid, participants: Vec<Uuid>, payload: Value) -> Self {
        Self {
            kind,
            pairing_id,
            participants,
            payload,
        }
    }
}
