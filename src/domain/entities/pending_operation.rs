use crate::domain::value_objects::{
    EntityKind, OperationId, PendingAction, RecordId, RecordPayload,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingOperation {
    pub id: OperationId,
    pub entity: EntityKind,
    pub action: PendingAction,
    pub record_id: RecordId,
    /// Backend id once the record has been remapped.
    pub remote_id: Option<String>,
    pub payload: RecordPayload,
    /// Milliseconds since the epoch, strictly increasing across the log.
    pub enqueued_at: i64,
    pub sequence: i64,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl PendingOperation {
    /// Id to address on the backend for update/delete.
    pub fn remote_target(&self) -> &str {
        self.remote_id.as_deref().unwrap_or(self.record_id.as_str())
    }

    /// Payload with `id` rewritten to the backend id when remapped.
    pub fn remote_payload(&self) -> RecordPayload {
        match &self.remote_id {
            Some(remote_id) => self
                .payload
                .clone()
                .with_field("id", serde_json::Value::String(remote_id.clone())),
            None => self.payload.clone(),
        }
    }

    pub fn enqueued_at_utc(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.enqueued_at).unwrap_or_else(Utc::now)
    }
}
