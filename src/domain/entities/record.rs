use crate::domain::value_objects::{EntityKind, OwnerId, RecordId, RecordPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record as handed to the store; id and owner are filled in when absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    pub id: Option<RecordId>,
    pub owner: Option<OwnerId>,
    pub fields: RecordPayload,
}

impl RecordDraft {
    pub fn new(fields: RecordPayload) -> Self {
        Self {
            id: None,
            owner: None,
            fields,
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalRecord {
    pub id: RecordId,
    pub kind: EntityKind,
    pub owner: OwnerId,
    pub fields: RecordPayload,
    pub record_date: String,
    /// Optimistic flag, set once the write is locally durable.
    pub synced: bool,
    /// Set only after the backend confirmed an insert or update.
    pub remote_confirmed: bool,
    /// Backend primary key when it differs from `id`.
    pub server_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalRecord {
    /// Identifier the backend knows this record by.
    pub fn remote_id(&self) -> &str {
        self.server_id.as_deref().unwrap_or(self.id.as_str())
    }

    /// Fields sent to the backend: entity fields plus `id` and `user_id`.
    pub fn to_remote_payload(&self) -> RecordPayload {
        self.fields
            .clone()
            .with_field("id", Value::String(self.id.to_string()))
            .with_field("user_id", Value::String(self.owner.to_string()))
    }
}

/// Date key for the by-date index, falling back to the creation time.
pub fn record_date_for(
    kind: EntityKind,
    fields: &RecordPayload,
    created_at: DateTime<Utc>,
) -> String {
    fields
        .get_str(kind.date_field())
        .map(str::to_string)
        .unwrap_or_else(|| created_at.to_rfc3339())
}
