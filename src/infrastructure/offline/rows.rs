use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecordRow {
    pub local_id: String,
    pub owner_id: String,
    pub record_date: String,
    pub data: String,
    pub synced: bool,
    pub remote_confirmed: bool,
    pub server_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingOperationRow {
    pub sequence: i64,
    pub operation_id: String,
    pub entity: String,
    pub action: String,
    pub record_id: String,
    pub remote_id: Option<String>,
    pub payload: String,
    pub enqueued_at: i64,
    pub attempts: i64,
    pub last_error: Option<String>,
}
