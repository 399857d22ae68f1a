use crate::application::ports::intent_writer::IntentWriter;
use crate::domain::entities::{LocalRecord, PendingOperation, RecordDraft};
use crate::domain::value_objects::{EntityKind, PendingAction, RecordId, RecordPayload};
use crate::infrastructure::offline::sqlite_pending_log::insert_operation;
use crate::infrastructure::offline::sqlite_record_store::{
    delete_record, stored_record, upsert_record,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Pool, Sqlite};

/// Writes a record and its pending operation in one transaction.
pub struct SqliteIntentWriter {
    pool: Pool<Sqlite>,
}

impl SqliteIntentWriter {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IntentWriter for SqliteIntentWriter {
    async fn save(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
    ) -> Result<(LocalRecord, PendingOperation), AppError> {
        let mut tx = self.pool.begin().await?;

        let (id, existed) = upsert_record(&mut tx, kind, draft).await?;
        let record = stored_record(&mut tx, kind, &id).await?;
        let action = if existed {
            PendingAction::Update
        } else {
            PendingAction::Insert
        };
        let operation = insert_operation(&mut tx, kind, action, record.to_remote_payload()).await?;

        tx.commit().await?;
        Ok((record, operation))
    }

    async fn delete(
        &self,
        kind: EntityKind,
        id: &RecordId,
    ) -> Result<Option<PendingOperation>, AppError> {
        let mut tx = self.pool.begin().await?;

        if !delete_record(&mut tx, kind, id).await? {
            tx.rollback().await?;
            return Ok(None);
        }
        let payload = RecordPayload::default().with_field("id", Value::String(id.to_string()));
        let operation = insert_operation(&mut tx, kind, PendingAction::Delete, payload).await?;

        tx.commit().await?;
        Ok(Some(operation))
    }
}
