use crate::application::ports::pending_log::PendingOperationLog;
use crate::domain::entities::PendingOperation;
use crate::domain::value_objects::{
    EntityKind, OperationId, PendingAction, RecordId, RecordPayload,
};
use crate::infrastructure::offline::mappers::{
    domain_operation_from_row, record_id_from_payload, try_i64_to_u32,
};
use crate::infrastructure::offline::rows::PendingOperationRow;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::{debug, info};

const PENDING_CLOCK_KEY: &str = "pending_clock";

/// Durable FIFO of mutation intents.
pub struct SqlitePendingLog {
    pool: Pool<Sqlite>,
}

impl SqlitePendingLog {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

/// Queues an operation on `conn`; the caller owns the surrounding transaction.
pub(crate) async fn insert_operation(
    conn: &mut SqliteConnection,
    entity: EntityKind,
    action: PendingAction,
    payload: RecordPayload,
) -> Result<PendingOperation, AppError> {
    let record_id = record_id_from_payload(&payload)?;
    let operation_id = OperationId::generate();
    let serialized = payload.to_json_string()?;
    let now = Utc::now().timestamp_millis();

    // Persisted clock: max(now, last + 1), strictly increasing across removals,
    // clears and wall-clock regressions.
    let enqueued_at: i64 = sqlx::query(
        r#"
        INSERT INTO sync_meta (key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = MAX(excluded.value, sync_meta.value + 1)
        RETURNING value
        "#,
    )
    .bind(PENDING_CLOCK_KEY)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?
    .try_get("value")?;

    let remote_id: Option<String> = sqlx::query(
        "SELECT server_id FROM record_id_remaps WHERE entity = ?1 AND local_id = ?2",
    )
    .bind(entity.as_str())
    .bind(record_id.as_str())
    .fetch_optional(&mut *conn)
    .await?
    .map(|row| row.try_get::<String, _>("server_id"))
    .transpose()?;

    let sequence: i64 = sqlx::query(
        r#"
        INSERT INTO pending_operations (
            operation_id, entity, action, record_id, remote_id, payload, enqueued_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING sequence
        "#,
    )
    .bind(operation_id.as_str())
    .bind(entity.as_str())
    .bind(action.as_str())
    .bind(record_id.as_str())
    .bind(&remote_id)
    .bind(&serialized)
    .bind(enqueued_at)
    .fetch_one(&mut *conn)
    .await?
    .try_get("sequence")?;

    debug!(
        operation = %operation_id,
        entity = %entity,
        action = %action,
        record = %record_id,
        "Pending operation enqueued"
    );

    Ok(PendingOperation {
        id: operation_id,
        entity,
        action,
        record_id,
        remote_id,
        payload,
        enqueued_at,
        sequence,
        attempts: 0,
        last_error: None,
    })
}

#[async_trait]
impl PendingOperationLog for SqlitePendingLog {
    async fn enqueue(
        &self,
        entity: EntityKind,
        action: PendingAction,
        payload: RecordPayload,
    ) -> Result<PendingOperation, AppError> {
        let mut tx = self.pool.begin().await?;
        let operation = insert_operation(&mut tx, entity, action, payload).await?;
        tx.commit().await?;
        Ok(operation)
    }

    async fn drain(&self) -> Result<Vec<PendingOperation>, AppError> {
        let rows = sqlx::query_as::<_, PendingOperationRow>(
            r#"
            SELECT * FROM pending_operations
            ORDER BY enqueued_at ASC, sequence ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(domain_operation_from_row).collect()
    }

    async fn remove(&self, operation_id: &OperationId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM pending_operations WHERE operation_id = ?1")
            .bind(operation_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_failure(
        &self,
        operation_id: &OperationId,
        message: &str,
    ) -> Result<u32, AppError> {
        let row = sqlx::query(
            r#"
            UPDATE pending_operations
            SET attempts = attempts + 1, last_error = ?1
            WHERE operation_id = ?2
            RETURNING attempts
            "#,
        )
        .bind(message)
        .bind(operation_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => try_i64_to_u32(row.try_get("attempts")?, "attempts"),
            None => Ok(0),
        }
    }

    async fn remap_record(
        &self,
        entity: EntityKind,
        local_id: &RecordId,
        server_id: &str,
    ) -> Result<(), AppError> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO record_id_remaps (entity, local_id, server_id, remapped_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(entity, local_id) DO UPDATE SET
                server_id = excluded.server_id,
                remapped_at = excluded.remapped_at
            "#,
        )
        .bind(entity.as_str())
        .bind(local_id.as_str())
        .bind(server_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let rewritten = sqlx::query(
            "UPDATE pending_operations SET remote_id = ?1 WHERE entity = ?2 AND record_id = ?3",
        )
        .bind(server_id)
        .bind(entity.as_str())
        .bind(local_id.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        info!(
            entity = %entity,
            local_id = %local_id,
            server_id,
            rewritten,
            "Record remapped to server id"
        );
        Ok(())
    }

    async fn len(&self) -> Result<u64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM pending_operations")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }
}
