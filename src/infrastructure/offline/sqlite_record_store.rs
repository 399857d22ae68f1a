use crate::application::ports::record_store::RecordStore;
use crate::domain::entities::{LocalRecord, RecordDraft, record_date_for};
use crate::domain::value_objects::{EntityKind, OwnerId, RecordId};
use crate::infrastructure::offline::mappers::{domain_record_from_row, timestamp_to_datetime};
use crate::infrastructure::offline::rows::RecordRow;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::{debug, info};

/// Record store backed by one SQLite table per entity kind.
pub struct SqliteRecordStore {
    pool: Pool<Sqlite>,
}

impl SqliteRecordStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    async fn fetch_rows(
        &self,
        kind: EntityKind,
        sql: &str,
        owner: Option<&OwnerId>,
        binds: &[&str],
    ) -> Result<Vec<LocalRecord>, AppError> {
        let mut query = sqlx::query_as::<_, RecordRow>(sql);
        if let Some(owner) = owner {
            query = query.bind(owner.as_str().to_string());
        }
        for value in binds {
            query = query.bind(value.to_string());
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|row| domain_record_from_row(kind, row))
            .collect()
    }
}

/// The anonymous owner never narrows a listing.
fn owner_filter(owner: Option<&OwnerId>) -> Option<&OwnerId> {
    owner.filter(|owner| !owner.is_anonymous())
}

/// Upserts on `conn`; returns the id and whether the record already existed.
pub(crate) async fn upsert_record(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    draft: RecordDraft,
) -> Result<(RecordId, bool), AppError> {
    let table = kind.table_name();
    let id = draft.id.unwrap_or_else(RecordId::generate);
    let owner = draft.owner.unwrap_or_default();
    let now = Utc::now().timestamp_millis();

    let existing_created_at: Option<i64> = sqlx::query(&format!(
        "SELECT created_at FROM {table} WHERE local_id = ?1"
    ))
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?
    .map(|row| row.try_get::<i64, _>("created_at"))
    .transpose()?;

    let created_at = existing_created_at.unwrap_or(now);
    let record_date = record_date_for(kind, &draft.fields, timestamp_to_datetime(created_at));
    let data = draft.fields.to_json_string()?;

    sqlx::query(&format!(
        r#"
        INSERT INTO {table} (
            local_id, owner_id, record_date, data,
            synced, remote_confirmed, server_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, 0, 0, NULL, ?5, ?6)
        ON CONFLICT(local_id) DO UPDATE SET
            owner_id = excluded.owner_id,
            record_date = excluded.record_date,
            data = excluded.data,
            synced = 0,
            remote_confirmed = 0,
            updated_at = excluded.updated_at
        "#
    ))
    .bind(id.as_str())
    .bind(owner.as_str())
    .bind(&record_date)
    .bind(&data)
    .bind(created_at)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    debug!(entity = %kind, id = %id, "Record stored locally");
    Ok((id, existing_created_at.is_some()))
}

/// Reads back a record written on the same connection.
pub(crate) async fn stored_record(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: &RecordId,
) -> Result<LocalRecord, AppError> {
    let table = kind.table_name();
    let row = sqlx::query_as::<_, RecordRow>(&format!(
        "SELECT * FROM {table} WHERE local_id = ?1"
    ))
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::Storage(format!("{kind} record {id} missing right after write")))?;

    domain_record_from_row(kind, row)
}

/// Returns false when no row matched.
pub(crate) async fn delete_record(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: &RecordId,
) -> Result<bool, AppError> {
    let table = kind.table_name();
    let deleted = sqlx::query(&format!("DELETE FROM {table} WHERE local_id = ?1"))
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    Ok(deleted > 0)
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn put(&self, kind: EntityKind, draft: RecordDraft) -> Result<LocalRecord, AppError> {
        let mut conn = self.pool.acquire().await?;
        let (id, _) = upsert_record(&mut conn, kind, draft).await?;
        stored_record(&mut conn, kind, &id).await
    }

    async fn get_all(
        &self,
        kind: EntityKind,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<LocalRecord>, AppError> {
        let table = kind.table_name();
        let owner = owner_filter(owner);
        let sql = match owner {
            Some(_) => format!(
                "SELECT * FROM {table} WHERE owner_id = ?1 ORDER BY record_date DESC"
            ),
            None => format!("SELECT * FROM {table} ORDER BY record_date DESC"),
        };
        self.fetch_rows(kind, &sql, owner, &[]).await
    }

    async fn get_by_id(
        &self,
        kind: EntityKind,
        id: &RecordId,
    ) -> Result<Option<LocalRecord>, AppError> {
        let table = kind.table_name();
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            "SELECT * FROM {table} WHERE local_id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| domain_record_from_row(kind, row)).transpose()
    }

    async fn get_by_date_range(
        &self,
        kind: EntityKind,
        owner: Option<&OwnerId>,
        from: &str,
        to: &str,
    ) -> Result<Vec<LocalRecord>, AppError> {
        let table = kind.table_name();
        let owner = owner_filter(owner);
        let sql = match owner {
            Some(_) => format!(
                r#"
                SELECT * FROM {table}
                WHERE owner_id = ?1 AND record_date >= ?2 AND record_date <= ?3
                ORDER BY record_date DESC
                "#
            ),
            None => format!(
                r#"
                SELECT * FROM {table}
                WHERE record_date >= ?1 AND record_date <= ?2
                ORDER BY record_date DESC
                "#
            ),
        };
        self.fetch_rows(kind, &sql, owner, &[from, to]).await
    }

    async fn get_unsynced(&self, kind: EntityKind) -> Result<Vec<LocalRecord>, AppError> {
        let table = kind.table_name();
        let sql = format!("SELECT * FROM {table} WHERE synced = 0 ORDER BY created_at ASC");
        self.fetch_rows(kind, &sql, None, &[]).await
    }

    async fn mark_synced(&self, kind: EntityKind, id: &RecordId) -> Result<(), AppError> {
        let table = kind.table_name();
        sqlx::query(&format!("UPDATE {table} SET synced = 1 WHERE local_id = ?1"))
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_remote_confirmed(
        &self,
        kind: EntityKind,
        id: &RecordId,
        server_id: Option<&str>,
    ) -> Result<(), AppError> {
        let table = kind.table_name();
        sqlx::query(&format!(
            r#"
            UPDATE {table}
            SET remote_confirmed = 1, server_id = COALESCE(?1, server_id)
            WHERE local_id = ?2
            "#
        ))
        .bind(server_id)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        delete_record(&mut conn, kind, id).await?;
        Ok(())
    }

    async fn count(&self, kind: EntityKind) -> Result<u64, AppError> {
        let table = kind.table_name();
        let row = sqlx::query(&format!("SELECT COUNT(*) as count FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn clear_all(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for kind in EntityKind::ALL {
            sqlx::query(&format!("DELETE FROM {}", kind.table_name()))
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("DELETE FROM pending_operations")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM record_id_remaps")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Local store cleared");
        Ok(())
    }
}
