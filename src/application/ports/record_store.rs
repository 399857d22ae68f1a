use crate::domain::entities::{LocalRecord, RecordDraft};
use crate::domain::value_objects::{EntityKind, OwnerId, RecordId};
use crate::shared::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Upserts by local id and returns the stored record with its metadata.
    async fn put(&self, kind: EntityKind, draft: RecordDraft) -> Result<LocalRecord, AppError>;
    /// Snapshot of every record of `kind`, optionally for a single owner.
    async fn get_all(
        &self,
        kind: EntityKind,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<LocalRecord>, AppError>;
    async fn get_by_id(
        &self,
        kind: EntityKind,
        id: &RecordId,
    ) -> Result<Option<LocalRecord>, AppError>;
    /// Records whose date key lies in `[from, to]`.
    async fn get_by_date_range(
        &self,
        kind: EntityKind,
        owner: Option<&OwnerId>,
        from: &str,
        to: &str,
    ) -> Result<Vec<LocalRecord>, AppError>;
    async fn get_unsynced(&self, kind: EntityKind) -> Result<Vec<LocalRecord>, AppError>;
    async fn mark_synced(&self, kind: EntityKind, id: &RecordId) -> Result<(), AppError>;
    async fn mark_remote_confirmed(
        &self,
        kind: EntityKind,
        id: &RecordId,
        server_id: Option<&str>,
    ) -> Result<(), AppError>;
    /// Idempotent.
    async fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<(), AppError>;
    async fn count(&self, kind: EntityKind) -> Result<u64, AppError>;
    /// Wipes every entity kind and the pending operation log.
    async fn clear_all(&self) -> Result<(), AppError>;
}
