use crate::application::ports::{IdentityProvider, IntentWriter, PendingOperationLog, RecordStore};
use crate::domain::entities::{LocalRecord, PendingOperation, RecordDraft};
use crate::domain::value_objects::{EntityKind, OwnerId, RecordId};
use crate::shared::error::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityCount {
    pub entity: EntityKind,
    pub records: u64,
    pub unsynced: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfflineStatus {
    pub entities: Vec<EntityCount>,
    pub pending_operations: u64,
}

/// Explicit edit path: every local write is paired with a queued intent.
pub struct OfflineService {
    records: Arc<dyn RecordStore>,
    log: Arc<dyn PendingOperationLog>,
    writer: Arc<dyn IntentWriter>,
    identity: Arc<dyn IdentityProvider>,
}

impl OfflineService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        log: Arc<dyn PendingOperationLog>,
        writer: Arc<dyn IntentWriter>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            records,
            log,
            writer,
            identity,
        }
    }

    /// Stores the record locally and queues an insert, or an update when a
    /// record with the same id already exists.
    pub async fn save_record(
        &self,
        kind: EntityKind,
        mut draft: RecordDraft,
    ) -> Result<(LocalRecord, PendingOperation), AppError> {
        if draft.owner.is_none() {
            draft.owner = self.identity.current_user().await.map(|user| user.user_id);
        }

        let (record, operation) = self.writer.save(kind, draft).await?;

        info!(
            entity = %kind,
            id = %record.id,
            action = %operation.action,
            operation = %operation.id,
            "Record saved offline"
        );
        Ok((record, operation))
    }

    /// Autosave commit: save, then flag the record as optimistically synced.
    pub async fn commit_snapshot(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
    ) -> Result<LocalRecord, AppError> {
        let (mut record, _) = self.save_record(kind, draft).await?;
        self.records.mark_synced(kind, &record.id).await?;
        record.synced = true;
        Ok(record)
    }

    /// Removes the record locally and queues a remote delete. Deleting a
    /// record that is not stored locally queues nothing.
    pub async fn delete_record(
        &self,
        kind: EntityKind,
        id: &RecordId,
    ) -> Result<Option<PendingOperation>, AppError> {
        let Some(operation) = self.writer.delete(kind, id).await? else {
            debug!(entity = %kind, id = %id, "Delete of unknown record ignored");
            return Ok(None);
        };

        info!(entity = %kind, id = %id, operation = %operation.id, "Record deleted offline");
        Ok(Some(operation))
    }

    pub async fn get(
        &self,
        kind: EntityKind,
        id: &RecordId,
    ) -> Result<Option<LocalRecord>, AppError> {
        self.records.get_by_id(kind, id).await
    }

    pub async fn list(
        &self,
        kind: EntityKind,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<LocalRecord>, AppError> {
        self.records.get_all(kind, owner).await
    }

    pub async fn pending_operations(&self) -> Result<Vec<PendingOperation>, AppError> {
        self.log.drain().await
    }

    pub async fn status(&self) -> Result<OfflineStatus, AppError> {
        let mut entities = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            let records = self.records.count(kind).await?;
            let unsynced = self.records.get_unsynced(kind).await?.len() as u64;
            entities.push(EntityCount {
                entity: kind,
                records,
                unsynced,
            });
        }

        Ok(OfflineStatus {
            entities,
            pending_operations: self.log.len().await?,
        })
    }

    /// Irreversible; callers must confirm with the user first.
    pub async fn clear_all(&self) -> Result<(), AppError> {
        self.records.clear_all().await
    }
}
