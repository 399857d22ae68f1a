use crate::domain::entities::{LocalRecord, PendingOperation, RecordDraft};
use crate::domain::value_objects::{EntityKind, RecordId};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Local writes paired with their pending operation. Either both land or
/// neither does.
#[async_trait]
pub trait IntentWriter: Send + Sync {
    /// Upserts the record and queues an insert, or an update when the id is
    /// already stored.
    async fn save(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
    ) -> Result<(LocalRecord, PendingOperation), AppError>;
    /// Removes the record and queues a delete. `None` when nothing was stored.
    async fn delete(
        &self,
        kind: EntityKind,
        id: &RecordId,
    ) -> Result<Option<PendingOperation>, AppError>;
}
