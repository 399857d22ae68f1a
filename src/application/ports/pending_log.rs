use crate::domain::entities::PendingOperation;
use crate::domain::value_objects::{
    EntityKind, OperationId, PendingAction, RecordId, RecordPayload,
};
use crate::shared::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait PendingOperationLog: Send + Sync {
    /// Appends an operation; the payload must carry the record `id`.
    async fn enqueue(
        &self,
        entity: EntityKind,
        action: PendingAction,
        payload: RecordPayload,
    ) -> Result<PendingOperation, AppError>;
    /// Every queued operation in enqueue order. Nothing is removed.
    async fn drain(&self) -> Result<Vec<PendingOperation>, AppError>;
    /// Idempotent.
    async fn remove(&self, operation_id: &OperationId) -> Result<(), AppError>;
    /// Returns the new attempt count, or 0 when the operation is gone.
    async fn record_failure(
        &self,
        operation_id: &OperationId,
        message: &str,
    ) -> Result<u32, AppError>;
    /// Points every queued and future operation for the record at `server_id`.
    async fn remap_record(
        &self,
        entity: EntityKind,
        local_id: &RecordId,
        server_id: &str,
    ) -> Result<(), AppError>;
    async fn len(&self) -> Result<u64, AppError>;

    async fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.len().await? == 0)
    }
}
