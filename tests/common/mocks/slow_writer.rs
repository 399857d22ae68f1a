use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use stoic_offline::AppError;
use stoic_offline::application::ports::IntentWriter;
use stoic_offline::domain::entities::{LocalRecord, PendingOperation, RecordDraft};
use stoic_offline::domain::value_objects::{EntityKind, RecordId};

/// Delegates to a real writer, then stalls before reporting back.
pub struct SlowIntentWriter {
    inner: Arc<dyn IntentWriter>,
    delay: Duration,
}

impl SlowIntentWriter {
    pub fn new(inner: Arc<dyn IntentWriter>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl IntentWriter for SlowIntentWriter {
    async fn save(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
    ) -> Result<(LocalRecord, PendingOperation), AppError> {
        let saved = self.inner.save(kind, draft).await;
        tokio::time::sleep(self.delay).await;
        saved
    }

    async fn delete(
        &self,
        kind: EntityKind,
        id: &RecordId,
    ) -> Result<Option<PendingOperation>, AppError> {
        let deleted = self.inner.delete(kind, id).await;
        tokio::time::sleep(self.delay).await;
        deleted
    }
}
