use crate::application::ports::{
    IdentityProvider, PendingOperationLog, RecordStore, RemoteBackend, RemoteError, RemoteRecord,
};
use crate::domain::entities::{OperationFailure, PendingOperation, SyncProgress, SyncReport};
use crate::domain::value_objects::{EntityKind, PendingAction, RecordId};
use crate::shared::error::AppError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Replays the pending operation log against the remote backend.
pub struct SyncService {
    log: Arc<dyn PendingOperationLog>,
    records: Arc<dyn RecordStore>,
    remote: Arc<dyn RemoteBackend>,
    identity: Arc<dyn IdentityProvider>,
    max_attempts: Option<u32>,
    run_guard: Arc<Mutex<()>>,
    progress: Arc<watch::Sender<SyncProgress>>,
    last_report: Arc<RwLock<Option<SyncReport>>>,
}

impl SyncService {
    pub fn new(
        log: Arc<dyn PendingOperationLog>,
        records: Arc<dyn RecordStore>,
        remote: Arc<dyn RemoteBackend>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let (progress, _) = watch::channel(SyncProgress::complete(0));
        Self {
            log,
            records,
            remote,
            identity,
            max_attempts: None,
            run_guard: Arc::new(Mutex::new(())),
            progress: Arc::new(progress),
            last_report: Arc::new(RwLock::new(None)),
        }
    }

    /// Operations failing this many times are dropped from the log.
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts.filter(|max| *max > 0);
        self
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> SyncProgress {
        *self.progress.borrow()
    }

    pub async fn last_report(&self) -> Option<SyncReport> {
        self.last_report.read().await.clone()
    }

    pub fn is_running(&self) -> bool {
        self.run_guard.try_lock().is_err()
    }

    /// Runs one pass over the operations queued at call time.
    ///
    /// Fails when nobody is signed in, when the backend rejects the session, or
    /// when local storage breaks. Other remote failures are reported per
    /// operation and leave the operation queued.
    pub async fn run(&self) -> Result<SyncReport, AppError> {
        let Ok(_guard) = self.run_guard.try_lock() else {
            debug!("Sync already running; skipping");
            return Ok(SyncReport::skipped());
        };

        let identity = self
            .identity
            .current_user()
            .await
            .ok_or(AppError::Unauthenticated)?;

        let operations = self.log.drain().await?;
        let total = operations.len();
        self.progress.send_replace(SyncProgress::new(0, total));
        info!(user = %identity.user_id, total, "Sync run started");

        let mut report = SyncReport {
            total,
            ..SyncReport::default()
        };
        let mut remaps: HashMap<(EntityKind, RecordId), String> = HashMap::new();

        for (index, mut operation) in operations.into_iter().enumerate() {
            if operation.remote_id.is_none()
                && let Some(server_id) = remaps.get(&(operation.entity, operation.record_id.clone()))
            {
                operation.remote_id = Some(server_id.clone());
            }

            match self.dispatch(&operation).await {
                Ok(row) => {
                    if let Some(server_id) = self.confirm(&operation, row).await? {
                        remaps.insert((operation.entity, operation.record_id.clone()), server_id);
                        report.remapped += 1;
                    }
                    self.log.remove(&operation.id).await?;
                    report.succeeded += 1;
                }
                Err(RemoteError::Unauthenticated) => {
                    warn!(
                        operation = %operation.id,
                        remaining = total - index,
                        "Backend rejected the session; sync run aborted"
                    );
                    self.progress.send_replace(SyncProgress::new(index, total));
                    return Err(AppError::Unauthenticated);
                }
                Err(err) => self.record_failure(&operation, err, &mut report).await?,
            }

            self.progress.send_replace(SyncProgress::new(index + 1, total));
        }

        self.progress.send_replace(SyncProgress::complete(total));
        info!(
            total,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            abandoned = report.abandoned.len(),
            "Sync run finished"
        );

        *self.last_report.write().await = Some(report.clone());
        Ok(report)
    }

    async fn dispatch(
        &self,
        operation: &PendingOperation,
    ) -> Result<Option<RemoteRecord>, RemoteError> {
        let payload = operation.remote_payload();
        match operation.action {
            PendingAction::Insert => self.remote.insert(operation.entity, &payload).await.map(Some),
            PendingAction::Update => self
                .remote
                .update(operation.entity, operation.remote_target(), &payload)
                .await
                .map(Some),
            PendingAction::Delete => self
                .remote
                .delete(operation.entity, operation.remote_target())
                .await
                .map(|_| None),
        }
    }

    /// Marks the local record confirmed and persists a remap when the backend
    /// assigned its own id. Returns the new server id in that case.
    async fn confirm(
        &self,
        operation: &PendingOperation,
        row: Option<RemoteRecord>,
    ) -> Result<Option<String>, AppError> {
        let Some(row) = row else {
            return Ok(None);
        };

        let remapped = match operation.action {
            PendingAction::Insert => returned_id(&row)
                .filter(|server_id| server_id != operation.remote_target()),
            _ => None,
        };

        if let Some(server_id) = &remapped {
            self.log
                .remap_record(operation.entity, &operation.record_id, server_id)
                .await?;
        }

        let server_id = remapped.as_deref().or(operation.remote_id.as_deref());
        self.records
            .mark_remote_confirmed(operation.entity, &operation.record_id, server_id)
            .await?;

        Ok(remapped)
    }

    async fn record_failure(
        &self,
        operation: &PendingOperation,
        error: RemoteError,
        report: &mut SyncReport,
    ) -> Result<(), AppError> {
        let message = error.to_string();
        let attempts = self.log.record_failure(&operation.id, &message).await?;
        warn!(
            operation = %operation.id,
            entity = %operation.entity,
            action = %operation.action,
            attempts,
            error = %message,
            "Pending operation failed"
        );

        let failure = OperationFailure {
            operation_id: operation.id.clone(),
            entity: operation.entity,
            action: operation.action,
            attempts,
            message,
        };

        if let Some(max_attempts) = self.max_attempts
            && attempts >= max_attempts
        {
            self.log.remove(&operation.id).await?;
            warn!(
                operation = %operation.id,
                attempts,
                "Pending operation abandoned"
            );
            report.abandoned.push(failure);
        } else {
            report.failed.push(failure);
        }
        Ok(())
    }

    /// Spawns a loop running a sync every `interval`. The first run starts
    /// immediately.
    pub fn schedule(&self, interval: Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                match service.run().await {
                    Ok(report) if report.skipped => {}
                    Ok(report) => debug!(
                        succeeded = report.succeeded,
                        failed = report.failed.len(),
                        "Scheduled sync finished"
                    ),
                    Err(e) => tracing::error!("Sync error: {}", e),
                }
            }
        })
    }
}

impl Clone for SyncService {
    fn clone(&self) -> Self {
        Self {
            log: self.log.clone(),
            records: self.records.clone(),
            remote: self.remote.clone(),
            identity: self.identity.clone(),
            max_attempts: self.max_attempts,
            run_guard: self.run_guard.clone(),
            progress: self.progress.clone(),
            last_report: self.last_report.clone(),
        }
    }
}

fn returned_id(row: &RemoteRecord) -> Option<String> {
    match row.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
