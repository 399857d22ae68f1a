use crate::application::services::offline_service::OfflineService;
use crate::domain::entities::{LocalRecord, RecordDraft};
use crate::domain::value_objects::{EntityKind, RecordId, RecordPayload};
use crate::shared::config::AutosaveConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

/// Where settled snapshots end up.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn commit_snapshot(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
    ) -> Result<LocalRecord, AppError>;
}

#[async_trait]
impl SnapshotSink for OfflineService {
    async fn commit_snapshot(
        &self,
        kind: EntityKind,
        draft: RecordDraft,
    ) -> Result<LocalRecord, AppError> {
        OfflineService::commit_snapshot(self, kind, draft).await
    }
}

#[async_trait]
pub trait AutosaveListener: Send + Sync {
    /// An error here turns the commit into a failure.
    async fn on_saved(&self, _record: &LocalRecord) -> Result<(), AppError> {
        Ok(())
    }

    async fn on_error(&self, _error: &AppError) {}
}

pub struct NoopListener;

impl AutosaveListener for NoopListener {}

enum Command {
    Edit {
        snapshot: RecordPayload,
        deadline: Instant,
    },
    CommitNow {
        snapshot: RecordPayload,
        reply: oneshot::Sender<Result<LocalRecord, AppError>>,
    },
}

/// Debounced write path for a single edited record.
///
/// Each `edit` restarts the quiet period; only the last snapshot is committed.
/// Dropping the scheduler discards a pending snapshot without flushing it, but a
/// commit that is already running is allowed to finish.
pub struct AutosaveScheduler {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
    quiet_period: Duration,
    enabled: bool,
    task: JoinHandle<()>,
}

impl AutosaveScheduler {
    pub fn spawn(
        sink: Arc<dyn SnapshotSink>,
        kind: EntityKind,
        record_id: Option<RecordId>,
        config: &AutosaveConfig,
        listener: Arc<dyn AutosaveListener>,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::Idle);

        let worker = Worker {
            sink,
            kind,
            record_id,
            listener,
            status: status_tx,
        };
        let task = tokio::spawn(worker.run(receiver));

        Self {
            commands,
            status,
            quiet_period: config.quiet_period(),
            enabled: config.enabled,
            task,
        }
    }

    /// Records a new snapshot and restarts the quiet period.
    pub fn edit(&self, snapshot: RecordPayload) {
        if !self.enabled {
            return;
        }
        let deadline = Instant::now() + self.quiet_period;
        if self.commands.send(Command::Edit { snapshot, deadline }).is_err() {
            warn!("Autosave worker is gone; edit dropped");
        }
    }

    /// Commits `snapshot` right away, discarding any pending one.
    pub async fn commit_now(&self, snapshot: RecordPayload) -> Result<LocalRecord, AppError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::CommitNow { snapshot, reply })
            .map_err(|_| AppError::Internal("autosave worker stopped".into()))?;
        response
            .await
            .map_err(|_| AppError::Internal("autosave worker dropped the commit".into()))?
    }

    pub fn status(&self) -> SaveStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Closes the command channel and waits for an in-flight commit to land.
    pub async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(err) = task.await {
            warn!(error = %err, "Autosave worker ended abnormally");
        }
    }
}

struct Worker {
    sink: Arc<dyn SnapshotSink>,
    kind: EntityKind,
    record_id: Option<RecordId>,
    listener: Arc<dyn AutosaveListener>,
    status: watch::Sender<SaveStatus>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut pending: Option<(RecordPayload, Instant)> = None;

        loop {
            let deadline = pending.as_ref().map(|(_, deadline)| *deadline);
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Edit { snapshot, deadline }) => {
                        self.status.send_if_modified(|status| {
                            let changed = *status != SaveStatus::Idle;
                            *status = SaveStatus::Idle;
                            changed
                        });
                        pending = Some((snapshot, deadline));
                    }
                    Some(Command::CommitNow { snapshot, reply }) => {
                        pending = None;
                        let result = self.commit(snapshot).await;
                        let _ = reply.send(result);
                    }
                    None => {
                        if pending.is_some() {
                            debug!(entity = %self.kind, "Autosave closed; pending snapshot discarded");
                        }
                        break;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((snapshot, _)) = pending.take() {
                        let _ = self.commit(snapshot).await;
                    }
                }
            }
        }
    }

    async fn commit(&mut self, snapshot: RecordPayload) -> Result<LocalRecord, AppError> {
        self.status.send_replace(SaveStatus::Saving);

        let mut draft = RecordDraft::new(snapshot);
        draft.id = self.record_id.clone();

        let result = match self.sink.commit_snapshot(self.kind, draft).await {
            Ok(record) => {
                self.record_id = Some(record.id.clone());
                match self.listener.on_saved(&record).await {
                    Ok(()) => Ok(record),
                    Err(err) => Err(err),
                }
            }
            Err(err) => Err(err),
        };

        match &result {
            Ok(record) => {
                debug!(entity = %self.kind, id = %record.id, "Autosave committed");
                self.status.send_replace(SaveStatus::Saved);
            }
            Err(err) => {
                warn!(entity = %self.kind, error = %err, "Autosave failed");
                self.listener.on_error(err).await;
                self.status.send_replace(SaveStatus::Error);
            }
        }
        result
    }
}
