use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use stoic_offline::application::ports::{RemoteBackend, RemoteError, RemoteRecord};
use stoic_offline::domain::value_objects::{EntityKind, PendingAction, RecordPayload};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub entity: EntityKind,
    pub action: PendingAction,
    /// Payload `id` for inserts, the filter id otherwise.
    pub id: String,
    pub payload: Option<RecordPayload>,
}

/// Lets a test hold the backend inside its first call.
#[derive(Clone, Default)]
pub struct RemoteGate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Clone, Default)]
pub struct MockRemoteBackend {
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    assigned_ids: Arc<Mutex<HashMap<String, String>>>,
    gate: Arc<Mutex<Option<RemoteGate>>>,
    session_rejected: Arc<AtomicBool>,
}

impl MockRemoteBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call addressing `id` fails with a 500 until `recover`.
    pub fn fail_for(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn recover(&self, id: &str) {
        self.failing.lock().unwrap().remove(id);
    }

    /// Inserts of `local_id` come back with `server_id` as their primary key.
    pub fn assign_id(&self, local_id: &str, server_id: &str) {
        self.assigned_ids
            .lock()
            .unwrap()
            .insert(local_id.to_string(), server_id.to_string());
    }

    /// Every call fails as if the backend had no valid session token.
    pub fn reject_session(&self) {
        self.session_rejected.store(true, Ordering::SeqCst);
    }

    pub fn hold(&self) -> RemoteGate {
        let gate = RemoteGate::default();
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn record(
        &self,
        entity: EntityKind,
        action: PendingAction,
        id: &str,
        payload: Option<&RecordPayload>,
    ) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(RemoteCall {
            entity,
            action,
            id: id.to_string(),
            payload: payload.cloned(),
        });

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.session_rejected.load(Ordering::SeqCst) {
            return Err(RemoteError::Unauthenticated);
        }
        if self.failing.lock().unwrap().contains(id) {
            return Err(RemoteError::Rejected {
                status: 500,
                body: format!("simulated failure for {id}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteBackend for MockRemoteBackend {
    async fn insert(
        &self,
        entity: EntityKind,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, RemoteError> {
        let id = payload.get_str("id").unwrap_or_default().to_string();
        self.record(entity, PendingAction::Insert, &id, Some(payload))
            .await?;

        let assigned = self.assigned_ids.lock().unwrap().get(&id).cloned();
        Ok(match assigned {
            Some(server_id) => payload.clone().with_field("id", Value::String(server_id)),
            None => payload.clone(),
        })
    }

    async fn update(
        &self,
        entity: EntityKind,
        id: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord, RemoteError> {
        self.record(entity, PendingAction::Update, id, Some(payload))
            .await?;
        Ok(payload.clone())
    }

    async fn delete(&self, entity: EntityKind, id: &str) -> Result<(), RemoteError> {
        self.record(entity, PendingAction::Delete, id, None).await
    }
}
