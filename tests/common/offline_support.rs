use std::sync::Arc;

use serde_json::Value;
use stoic_offline::application::services::{OfflineService, SyncService};
use stoic_offline::domain::entities::{LocalRecord, RecordDraft};
use stoic_offline::domain::value_objects::{EntityKind, RecordPayload};
use stoic_offline::infrastructure::LocalStore;

use super::mocks::{MockIdentityProvider, MockRemoteBackend};

pub struct SyncTestContext {
    pub store: LocalStore,
    pub offline: OfflineService,
    pub sync: SyncService,
    pub remote: MockRemoteBackend,
    pub identity: MockIdentityProvider,
}

pub async fn setup_sync(identity: MockIdentityProvider) -> SyncTestContext {
    let store = LocalStore::open_in_memory()
        .await
        .expect("in-memory sqlite");
    let remote = MockRemoteBackend::new();

    let offline = OfflineService::new(
        store.records(),
        store.pending_log(),
        store.intent_writer(),
        Arc::new(identity.clone()),
    );
    let sync = SyncService::new(
        store.pending_log(),
        store.records(),
        Arc::new(remote.clone()),
        Arc::new(identity.clone()),
    );

    SyncTestContext {
        store,
        offline,
        sync,
        remote,
        identity,
    }
}

pub fn fields(value: Value) -> RecordPayload {
    RecordPayload::new(value).expect("object payload")
}

pub async fn save(ctx: &SyncTestContext, kind: EntityKind, value: Value) -> LocalRecord {
    let (record, _) = ctx
        .offline
        .save_record(kind, RecordDraft::new(fields(value)))
        .await
        .expect("save record");
    record
}

/// Makes every enqueue fail until `accept_enqueues` runs.
pub async fn reject_enqueues(store: &LocalStore) {
    sqlx::query(
        r#"
        CREATE TRIGGER reject_enqueue BEFORE INSERT ON pending_operations
        BEGIN
            SELECT RAISE(ABORT, 'pending log unavailable');
        END
        "#,
    )
    .execute(store.pool().get_pool())
    .await
    .expect("install trigger");
}

pub async fn accept_enqueues(store: &LocalStore) {
    sqlx::query("DROP TRIGGER reject_enqueue")
        .execute(store.pool().get_pool())
        .await
        .expect("drop trigger");
}
