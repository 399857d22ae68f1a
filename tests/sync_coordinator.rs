mod common;

use common::mocks::{MockIdentityProvider, RemoteCall};
use common::offline_support::{fields, save, setup_sync};
use serde_json::json;
use std::sync::Arc;
use stoic_offline::AppError;
use stoic_offline::application::services::SyncService;
use stoic_offline::domain::entities::{Identity, RecordDraft, SyncProgress};
use stoic_offline::domain::value_objects::{EntityKind, OwnerId, PendingAction};
use stoic_offline::infrastructure::{PostgrestBackend, SessionIdentityProvider};
use stoic_offline::shared::config::RemoteConfig;

fn actions(calls: &[RemoteCall]) -> Vec<(EntityKind, PendingAction)> {
    calls.iter().map(|call| (call.entity, call.action)).collect()
}

#[tokio::test]
async fn replays_operations_in_enqueue_order() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;

    let reflection = save(&ctx, EntityKind::Reflections, json!({"type": "morning"})).await;
    let virtue = save(&ctx, EntityKind::Virtues, json!({"date": "2025-02-01", "courage": 4})).await;
    ctx.offline
        .save_record(
            EntityKind::Reflections,
            RecordDraft::new(fields(json!({"type": "evening"}))).with_id(reflection.id.clone()),
        )
        .await
        .unwrap();
    ctx.offline
        .delete_record(EntityKind::Virtues, &virtue.id)
        .await
        .unwrap();

    let report = ctx.sync.run().await.unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.succeeded, 4);
    assert!(report.failed.is_empty());
    assert_eq!(
        actions(&ctx.remote.calls()),
        vec![
            (EntityKind::Reflections, PendingAction::Insert),
            (EntityKind::Virtues, PendingAction::Insert),
            (EntityKind::Reflections, PendingAction::Update),
            (EntityKind::Virtues, PendingAction::Delete),
        ]
    );
    assert!(ctx.store.pending_log().is_empty().await.unwrap());

    let stored = ctx
        .offline
        .get(EntityKind::Reflections, &reflection.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.remote_confirmed);
    assert_eq!(ctx.sync.progress().percent(), 100.0);
}

#[tokio::test]
async fn failed_operation_stays_queued_without_blocking_later_ones() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;

    let first = save(&ctx, EntityKind::MoodLogs, json!({"date": "2025-02-01", "mood": 3})).await;
    let second = save(&ctx, EntityKind::MoodLogs, json!({"date": "2025-02-02", "mood": 1})).await;
    let third = save(&ctx, EntityKind::MoodLogs, json!({"date": "2025-02-03", "mood": 5})).await;
    ctx.remote.fail_for(second.id.as_str());

    let report = ctx.sync.run().await.unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].attempts, 1);
    assert_eq!(ctx.remote.call_count(), 3);

    let remaining = ctx.store.pending_log().drain().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].record_id, second.id);
    assert_eq!(remaining[0].attempts, 1);
    assert!(remaining[0].last_error.is_some());

    for (record, confirmed) in [(&first, true), (&second, false), (&third, true)] {
        let stored = ctx
            .offline
            .get(EntityKind::MoodLogs, &record.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.remote_confirmed, confirmed);
    }

    ctx.remote.recover(second.id.as_str());
    let report = ctx.sync.run().await.unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.succeeded, 1);
    assert!(ctx.store.pending_log().is_empty().await.unwrap());
}

#[tokio::test]
async fn aborts_without_identity() {
    let ctx = setup_sync(MockIdentityProvider::anonymous()).await;
    save(&ctx, EntityKind::Challenges, json!({"date": "2025-03-01", "title": "Fast"})).await;

    let result = ctx.sync.run().await;

    assert!(matches!(result, Err(AppError::Unauthenticated)));
    assert_eq!(ctx.remote.call_count(), 0);
    assert_eq!(ctx.store.pending_log().len().await.unwrap(), 1);
}

#[tokio::test]
async fn consults_identity_once_per_run() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;
    for day in 1..=3 {
        save(
            &ctx,
            EntityKind::Virtues,
            json!({"date": format!("2025-04-0{day}"), "justice": day}),
        )
        .await;
    }

    let before = ctx.identity.lookups();
    ctx.sync.run().await.unwrap();
    assert_eq!(ctx.identity.lookups() - before, 1);
}

#[tokio::test]
async fn server_assigned_id_is_used_for_later_operations() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;

    let record = save(&ctx, EntityKind::Reframes, json!({"situation": "Traffic"})).await;
    ctx.offline
        .save_record(
            EntityKind::Reframes,
            RecordDraft::new(fields(json!({"situation": "Traffic", "reframe": "Time to think"})))
                .with_id(record.id.clone()),
        )
        .await
        .unwrap();
    ctx.remote.assign_id(record.id.as_str(), "srv-1");

    let report = ctx.sync.run().await.unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.remapped, 1);

    let calls = ctx.remote.calls();
    assert_eq!(calls[1].action, PendingAction::Update);
    assert_eq!(calls[1].id, "srv-1");
    assert_eq!(
        calls[1].payload.as_ref().and_then(|payload| payload.get_str("id")),
        Some("srv-1")
    );

    let stored = ctx
        .offline
        .get(EntityKind::Reframes, &record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, record.id);
    assert_eq!(stored.server_id.as_deref(), Some("srv-1"));
    assert!(stored.remote_confirmed);

    let operation = ctx
        .offline
        .delete_record(EntityKind::Reframes, &record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(operation.remote_target(), "srv-1");

    ctx.sync.run().await.unwrap();
    let last = ctx.remote.calls().pop().unwrap();
    assert_eq!(last.action, PendingAction::Delete);
    assert_eq!(last.id, "srv-1");
}

#[tokio::test]
async fn concurrent_run_is_skipped() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;
    save(&ctx, EntityKind::Reflections, json!({"type": "morning"})).await;

    let gate = ctx.remote.hold();
    let sync = ctx.sync.clone();
    let first = tokio::spawn(async move { sync.run().await });
    gate.entered.notified().await;

    assert!(ctx.sync.is_running());
    let second = ctx.sync.run().await.unwrap();
    assert!(second.skipped);
    assert_eq!(second.total, 0);
    assert_eq!(ctx.remote.call_count(), 1);

    gate.release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert!(!first.skipped);
    assert_eq!(first.succeeded, 1);
}

#[tokio::test]
async fn operations_enqueued_mid_run_wait_for_the_next_run() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;
    save(&ctx, EntityKind::Reflections, json!({"type": "morning"})).await;

    let gate = ctx.remote.hold();
    let sync = ctx.sync.clone();
    let run = tokio::spawn(async move { sync.run().await });
    gate.entered.notified().await;

    save(&ctx, EntityKind::Reflections, json!({"type": "evening"})).await;
    gate.release.notify_one();

    let report = run.await.unwrap().unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(ctx.store.pending_log().len().await.unwrap(), 1);
}

#[tokio::test]
async fn abandons_operation_after_max_attempts() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;
    let sync = ctx.sync.clone().with_max_attempts(Some(2));

    let record = save(&ctx, EntityKind::Challenges, json!({"date": "2025-05-01"})).await;
    ctx.remote.fail_for(record.id.as_str());

    let report = sync.run().await.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert!(report.abandoned.is_empty());
    assert_eq!(ctx.store.pending_log().len().await.unwrap(), 1);

    let report = sync.run().await.unwrap();
    assert!(report.failed.is_empty());
    assert_eq!(report.abandoned.len(), 1);
    assert_eq!(report.abandoned[0].attempts, 2);
    assert!(ctx.store.pending_log().is_empty().await.unwrap());
}

#[tokio::test]
async fn rejected_session_aborts_run_without_touching_the_queue() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;
    let sync = ctx.sync.clone().with_max_attempts(Some(1));

    save(&ctx, EntityKind::Virtues, json!({"date": "2025-07-01"})).await;
    save(&ctx, EntityKind::Virtues, json!({"date": "2025-07-02"})).await;
    ctx.remote.reject_session();

    let result = sync.run().await;
    assert!(matches!(result, Err(AppError::Unauthenticated)));
    assert_eq!(ctx.remote.call_count(), 1);

    let pending = ctx.store.pending_log().drain().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|op| op.attempts == 0 && op.last_error.is_none()));
    assert!(!sync.is_running());
}

#[tokio::test]
async fn signed_in_user_without_token_keeps_every_operation() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;
    let owner = OwnerId::new("user-without-token".into()).unwrap();
    let identity = Arc::new(SessionIdentityProvider::signed_in(Identity::new(owner)));
    let remote_config = RemoteConfig {
        base_url: Some("http://127.0.0.1:9".into()),
        api_key: Some("anon-key".into()),
        request_timeout: 1,
    };
    let backend = PostgrestBackend::new(&remote_config, identity.clone()).unwrap();
    let sync = SyncService::new(
        ctx.store.pending_log(),
        ctx.store.records(),
        Arc::new(backend),
        identity,
    )
    .with_max_attempts(Some(1));

    for day in 1..=3 {
        save(&ctx, EntityKind::MoodLogs, json!({"date": format!("2025-08-0{day}")})).await;
    }

    let result = sync.run().await;
    assert!(matches!(result, Err(AppError::Unauthenticated)));
    assert_eq!(ctx.store.pending_log().len().await.unwrap(), 3);
}

#[tokio::test]
async fn progress_reaches_completion() {
    let ctx = setup_sync(MockIdentityProvider::signed_in()).await;
    let progress = ctx.sync.subscribe_progress();

    let report = ctx.sync.run().await.unwrap();
    assert_eq!(report.total, 0);
    assert_eq!(*progress.borrow(), SyncProgress::complete(0));
    assert_eq!(progress.borrow().fraction(), 1.0);

    save(&ctx, EntityKind::Virtues, json!({"date": "2025-06-01"})).await;
    save(&ctx, EntityKind::Virtues, json!({"date": "2025-06-02"})).await;
    ctx.sync.run().await.unwrap();
    assert_eq!(*progress.borrow(), SyncProgress::complete(2));
    assert!(ctx.sync.last_report().await.is_some());
}
