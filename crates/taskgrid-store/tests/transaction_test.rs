//! Integration tests for the in-memory store's transaction semantics.

use serde_json::json;
use taskgrid_core::kind::EntityKind;
use taskgrid_core::query::{Filter, Patch};
use taskgrid_core::store::EntityStore;
use taskgrid_store::MemStore;
use uuid::Uuid;

fn task_doc(id: Uuid, org: Uuid, title: &str) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "organization": org.to_string(),
        "title": title,
        "attachments": [],
        "deleted": false,
    })
}

#[tokio::test]
async fn committed_writes_are_visible_to_later_transactions() {
    let store = MemStore::new();
    let id = Uuid::new_v4();
    let org = Uuid::new_v4();

    let mut tx = store.begin().await.unwrap();
    store
        .insert(EntityKind::Task, task_doc(id, org, "commit me"), &mut tx)
        .await
        .unwrap();
    store.commit(tx).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let found = store
        .find_by_id(EntityKind::Task, id, &[], &mut tx)
        .await
        .unwrap();
    store.abort(tx).await.unwrap();

    assert_eq!(found.unwrap()["title"], "commit me");
}

#[tokio::test]
async fn aborted_writes_leave_no_trace() {
    let store = MemStore::new();
    let id = Uuid::new_v4();
    let org = Uuid::new_v4();

    let mut tx = store.begin().await.unwrap();
    store
        .insert(EntityKind::Task, task_doc(id, org, "doomed"), &mut tx)
        .await
        .unwrap();
    store.abort(tx).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let found = store
        .find_by_id(EntityKind::Task, id, &[], &mut tx)
        .await
        .unwrap();
    store.commit(tx).await.unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn transaction_reads_its_own_writes() {
    let store = MemStore::new();
    let id = Uuid::new_v4();
    let org = Uuid::new_v4();

    let mut tx = store.begin().await.unwrap();
    store
        .insert(EntityKind::Task, task_doc(id, org, "before"), &mut tx)
        .await
        .unwrap();
    store
        .update_many(
            EntityKind::Task,
            &Filter::active().id(id),
            &Patch::new().set("title", "after"),
            &mut tx,
        )
        .await
        .unwrap();

    let found = store
        .find_by_id(EntityKind::Task, id, &["title"], &mut tx)
        .await
        .unwrap()
        .unwrap();
    store.abort(tx).await.unwrap();

    assert_eq!(found["title"], "after");
    assert!(found.get("organization").is_none(), "projection leaked");
}

#[tokio::test]
async fn dropping_a_transaction_rolls_back() {
    let store = MemStore::new();
    let id = Uuid::new_v4();
    let org = Uuid::new_v4();

    {
        let mut tx = store.begin().await.unwrap();
        store
            .insert(EntityKind::Task, task_doc(id, org, "dropped"), &mut tx)
            .await
            .unwrap();
        // Simulates caller cancellation: the handle is dropped without
        // commit or abort.
    }

    let mut tx = store.begin().await.unwrap();
    let count = store
        .count(EntityKind::Task, &Filter::any(), &mut tx)
        .await
        .unwrap();
    store.commit(tx).await.unwrap();

    assert_eq!(count, 0);
}

#[tokio::test]
async fn update_many_reports_changed_documents_only() {
    let store = MemStore::new();
    let org = Uuid::new_v4();

    let mut tx = store.begin().await.unwrap();
    for title in ["a", "b"] {
        store
            .insert(EntityKind::Task, task_doc(Uuid::new_v4(), org, title), &mut tx)
            .await
            .unwrap();
    }

    let patch = Patch::new().set("deleted", true);
    let changed = store
        .update_many(EntityKind::Task, &Filter::active(), &patch, &mut tx)
        .await
        .unwrap();
    assert_eq!(changed, 2);

    // Second pass: the active filter no longer matches anything.
    let changed = store
        .update_many(EntityKind::Task, &Filter::active(), &patch, &mut tx)
        .await
        .unwrap();
    assert_eq!(changed, 0);

    let remaining = store
        .count(EntityKind::Task, &Filter::active(), &mut tx)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    let total = store
        .count(EntityKind::Task, &Filter::any(), &mut tx)
        .await
        .unwrap();
    assert_eq!(total, 2);
    store.commit(tx).await.unwrap();
}

#[tokio::test]
async fn duplicate_insert_is_rejected() {
    let store = MemStore::new();
    let id = Uuid::new_v4();
    let org = Uuid::new_v4();

    let mut tx = store.begin().await.unwrap();
    store
        .insert(EntityKind::Task, task_doc(id, org, "first"), &mut tx)
        .await
        .unwrap();
    let result = store
        .insert(EntityKind::Task, task_doc(id, org, "second"), &mut tx)
        .await;
    store.abort(tx).await.unwrap();

    assert!(result.is_err(), "duplicate id should be rejected");
}
