//! In-memory transactional entity store.
//!
//! Documents live in per-kind ordered maps. A transaction takes the single
//! writer lock and mutates a working copy of the whole state; `commit`
//! publishes the copy, while `abort` (or simply dropping the handle, e.g.
//! on caller cancellation) discards it. That gives serializable isolation
//! and read-your-writes, the semantics the engine's cascade relies on.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use taskgrid_core::error::TaskgridResult;
use taskgrid_core::kind::EntityKind;
use taskgrid_core::query::{Filter, Patch};
use taskgrid_core::store::EntityStore;
use taskgrid_core::doc;

use crate::error::StoreError;

type Collections = HashMap<EntityKind, BTreeMap<Uuid, Value>>;

/// In-memory [`EntityStore`] implementation.
#[derive(Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<Collections>>,
}

/// A transaction over [`MemStore`]: the writer lock plus a working copy.
pub struct MemTx {
    guard: OwnedMutexGuard<Collections>,
    working: Collections,
}

impl MemStore {
    pub fn new() -> Self {
        tracing::debug!("initializing in-memory entity store");
        Self::default()
    }

    fn collection<'a>(working: &'a mut Collections, kind: EntityKind) -> &'a mut BTreeMap<Uuid, Value> {
        working.entry(kind).or_default()
    }
}

impl EntityStore for MemStore {
    type Tx = MemTx;

    async fn begin(&self) -> TaskgridResult<MemTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemTx { guard, working })
    }

    async fn commit(&self, tx: MemTx) -> TaskgridResult<()> {
        let MemTx { mut guard, working } = tx;
        *guard = working;
        Ok(())
    }

    async fn abort(&self, tx: MemTx) -> TaskgridResult<()> {
        // Dropping the working copy releases the lock with the published
        // state untouched.
        drop(tx);
        Ok(())
    }

    async fn insert(&self, kind: EntityKind, document: Value, tx: &mut MemTx) -> TaskgridResult<()> {
        if !document.is_object() {
            return Err(StoreError::MalformedDocument { kind }.into());
        }
        let id = doc::id_of(&document).ok_or(StoreError::MissingId { kind })?;
        let collection = Self::collection(&mut tx.working, kind);
        if collection.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                kind,
                id: id.to_string(),
            }
            .into());
        }
        collection.insert(id, document);
        Ok(())
    }

    async fn find_by_id(
        &self,
        kind: EntityKind,
        id: Uuid,
        projection: &[&str],
        tx: &mut MemTx,
    ) -> TaskgridResult<Option<Value>> {
        let found = Self::collection(&mut tx.working, kind).get(&id);
        Ok(found.map(|document| project(document, projection)))
    }

    async fn find_ids(
        &self,
        kind: EntityKind,
        filter: &Filter,
        tx: &mut MemTx,
    ) -> TaskgridResult<Vec<Uuid>> {
        Ok(Self::collection(&mut tx.working, kind)
            .iter()
            .filter(|(_, document)| filter.matches(document))
            .map(|(id, _)| *id)
            .collect())
    }

    async fn update_many(
        &self,
        kind: EntityKind,
        filter: &Filter,
        patch: &Patch,
        tx: &mut MemTx,
    ) -> TaskgridResult<u64> {
        let mut changed = 0u64;
        for document in Self::collection(&mut tx.working, kind).values_mut() {
            if filter.matches(document) && patch.apply(document) {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn count(
        &self,
        kind: EntityKind,
        filter: &Filter,
        tx: &mut MemTx,
    ) -> TaskgridResult<u64> {
        Ok(Self::collection(&mut tx.working, kind)
            .values()
            .filter(|document| filter.matches(document))
            .count() as u64)
    }
}

fn project(document: &Value, projection: &[&str]) -> Value {
    if projection.is_empty() {
        return document.clone();
    }
    let mut out = serde_json::Map::with_capacity(projection.len());
    if let Some(map) = document.as_object() {
        for &field in projection {
            if let Some(value) = map.get(field) {
                out.insert(field.to_string(), value.clone());
            }
        }
    }
    Value::Object(out)
}
