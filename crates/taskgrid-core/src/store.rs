//! Entity store contract.
//!
//! The production store is an external collaborator; this trait is the
//! whole surface the engine composes against. Every operation takes the
//! transaction handle so validation and cascade execution share one unit
//! of work: reads inside a transaction see its own prior writes, and an
//! abort rolls back everything performed so far.

use std::future::Future;

use serde_json::Value;
use uuid::Uuid;

use crate::error::TaskgridResult;
use crate::kind::EntityKind;
use crate::query::{Filter, Patch};

pub trait EntityStore: Send + Sync {
    /// Transaction handle scoping a single command's reads and writes.
    type Tx: Send;

    fn begin(&self) -> impl Future<Output = TaskgridResult<Self::Tx>> + Send;

    /// Makes every write of the transaction durable.
    fn commit(&self, tx: Self::Tx) -> impl Future<Output = TaskgridResult<()>> + Send;

    /// Discards every write of the transaction.
    fn abort(&self, tx: Self::Tx) -> impl Future<Output = TaskgridResult<()>> + Send;

    fn insert(
        &self,
        kind: EntityKind,
        doc: Value,
        tx: &mut Self::Tx,
    ) -> impl Future<Output = TaskgridResult<()>> + Send;

    /// Point lookup by id. `projection` selects fields; empty means the
    /// whole document. Returns soft-deleted documents too; callers decide
    /// what a tombstone means for them.
    fn find_by_id(
        &self,
        kind: EntityKind,
        id: Uuid,
        projection: &[&str],
        tx: &mut Self::Tx,
    ) -> impl Future<Output = TaskgridResult<Option<Value>>> + Send;

    /// Ids of all documents matching the filter, in a stable order.
    fn find_ids(
        &self,
        kind: EntityKind,
        filter: &Filter,
        tx: &mut Self::Tx,
    ) -> impl Future<Output = TaskgridResult<Vec<Uuid>>> + Send;

    /// Applies the patch to every document matching the filter; returns how
    /// many documents actually changed.
    fn update_many(
        &self,
        kind: EntityKind,
        filter: &Filter,
        patch: &Patch,
        tx: &mut Self::Tx,
    ) -> impl Future<Output = TaskgridResult<u64>> + Send;

    fn count(
        &self,
        kind: EntityKind,
        filter: &Filter,
        tx: &mut Self::Tx,
    ) -> impl Future<Output = TaskgridResult<u64>> + Send;
}
