//! Cascading soft delete.
//!
//! One explicit engine, invoked by the command layer after a successful
//! flag-flip write; no per-entity lifecycle hooks triggering each other.
//! Traversal is breadth-first over a static dependency table; every read
//! and write happens inside the triggering command's transaction, so a
//! failure at any step rolls the whole closure back.
//!
//! The closure is convergent: collection filters exclude rows that are
//! already deleted and a visited set guards re-enqueueing, so re-running
//! over an already-deleted subtree performs no work. That also bounds the
//! traversal if the graph were ever misconfigured into a cycle.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use taskgrid_core::error::TaskgridResult;
use taskgrid_core::kind::{EntityKind, EntityRef};
use taskgrid_core::query::{Filter, Patch};
use taskgrid_core::store::EntityStore;

use crate::config::EngineConfig;
use crate::error::EngineError;

/// How a dependent collection is linked back to the deleted entity.
#[derive(Debug, Clone, Copy)]
enum Link {
    /// Scalar field holding the entity's id.
    Field(&'static str),
    /// Polymorphic `parent` reference pointing at the entity.
    Parent,
    /// Array field containing the entity's id.
    ArrayContains(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct Dependent {
    kind: EntityKind,
    link: Link,
}

const fn dep(kind: EntityKind, link: Link) -> Dependent {
    Dependent { kind, link }
}

// Everything in an organization carries its key, so one flip per collection
// covers the whole subtree; recursion then finds nothing left to do.
const ORGANIZATION_DEPS: &[Dependent] = &[
    dep(EntityKind::Department, Link::Field("organization")),
    dep(EntityKind::User, Link::Field("organization")),
    dep(EntityKind::Vendor, Link::Field("organization")),
    dep(EntityKind::Task, Link::Field("organization")),
    dep(EntityKind::TaskActivity, Link::Field("organization")),
    dep(EntityKind::TaskComment, Link::Field("organization")),
    dep(EntityKind::Attachment, Link::Field("organization")),
    dep(EntityKind::Material, Link::Field("organization")),
    dep(EntityKind::Notification, Link::Field("organization")),
];

// Department-scoped materials are reached through their Task / TaskActivity
// parents rather than flipped directly.
const DEPARTMENT_DEPS: &[Dependent] = &[
    dep(EntityKind::User, Link::Field("department")),
    dep(EntityKind::Task, Link::Field("department")),
    dep(EntityKind::TaskActivity, Link::Field("department")),
    dep(EntityKind::TaskComment, Link::Field("department")),
    dep(EntityKind::Attachment, Link::Field("department")),
    dep(EntityKind::Notification, Link::Field("department")),
];

const USER_DEPS: &[Dependent] = &[
    dep(EntityKind::Task, Link::Field("created_by")),
    dep(EntityKind::TaskActivity, Link::Field("created_by")),
    dep(EntityKind::TaskComment, Link::Field("created_by")),
    dep(EntityKind::Attachment, Link::Field("uploaded_by")),
    dep(EntityKind::Notification, Link::Field("created_by")),
    dep(EntityKind::Notification, Link::ArrayContains("recipients")),
];

// Activities only exist under Assigned/Project tasks; the `task` field
// filter naturally finds none under a Routine task.
const TASK_DEPS: &[Dependent] = &[
    dep(EntityKind::TaskActivity, Link::Field("task")),
    dep(EntityKind::TaskComment, Link::Parent),
    dep(EntityKind::Attachment, Link::Parent),
    dep(EntityKind::Material, Link::Parent),
];

const TASK_ACTIVITY_DEPS: &[Dependent] = &[
    dep(EntityKind::TaskComment, Link::Parent),
    dep(EntityKind::Attachment, Link::Parent),
    dep(EntityKind::Material, Link::Parent),
];

const TASK_COMMENT_DEPS: &[Dependent] = &[dep(EntityKind::Attachment, Link::Parent)];

/// Direct dependents flipped (and recursed into) when an entity of the
/// given kind is soft-deleted.
fn dependents(kind: EntityKind) -> &'static [Dependent] {
    match kind {
        EntityKind::Organization => ORGANIZATION_DEPS,
        EntityKind::Department => DEPARTMENT_DEPS,
        EntityKind::User => USER_DEPS,
        EntityKind::Task => TASK_DEPS,
        EntityKind::TaskActivity => TASK_ACTIVITY_DEPS,
        EntityKind::TaskComment => TASK_COMMENT_DEPS,
        EntityKind::Attachment
        | EntityKind::Material
        | EntityKind::Notification
        | EntityKind::Vendor => &[],
    }
}

#[derive(Debug, Clone, Copy)]
enum PruneMode {
    /// Pull the deleted ids out of an array field.
    PullArray,
    /// Null out a scalar back-reference.
    ClearScalar,
}

#[derive(Debug, Clone, Copy)]
struct PruneSpec {
    holder: EntityKind,
    field: &'static str,
    mode: PruneMode,
}

const fn prune(holder: EntityKind, field: &'static str, mode: PruneMode) -> PruneSpec {
    PruneSpec {
        holder,
        field,
        mode,
    }
}

const USER_PRUNES: &[PruneSpec] = &[
    prune(EntityKind::Task, "assignees", PruneMode::PullArray),
    prune(EntityKind::Task, "watchers", PruneMode::PullArray),
    prune(EntityKind::TaskComment, "mentions", PruneMode::PullArray),
    prune(EntityKind::Notification, "recipients", PruneMode::PullArray),
];

const TASK_ACTIVITY_PRUNES: &[PruneSpec] =
    &[prune(EntityKind::Task, "activities", PruneMode::PullArray)];

const TASK_COMMENT_PRUNES: &[PruneSpec] = &[
    prune(EntityKind::Task, "comments", PruneMode::PullArray),
    prune(EntityKind::TaskActivity, "comments", PruneMode::PullArray),
];

const ATTACHMENT_PRUNES: &[PruneSpec] = &[
    prune(EntityKind::Task, "attachments", PruneMode::PullArray),
    prune(EntityKind::TaskActivity, "attachments", PruneMode::PullArray),
    prune(EntityKind::TaskComment, "attachments", PruneMode::PullArray),
];

const MATERIAL_PRUNES: &[PruneSpec] = &[
    prune(EntityKind::Task, "materials", PruneMode::PullArray),
    prune(EntityKind::TaskActivity, "materials", PruneMode::PullArray),
];

const VENDOR_PRUNES: &[PruneSpec] =
    &[prune(EntityKind::Material, "vendor", PruneMode::ClearScalar)];

const DEPARTMENT_PRUNES: &[PruneSpec] =
    &[prune(EntityKind::Vendor, "department", PruneMode::ClearScalar)];

/// Denormalized references to scrub from surviving holders once ids of the
/// given kind have been flipped.
fn prunes(kind: EntityKind) -> &'static [PruneSpec] {
    match kind {
        EntityKind::User => USER_PRUNES,
        EntityKind::TaskActivity => TASK_ACTIVITY_PRUNES,
        EntityKind::TaskComment => TASK_COMMENT_PRUNES,
        EntityKind::Attachment => ATTACHMENT_PRUNES,
        EntityKind::Material => MATERIAL_PRUNES,
        EntityKind::Vendor => VENDOR_PRUNES,
        EntityKind::Department => DEPARTMENT_PRUNES,
        EntityKind::Organization | EntityKind::Task | EntityKind::Notification => &[],
    }
}

/// Outcome of one closure run.
#[derive(Debug, Default)]
pub(crate) struct CascadeReport {
    /// Dependents flipped, excluding the root itself.
    pub flipped: u64,
    /// Surviving holders whose arrays or scalars were scrubbed.
    pub pruned: u64,
}

/// Executes the full dependent closure of an already-flipped root inside
/// the caller's transaction.
pub(crate) async fn run<S: EntityStore>(
    store: &S,
    tx: &mut S::Tx,
    root_kind: EntityKind,
    root_id: Uuid,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> TaskgridResult<CascadeReport> {
    let flip = Patch::new().set("deleted", true).set("updated_at", now);
    let mut report = CascadeReport::default();
    let mut visited: HashSet<(EntityKind, Uuid)> = HashSet::new();
    let mut queue: VecDeque<(EntityKind, Vec<Uuid>)> = VecDeque::new();

    visited.insert((root_kind, root_id));
    queue.push_back((root_kind, vec![root_id]));

    while let Some((kind, ids)) = queue.pop_front() {
        // 1. Flip still-active dependents and enqueue them for their own
        //    closure level.
        for spec in dependents(kind) {
            let filter = match spec.link {
                Link::Field(field) => Filter::active().is_in(
                    field,
                    ids.iter()
                        .map(|id| serde_json::Value::String(id.to_string()))
                        .collect(),
                ),
                Link::Parent => Filter::active().ref_in(
                    "parent",
                    &ids.iter()
                        .map(|&id| EntityRef::new(kind, id))
                        .collect::<Vec<_>>(),
                ),
                Link::ArrayContains(field) => Filter::active().contains_any_ids(field, &ids),
            };
            let found = store.find_ids(spec.kind, &filter, tx).await?;
            let fresh: Vec<Uuid> = found
                .into_iter()
                .filter(|&id| visited.insert((spec.kind, id)))
                .collect();
            if fresh.is_empty() {
                continue;
            }
            report.flipped += fresh.len() as u64;
            if report.flipped > config.max_closure_size {
                return Err(EngineError::ClosureOverflow {
                    limit: config.max_closure_size,
                }
                .into());
            }
            store
                .update_many(spec.kind, &Filter::active().ids(&fresh), &flip, tx)
                .await?;
            tracing::debug!(
                root = %root_kind,
                kind = %spec.kind,
                count = fresh.len(),
                "cascade flipped dependents"
            );
            queue.push_back((spec.kind, fresh));
        }

        // 2. Invalidate notifications pointing at the flipped entities.
        if kind != EntityKind::Notification {
            let refs: Vec<EntityRef> = ids.iter().map(|&id| EntityRef::new(kind, id)).collect();
            let filter = Filter::active().ref_in("target", &refs);
            let found = store.find_ids(EntityKind::Notification, &filter, tx).await?;
            let fresh: Vec<Uuid> = found
                .into_iter()
                .filter(|&id| visited.insert((EntityKind::Notification, id)))
                .collect();
            if !fresh.is_empty() {
                report.flipped += fresh.len() as u64;
                store
                    .update_many(
                        EntityKind::Notification,
                        &Filter::active().ids(&fresh),
                        &flip,
                        tx,
                    )
                    .await?;
                tracing::debug!(
                    root = %root_kind,
                    kind = %kind,
                    count = fresh.len(),
                    "cascade invalidated notifications"
                );
                queue.push_back((EntityKind::Notification, fresh));
            }
        }

        // 3. Scrub the flipped ids out of every surviving holder.
        for spec in prunes(kind) {
            let pruned = match spec.mode {
                PruneMode::PullArray => {
                    store
                        .update_many(
                            spec.holder,
                            &Filter::active().contains_any_ids(spec.field, &ids),
                            &Patch::new().pull_ids(spec.field, &ids).set("updated_at", now),
                            tx,
                        )
                        .await?
                }
                PruneMode::ClearScalar => {
                    store
                        .update_many(
                            spec.holder,
                            &Filter::active().is_in(
                                spec.field,
                                ids.iter()
                                    .map(|id| serde_json::Value::String(id.to_string()))
                                    .collect(),
                            ),
                            &Patch::new().clear(spec.field).set("updated_at", now),
                            tx,
                        )
                        .await?
                }
            };
            report.pruned += pruned;
        }
    }

    Ok(report)
}
