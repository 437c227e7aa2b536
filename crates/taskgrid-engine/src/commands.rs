//! Command layer: validated create, update and soft-delete.
//!
//! Every command runs as one transaction: begin → context check → validate
//! → normalize → persist (→ cascade for deletes) → commit. Any failure
//! aborts the transaction, so a caller never observes a partially applied
//! write or a half-finished cascade.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use taskgrid_core::context::TenantContext;
use taskgrid_core::doc;
use taskgrid_core::error::{TaskgridError, TaskgridResult};
use taskgrid_core::kind::EntityKind;
use taskgrid_core::models::attachment::{Attachment, CreateAttachment, UpdateAttachment};
use taskgrid_core::models::department::{CreateDepartment, Department, UpdateDepartment};
use taskgrid_core::models::material::{CreateMaterial, Material, UpdateMaterial};
use taskgrid_core::models::notification::{CreateNotification, Notification, UpdateNotification};
use taskgrid_core::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use taskgrid_core::models::task::{CreateTask, Task, TaskType, UpdateTask};
use taskgrid_core::models::task_activity::{CreateTaskActivity, TaskActivity, UpdateTaskActivity};
use taskgrid_core::models::task_comment::{CreateTaskComment, TaskComment, UpdateTaskComment};
use taskgrid_core::models::user::{CreateUser, UpdateUser, User};
use taskgrid_core::models::vendor::{CreateVendor, UpdateVendor, Vendor};
use taskgrid_core::normalize;
use taskgrid_core::query::{Filter, Patch};
use taskgrid_core::store::EntityStore;

use crate::cascade;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::validator;

/// Create payload, one variant per entity kind.
#[derive(Debug, Clone)]
pub enum NewEntity {
    Organization(CreateOrganization),
    Department(CreateDepartment),
    User(CreateUser),
    Task(CreateTask),
    TaskActivity(CreateTaskActivity),
    TaskComment(CreateTaskComment),
    Attachment(CreateAttachment),
    Material(CreateMaterial),
    Notification(CreateNotification),
    Vendor(CreateVendor),
}

impl NewEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            NewEntity::Organization(_) => EntityKind::Organization,
            NewEntity::Department(_) => EntityKind::Department,
            NewEntity::User(_) => EntityKind::User,
            NewEntity::Task(_) => EntityKind::Task,
            NewEntity::TaskActivity(_) => EntityKind::TaskActivity,
            NewEntity::TaskComment(_) => EntityKind::TaskComment,
            NewEntity::Attachment(_) => EntityKind::Attachment,
            NewEntity::Material(_) => EntityKind::Material,
            NewEntity::Notification(_) => EntityKind::Notification,
            NewEntity::Vendor(_) => EntityKind::Vendor,
        }
    }
}

/// Update payload, one variant per entity kind. Tenant keys, parents and
/// creators are fixed at creation and have no update fields.
#[derive(Debug, Clone)]
pub enum EntityPatch {
    Organization(UpdateOrganization),
    Department(UpdateDepartment),
    User(UpdateUser),
    Task(UpdateTask),
    TaskActivity(UpdateTaskActivity),
    TaskComment(UpdateTaskComment),
    Attachment(UpdateAttachment),
    Material(UpdateMaterial),
    Notification(UpdateNotification),
    Vendor(UpdateVendor),
}

impl EntityPatch {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPatch::Organization(_) => EntityKind::Organization,
            EntityPatch::Department(_) => EntityKind::Department,
            EntityPatch::User(_) => EntityKind::User,
            EntityPatch::Task(_) => EntityKind::Task,
            EntityPatch::TaskActivity(_) => EntityKind::TaskActivity,
            EntityPatch::TaskComment(_) => EntityKind::TaskComment,
            EntityPatch::Attachment(_) => EntityKind::Attachment,
            EntityPatch::Material(_) => EntityKind::Material,
            EntityPatch::Notification(_) => EntityKind::Notification,
            EntityPatch::Vendor(_) => EntityKind::Vendor,
        }
    }
}

/// The command service: the only write path into the entity graph.
///
/// Built by constructor-time injection of the store handle; there are no
/// global registries.
pub struct CommandService<S: EntityStore> {
    store: S,
    config: EngineConfig,
}

impl<S: EntityStore> CommandService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates an entity after normalization and full validation.
    pub async fn apply_create(
        &self,
        new: NewEntity,
        ctx: &TenantContext,
    ) -> TaskgridResult<Uuid> {
        let mut tx = self.store.begin().await?;
        match self.create_in_tx(&mut tx, new, ctx).await {
            Ok(id) => {
                self.store.commit(tx).await?;
                Ok(id)
            }
            Err(err) => {
                self.store.abort(tx).await?;
                Err(err)
            }
        }
    }

    /// Applies a partial update. Array adds are set-union, array
    /// replacements are deduplicated, and every touched reference field is
    /// re-validated against the merged result.
    pub async fn apply_update(
        &self,
        kind: EntityKind,
        id: Uuid,
        patch: EntityPatch,
        ctx: &TenantContext,
    ) -> TaskgridResult<()> {
        if patch.kind() != kind {
            return Err(EngineError::PatchMismatch {
                kind,
                reason: format!("payload targets {}", patch.kind()),
            }
            .into());
        }
        let mut tx = self.store.begin().await?;
        match self.update_in_tx(&mut tx, kind, id, patch, ctx).await {
            Ok(()) => self.store.commit(tx).await,
            Err(err) => {
                self.store.abort(tx).await?;
                Err(err)
            }
        }
    }

    /// Soft-deletes an entity and runs its full dependent closure in the
    /// same transaction. Deleting an already-deleted entity is a no-op.
    pub async fn apply_delete(
        &self,
        kind: EntityKind,
        id: Uuid,
        ctx: &TenantContext,
    ) -> TaskgridResult<()> {
        let mut tx = self.store.begin().await?;
        match self.delete_in_tx(&mut tx, kind, id, ctx).await {
            Ok(()) => self.store.commit(tx).await,
            Err(err) => {
                self.store.abort(tx).await?;
                Err(err)
            }
        }
    }

    async fn create_in_tx(
        &self,
        tx: &mut S::Tx,
        new: NewEntity,
        ctx: &TenantContext,
    ) -> TaskgridResult<Uuid> {
        let kind = new.kind();
        let now = Utc::now();
        let (id, mut document) = build_document(new, now)?;
        normalize::canonicalize_doc(kind, &mut document);
        validator::check_context(ctx, kind, &document, true)?;
        validator::validate_entity(&self.store, tx, kind, &document, None).await?;

        let link = backlink(kind, &document);
        self.store.insert(kind, document, tx).await?;

        // Denormalize: register the new child in its parent's array. The
        // parent was just validated as a live reference, and add-to-set
        // keeps the array duplicate-free.
        if let Some((holder, holder_id, field)) = link {
            self.store
                .update_many(
                    holder,
                    &Filter::active().id(holder_id),
                    &Patch::new()
                        .add_ids_to_set(field, &[id])
                        .set("updated_at", now),
                    tx,
                )
                .await?;
        }
        tracing::info!(kind = %kind, id = %id, "entity created");
        Ok(id)
    }

    async fn update_in_tx(
        &self,
        tx: &mut S::Tx,
        kind: EntityKind,
        id: Uuid,
        patch: EntityPatch,
        ctx: &TenantContext,
    ) -> TaskgridResult<()> {
        let current = self
            .store
            .find_by_id(kind, id, &[], tx)
            .await?
            .filter(|d| !doc::is_deleted(d))
            .ok_or(TaskgridError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        validator::check_context(ctx, kind, &current, false)?;

        let now = Utc::now();
        let (store_patch, touched) = build_patch(&current, patch, now)?;

        // Validate against the merged result; the store applies the same
        // patch with the same evaluation, so what was validated is what
        // gets persisted.
        let mut preview = current.clone();
        store_patch.apply(&mut preview);
        validator::validate_entity(&self.store, tx, kind, &preview, Some(&touched)).await?;

        self.store
            .update_many(kind, &Filter::active().id(id), &store_patch, tx)
            .await?;
        tracing::info!(kind = %kind, id = %id, "entity updated");
        Ok(())
    }

    async fn delete_in_tx(
        &self,
        tx: &mut S::Tx,
        kind: EntityKind,
        id: Uuid,
        ctx: &TenantContext,
    ) -> TaskgridResult<()> {
        let current = self
            .store
            .find_by_id(
                kind,
                id,
                &["id", "organization", "department", "deleted"],
                tx,
            )
            .await?
            .ok_or(TaskgridError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        if doc::is_deleted(&current) {
            tracing::debug!(kind = %kind, id = %id, "delete of deleted entity: no-op");
            return Ok(());
        }
        validator::check_context(ctx, kind, &current, false)?;

        let now = Utc::now();
        self.store
            .update_many(
                kind,
                &Filter::active().id(id),
                &Patch::new().set("deleted", true).set("updated_at", now),
                tx,
            )
            .await?;

        let report = cascade::run(&self.store, tx, kind, id, &self.config, now)
            .await
            .map_err(|err| match err {
                TaskgridError::CascadeAborted { .. } => err,
                other => TaskgridError::CascadeAborted {
                    reason: other.to_string(),
                },
            })?;
        tracing::info!(
            kind = %kind,
            id = %id,
            flipped = report.flipped,
            pruned = report.pruned,
            "soft delete cascaded"
        );
        Ok(())
    }
}

/// Which parent array a newly created child is denormalized into.
fn backlink(kind: EntityKind, document: &Value) -> Option<(EntityKind, Uuid, &'static str)> {
    match kind {
        EntityKind::TaskActivity => {
            doc::get_uuid(document, "task").map(|t| (EntityKind::Task, t, "activities"))
        }
        EntityKind::TaskComment => {
            doc::get_ref(document, "parent").map(|p| (p.kind, p.id, "comments"))
        }
        EntityKind::Attachment => {
            doc::get_ref(document, "parent").map(|p| (p.kind, p.id, "attachments"))
        }
        EntityKind::Material => {
            doc::get_ref(document, "parent").map(|p| (p.kind, p.id, "materials"))
        }
        _ => None,
    }
}

fn to_doc<T: Serialize>(entity: &T) -> TaskgridResult<Value> {
    serde_json::to_value(entity).map_err(|err| TaskgridError::Store(err.to_string()))
}

fn to_values<T: Serialize>(items: &[T]) -> Vec<Value> {
    items
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect()
}

/// Builds the full stored document for a create payload.
fn build_document(new: NewEntity, now: DateTime<Utc>) -> TaskgridResult<(Uuid, Value)> {
    let id = Uuid::new_v4();
    let document = match new {
        NewEntity::Organization(input) => to_doc(&Organization {
            id,
            name: input.name,
            contact_email: input.contact_email,
            contact_phone: input.contact_phone,
            industry: input.industry,
            size: input.size,
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
        NewEntity::Department(input) => to_doc(&Department {
            id,
            organization: input.organization,
            name: input.name,
            description: input.description,
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
        NewEntity::User(input) => to_doc(&User {
            id,
            organization: input.organization,
            department: input.department,
            name: input.name,
            email: input.email,
            role: input.role,
            password_hash: input.password_hash,
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
        NewEntity::Task(input) => to_doc(&Task {
            id,
            organization: input.organization,
            department: input.department,
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            created_by: input.created_by,
            detail: input.detail,
            comments: Vec::new(),
            attachments: Vec::new(),
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
        NewEntity::TaskActivity(input) => to_doc(&TaskActivity {
            id,
            organization: input.organization,
            department: input.department,
            task: input.task,
            created_by: input.created_by,
            description: input.description,
            logged_at: input.logged_at.unwrap_or(now),
            attachments: Vec::new(),
            materials: Vec::new(),
            comments: Vec::new(),
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
        NewEntity::TaskComment(input) => to_doc(&TaskComment {
            id,
            organization: input.organization,
            department: input.department,
            parent: input.parent,
            created_by: input.created_by,
            content: input.content,
            mentions: input.mentions,
            attachments: Vec::new(),
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
        NewEntity::Attachment(input) => to_doc(&Attachment {
            id,
            organization: input.organization,
            department: input.department,
            parent: input.parent,
            uploaded_by: input.uploaded_by,
            name: input.name,
            mime_type: input.mime_type,
            size_bytes: input.size_bytes,
            storage_key: input.storage_key,
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
        NewEntity::Material(input) => to_doc(&Material {
            id,
            organization: input.organization,
            department: input.department,
            parent: input.parent,
            name: input.name,
            quantity: input.quantity,
            unit_cost: input.unit_cost,
            vendor: input.vendor,
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
        NewEntity::Notification(input) => to_doc(&Notification {
            id,
            organization: input.organization,
            department: input.department,
            kind: input.kind,
            message: input.message,
            created_by: input.created_by,
            recipients: input.recipients,
            reads: Vec::new(),
            target: input.target,
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
        NewEntity::Vendor(input) => to_doc(&Vendor {
            id,
            organization: input.organization,
            department: input.department,
            name: input.name,
            contact_email: input.contact_email,
            contact_phone: input.contact_phone,
            deleted: false,
            created_at: now,
            updated_at: now,
        })?,
    };
    Ok((id, document))
}

/// Lowers an update payload into store patch ops plus the list of fields
/// whose reference/uniqueness rules must be re-checked.
fn build_patch(
    current: &Value,
    patch: EntityPatch,
    now: DateTime<Utc>,
) -> TaskgridResult<(Patch, Vec<&'static str>)> {
    let mut touched: Vec<&'static str> = Vec::new();
    let mut ops = Patch::new().set("updated_at", now);

    match patch {
        EntityPatch::Organization(u) => {
            if let Some(name) = u.name {
                ops = ops.set("name", name);
                touched.push("name");
            }
            if let Some(email) = u.contact_email {
                ops = ops.set("contact_email", email);
            }
            if let Some(phone) = u.contact_phone {
                ops = match phone {
                    Some(p) => ops.set("contact_phone", p),
                    None => ops.clear("contact_phone"),
                };
            }
            if let Some(industry) = u.industry {
                ops = ops.set("industry", industry);
            }
            if let Some(size) = u.size {
                ops = ops.set("size", size);
            }
        }
        EntityPatch::Department(u) => {
            if let Some(name) = u.name {
                ops = ops.set("name", name);
                touched.push("name");
            }
            if let Some(description) = u.description {
                ops = ops.set("description", description);
            }
        }
        EntityPatch::User(u) => {
            if let Some(name) = u.name {
                ops = ops.set("name", name);
            }
            if let Some(email) = u.email {
                ops = ops.set("email", email);
                touched.push("email");
            }
            if let Some(role) = u.role {
                ops = ops.set("role", role);
                touched.push("role");
            }
            if let Some(hash) = u.password_hash {
                ops = ops.set("password_hash", hash);
            }
        }
        EntityPatch::Task(u) => {
            if let Some(title) = u.title {
                ops = ops.set("title", title);
            }
            if let Some(description) = u.description {
                ops = ops.set("description", description);
            }
            if let Some(status) = u.status {
                ops = ops.set("status", status);
            }
            if let Some(priority) = u.priority {
                ops = ops.set("priority", priority);
            }

            let touches_staffing = u.assignees.is_some()
                || u.add_assignees.is_some()
                || u.remove_assignees.is_some()
                || u.watchers.is_some()
                || u.add_watchers.is_some()
                || u.remove_watchers.is_some();
            if touches_staffing {
                let variant = doc::get_str(current, "task_type").unwrap_or("unknown");
                if variant == TaskType::Routine.as_str() {
                    return Err(EngineError::PatchMismatch {
                        kind: EntityKind::Task,
                        reason: "a routine task has no assignees or watchers".into(),
                    }
                    .into());
                }
            }
            if let Some(assignees) = u.assignees {
                ops = ops.set("assignees", normalize::dedup(assignees));
                touched.push("assignees");
            }
            if let Some(add) = u.add_assignees {
                ops = ops.add_ids_to_set("assignees", &normalize::dedup(add));
                touched.push("assignees");
            }
            if let Some(remove) = u.remove_assignees {
                ops = ops.pull_ids("assignees", &remove);
            }
            if let Some(watchers) = u.watchers {
                ops = ops.set("watchers", normalize::dedup(watchers));
                touched.push("watchers");
            }
            if let Some(add) = u.add_watchers {
                ops = ops.add_ids_to_set("watchers", &normalize::dedup(add));
                touched.push("watchers");
            }
            if let Some(remove) = u.remove_watchers {
                ops = ops.pull_ids("watchers", &remove);
            }
        }
        EntityPatch::TaskActivity(u) => {
            if let Some(description) = u.description {
                ops = ops.set("description", description);
            }
            if let Some(logged_at) = u.logged_at {
                ops = ops.set("logged_at", logged_at);
            }
        }
        EntityPatch::TaskComment(u) => {
            if let Some(content) = u.content {
                ops = ops.set("content", content);
            }
            if let Some(mentions) = u.mentions {
                ops = ops.set("mentions", normalize::dedup(mentions));
                touched.push("mentions");
            }
            if let Some(add) = u.add_mentions {
                ops = ops.add_ids_to_set("mentions", &normalize::dedup(add));
                touched.push("mentions");
            }
            if let Some(remove) = u.remove_mentions {
                ops = ops.pull_ids("mentions", &remove);
            }
        }
        EntityPatch::Attachment(u) => {
            if let Some(name) = u.name {
                ops = ops.set("name", name);
            }
        }
        EntityPatch::Material(u) => {
            if let Some(name) = u.name {
                ops = ops.set("name", name);
            }
            if let Some(quantity) = u.quantity {
                ops = ops.set("quantity", quantity);
            }
            if let Some(unit_cost) = u.unit_cost {
                ops = ops.set("unit_cost", unit_cost);
            }
            if let Some(vendor) = u.vendor {
                ops = match vendor {
                    Some(v) => {
                        touched.push("vendor");
                        ops.set("vendor", v)
                    }
                    None => ops.clear("vendor"),
                };
            }
        }
        EntityPatch::Notification(u) => {
            if let Some(message) = u.message {
                ops = ops.set("message", message);
            }
            if let Some(recipients) = u.recipients {
                ops = ops.set("recipients", normalize::dedup(recipients));
                touched.push("recipients");
            }
            if let Some(add) = u.add_recipients {
                ops = ops.add_ids_to_set("recipients", &normalize::dedup(add));
                touched.push("recipients");
            }
            if let Some(remove) = u.remove_recipients {
                ops = ops.pull_ids("recipients", &remove);
            }
            if let Some(reads) = u.add_reads {
                let reads = normalize::collapse_receipts(reads);
                ops = ops.merge_keyed("reads", "user", "read_at", to_values(&reads));
            }
        }
        EntityPatch::Vendor(u) => {
            if let Some(name) = u.name {
                ops = ops.set("name", name);
                touched.push("name");
            }
            if let Some(email) = u.contact_email {
                ops = ops.set("contact_email", email);
            }
            if let Some(phone) = u.contact_phone {
                ops = match phone {
                    Some(p) => ops.set("contact_phone", p),
                    None => ops.clear("contact_phone"),
                };
            }
        }
    }

    Ok((ops, touched))
}
