//! Integration tests for the command layer: transaction boundaries,
//! tombstone immutability and patch plumbing.

use serde_json::Value;
use taskgrid_core::context::TenantContext;
use taskgrid_core::error::TaskgridError;
use taskgrid_core::kind::{EntityKind, EntityRef};
use taskgrid_core::models::department::{CreateDepartment, UpdateDepartment};
use taskgrid_core::models::material::{CreateMaterial, UpdateMaterial};
use taskgrid_core::models::organization::{CreateOrganization, OrgSize};
use taskgrid_core::models::task::{CreateTask, TaskDetail, TaskPriority, TaskStatus, UpdateTask};
use taskgrid_core::models::task_comment::{CreateTaskComment, UpdateTaskComment};
use taskgrid_core::models::user::{CreateUser, UserRole};
use taskgrid_core::models::vendor::CreateVendor;
use taskgrid_core::store::EntityStore;
use taskgrid_engine::{CommandService, EntityPatch, NewEntity};
use taskgrid_store::MemStore;
use uuid::Uuid;

struct Fixture {
    store: MemStore,
    svc: CommandService<MemStore>,
    ctx: TenantContext,
    org: Uuid,
    dept: Uuid,
    alice: Uuid,
}

async fn setup() -> Fixture {
    let store = MemStore::new();
    let svc = CommandService::new(store.clone());
    let boot = TenantContext {
        organization: Uuid::nil(),
        department: None,
        actor: Uuid::new_v4(),
        role: UserRole::SuperAdmin,
    };
    let org = svc
        .apply_create(
            NewEntity::Organization(CreateOrganization {
                name: "Acme Field Services".into(),
                contact_email: "ops@acme.test".into(),
                contact_phone: None,
                industry: "facilities".into(),
                size: OrgSize::Medium,
            }),
            &boot,
        )
        .await
        .unwrap();
    let ctx = TenantContext {
        organization: org,
        department: None,
        actor: Uuid::new_v4(),
        role: UserRole::SuperAdmin,
    };
    let dept = svc
        .apply_create(
            NewEntity::Department(CreateDepartment {
                organization: org,
                name: "Maintenance".into(),
                description: "crew".into(),
            }),
            &ctx,
        )
        .await
        .unwrap();
    let alice = svc
        .apply_create(
            NewEntity::User(CreateUser {
                organization: org,
                department: dept,
                name: "alice".into(),
                email: "alice@acme.test".into(),
                role: UserRole::Manager,
                password_hash: "argon2id$test".into(),
            }),
            &ctx,
        )
        .await
        .unwrap();
    Fixture {
        store,
        svc,
        ctx,
        org,
        dept,
        alice,
    }
}

impl Fixture {
    async fn routine_task(&self) -> Uuid {
        self.svc
            .apply_create(
                NewEntity::Task(CreateTask {
                    organization: self.org,
                    department: self.dept,
                    title: "Weekly greasing".into(),
                    description: "".into(),
                    status: TaskStatus::Open,
                    priority: TaskPriority::Low,
                    created_by: self.alice,
                    detail: TaskDetail::Routine {
                        materials: Vec::new(),
                    },
                }),
                &self.ctx,
            )
            .await
            .unwrap()
    }

    async fn fetch(&self, kind: EntityKind, id: Uuid) -> Value {
        let mut tx = self.store.begin().await.unwrap();
        let found = self
            .store
            .find_by_id(kind, id, &[], &mut tx)
            .await
            .unwrap()
            .expect("entity should exist");
        self.store.abort(tx).await.unwrap();
        found
    }
}

#[tokio::test]
async fn updates_persist_and_bump_updated_at() {
    let fx = setup().await;
    let task = fx.routine_task().await;
    let before = fx.fetch(EntityKind::Task, task).await;

    fx.svc
        .apply_update(
            EntityKind::Task,
            task,
            EntityPatch::Task(UpdateTask {
                title: Some("Monthly greasing".into()),
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            }),
            &fx.ctx,
        )
        .await
        .unwrap();

    let after = fx.fetch(EntityKind::Task, task).await;
    assert_eq!(after["title"], "Monthly greasing");
    assert_eq!(after["status"], "in_progress");
    assert_ne!(after["updated_at"], before["updated_at"]);
    assert_eq!(after["created_at"], before["created_at"]);
}

#[tokio::test]
async fn a_tombstone_rejects_further_content_changes() {
    let fx = setup().await;
    let task = fx.routine_task().await;
    fx.svc
        .apply_delete(EntityKind::Task, task, &fx.ctx)
        .await
        .unwrap();

    let err = fx
        .svc
        .apply_update(
            EntityKind::Task,
            task,
            EntityPatch::Task(UpdateTask {
                title: Some("necromancy".into()),
                ..Default::default()
            }),
            &fx.ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskgridError::NotFound { .. }));
}

#[tokio::test]
async fn deleting_twice_returns_ok_without_changes() {
    let fx = setup().await;
    let task = fx.routine_task().await;

    fx.svc
        .apply_delete(EntityKind::Task, task, &fx.ctx)
        .await
        .unwrap();
    let snapshot = fx.fetch(EntityKind::Task, task).await;

    fx.svc
        .apply_delete(EntityKind::Task, task, &fx.ctx)
        .await
        .unwrap();
    assert_eq!(fx.fetch(EntityKind::Task, task).await, snapshot);
}

#[tokio::test]
async fn deleting_an_unknown_id_is_not_found() {
    let fx = setup().await;
    let err = fx
        .svc
        .apply_delete(EntityKind::Task, Uuid::new_v4(), &fx.ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskgridError::NotFound { .. }));
}

#[tokio::test]
async fn patch_payload_kind_must_match() {
    let fx = setup().await;
    let task = fx.routine_task().await;

    let err = fx
        .svc
        .apply_update(
            EntityKind::Task,
            task,
            EntityPatch::Department(UpdateDepartment::default()),
            &fx.ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskgridError::Invalid { .. }));
}

#[tokio::test]
async fn staffing_patches_are_rejected_on_routine_tasks() {
    let fx = setup().await;
    let task = fx.routine_task().await;

    let err = fx
        .svc
        .apply_update(
            EntityKind::Task,
            task,
            EntityPatch::Task(UpdateTask {
                add_assignees: Some(vec![fx.alice]),
                ..Default::default()
            }),
            &fx.ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskgridError::Invalid { .. }));
}

#[tokio::test]
async fn failed_validation_rolls_the_whole_update_back() {
    let fx = setup().await;
    let task = fx.routine_task().await;
    let comment = fx
        .svc
        .apply_create(
            NewEntity::TaskComment(CreateTaskComment {
                organization: fx.org,
                department: fx.dept,
                parent: EntityRef::new(EntityKind::Task, task),
                created_by: fx.alice,
                content: "before".into(),
                mentions: Vec::new(),
            }),
            &fx.ctx,
        )
        .await
        .unwrap();
    let before = fx.fetch(EntityKind::TaskComment, comment).await;

    let err = fx
        .svc
        .apply_update(
            EntityKind::TaskComment,
            comment,
            EntityPatch::TaskComment(UpdateTaskComment {
                content: Some("after".into()),
                add_mentions: Some(vec![Uuid::new_v4()]),
                ..Default::default()
            }),
            &fx.ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskgridError::ParentNotFound { .. }));

    // The content edit in the same command did not land either.
    assert_eq!(fx.fetch(EntityKind::TaskComment, comment).await, before);
}

#[tokio::test]
async fn material_vendor_reference_sets_validates_and_clears() {
    let fx = setup().await;
    let task = fx.routine_task().await;
    let vendor = fx
        .svc
        .apply_create(
            NewEntity::Vendor(CreateVendor {
                organization: fx.org,
                department: None,
                name: "FluidCo".into(),
                contact_email: "orders@fluidco.test".into(),
                contact_phone: None,
            }),
            &fx.ctx,
        )
        .await
        .unwrap();
    let material = fx
        .svc
        .apply_create(
            NewEntity::Material(CreateMaterial {
                organization: fx.org,
                department: fx.dept,
                parent: EntityRef::new(EntityKind::Task, task),
                name: "grease".into(),
                quantity: 4.0,
                unit_cost: 12.5,
                vendor: None,
            }),
            &fx.ctx,
        )
        .await
        .unwrap();

    let set_vendor = |vendor| {
        EntityPatch::Material(UpdateMaterial {
            vendor: Some(vendor),
            ..Default::default()
        })
    };

    // A dangling vendor reference is rejected.
    let err = fx
        .svc
        .apply_update(
            EntityKind::Material,
            material,
            set_vendor(Some(Uuid::new_v4())),
            &fx.ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TaskgridError::ParentNotFound { .. }));

    fx.svc
        .apply_update(EntityKind::Material, material, set_vendor(Some(vendor)), &fx.ctx)
        .await
        .unwrap();
    let stored = fx.fetch(EntityKind::Material, material).await;
    assert_eq!(stored["vendor"], Value::String(vendor.to_string()));

    fx.svc
        .apply_update(EntityKind::Material, material, set_vendor(None), &fx.ctx)
        .await
        .unwrap();
    let stored = fx.fetch(EntityKind::Material, material).await;
    assert_eq!(stored["vendor"], Value::Null);
}
