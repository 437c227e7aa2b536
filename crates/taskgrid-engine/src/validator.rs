//! Tenant integrity validation.
//!
//! Runs before any write becomes durable: every created or modified
//! reference field is resolved with a minimal projection and compared
//! against the writing entity's tenant keys per the field's declared rule.
//! A missing or soft-deleted target is `ParentNotFound`; a key mismatch is
//! `TenantIntegrityViolation`; either rejects the whole write.

use serde_json::Value;
use uuid::Uuid;

use taskgrid_core::context::TenantContext;
use taskgrid_core::doc;
use taskgrid_core::error::{TaskgridError, TaskgridResult};
use taskgrid_core::kind::{EntityKind, EntityRef};
use taskgrid_core::models::user::UserRole;
use taskgrid_core::query::Filter;
use taskgrid_core::store::EntityStore;

use crate::error::EngineError;
use crate::rules::{self, Arity, RefRule, Target, Tenancy};

/// Fields needed to judge a reference target.
const TENANT_PROJECTION: &[&str] = &["id", "organization", "department", "deleted", "task_type"];

fn violation(entity: EntityKind, field: &'static str, reason: String) -> TaskgridError {
    TaskgridError::TenantIntegrityViolation {
        entity,
        field,
        reason,
    }
}

/// Compares the acting context against the entity's tenant keys.
///
/// Organization writes are the special case: creating one cannot match the
/// context by definition, so it is gated on the super-admin role instead.
pub(crate) fn check_context(
    ctx: &TenantContext,
    kind: EntityKind,
    document: &Value,
    create: bool,
) -> TaskgridResult<()> {
    if kind == EntityKind::Organization {
        if ctx.role != UserRole::SuperAdmin {
            return Err(violation(
                kind,
                "organization",
                "organization writes require the super_admin role".into(),
            ));
        }
        if !create && doc::id_of(document) != Some(ctx.organization) {
            return Err(violation(
                kind,
                "organization",
                "acting context belongs to another organization".into(),
            ));
        }
        return Ok(());
    }

    let (org, dept) = doc::tenant_keys(kind, document);
    if org != Some(ctx.organization) {
        return Err(violation(
            kind,
            "organization",
            "acting context belongs to another organization".into(),
        ));
    }
    if !ctx.is_org_wide() {
        if let Some(dept) = dept {
            if ctx.department != Some(dept) {
                return Err(violation(
                    kind,
                    "department",
                    "acting context belongs to another department".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Validates every (touched) reference field of a document, then the
/// tenant-scoped uniqueness rules. `touched = None` means a full-document
/// write: everything is checked.
pub(crate) async fn validate_entity<S: EntityStore>(
    store: &S,
    tx: &mut S::Tx,
    kind: EntityKind,
    document: &Value,
    touched: Option<&[&'static str]>,
) -> TaskgridResult<()> {
    let (entity_org, entity_dept) = doc::tenant_keys(kind, document);

    for rule in rules::ref_rules(kind) {
        if let Some(fields) = touched {
            if !fields.contains(&rule.field) {
                continue;
            }
        }
        for (target_kind, target_id) in extract_targets(kind, document, rule)? {
            let target = store
                .find_by_id(target_kind, target_id, TENANT_PROJECTION, tx)
                .await?;
            let target = match target {
                Some(t) if !doc::is_deleted(&t) => t,
                _ => {
                    return Err(TaskgridError::ParentNotFound {
                        kind: target_kind,
                        id: target_id.to_string(),
                    });
                }
            };

            if target_kind == EntityKind::Task {
                if let Some(variants) = rule.task_variants {
                    let found = doc::get_str(&target, "task_type").unwrap_or("unknown");
                    if !variants.iter().any(|v| v.as_str() == found) {
                        return Err(EngineError::TaskVariantMismatch {
                            entity: kind,
                            field: rule.field,
                            expected: expected_variants(variants),
                            found: found.to_string(),
                        }
                        .into());
                    }
                }
            }

            let (target_org, target_dept) = doc::tenant_keys(target_kind, &target);
            if entity_org.is_none() || entity_org != target_org {
                return Err(violation(
                    kind,
                    rule.field,
                    format!("organization mismatch with {target_kind} {target_id}"),
                ));
            }
            if rule.tenancy == Tenancy::OrgAndDept && entity_dept != target_dept {
                return Err(violation(
                    kind,
                    rule.field,
                    format!("department mismatch with {target_kind} {target_id}"),
                ));
            }
        }
    }

    validate_uniqueness(store, tx, kind, document, touched).await
}

fn expected_variants(variants: &[taskgrid_core::models::task::TaskType]) -> String {
    variants
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Resolves a rule into concrete (kind, id) targets to look up.
fn extract_targets(
    kind: EntityKind,
    document: &Value,
    rule: &RefRule,
) -> TaskgridResult<Vec<(EntityKind, Uuid)>> {
    let malformed = || -> TaskgridError {
        EngineError::MalformedReference {
            entity: kind,
            field: rule.field,
        }
        .into()
    };

    match rule.target {
        Target::Kind(target_kind) => {
            let ids = match rule.arity {
                Arity::One => vec![doc::get_uuid(document, rule.field).ok_or_else(malformed)?],
                Arity::Optional => match document.get(rule.field) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(_) => vec![doc::get_uuid(document, rule.field).ok_or_else(malformed)?],
                },
                Arity::Many => doc::get_uuid_array(document, rule.field),
            };
            Ok(ids.into_iter().map(|id| (target_kind, id)).collect())
        }
        Target::Poly(allowed) => {
            let refs: Vec<EntityRef> = match rule.arity {
                Arity::One => vec![doc::get_ref(document, rule.field).ok_or_else(malformed)?],
                Arity::Optional => match document.get(rule.field) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(_) => vec![doc::get_ref(document, rule.field).ok_or_else(malformed)?],
                },
                Arity::Many => Vec::new(),
            };
            for r in &refs {
                if !allowed.contains(&r.kind) {
                    return Err(EngineError::PolyKindNotAllowed {
                        entity: kind,
                        field: rule.field,
                        found: r.kind,
                    }
                    .into());
                }
            }
            Ok(refs.into_iter().map(|r| (r.kind, r.id)).collect())
        }
    }
}

/// Tenant-scoped uniqueness rules, evaluated over non-deleted rows.
async fn validate_uniqueness<S: EntityStore>(
    store: &S,
    tx: &mut S::Tx,
    kind: EntityKind,
    document: &Value,
    touched: Option<&[&'static str]>,
) -> TaskgridResult<()> {
    let relevant = |field: &'static str| touched.is_none_or(|t| t.contains(&field));
    let id = doc::id_of(document).unwrap_or_default();
    let org = doc::get_uuid(document, "organization");

    match kind {
        EntityKind::Organization => {
            if relevant("name") {
                let name = doc::get_str(document, "name").unwrap_or_default().to_string();
                let clash = store
                    .count(
                        kind,
                        &Filter::active().eq("name", &name).not_id(id),
                        tx,
                    )
                    .await?;
                if clash > 0 {
                    return Err(TaskgridError::UniquenessConflict {
                        kind,
                        field: "name",
                        value: name,
                    });
                }
            }
        }
        EntityKind::Department | EntityKind::Vendor => {
            if relevant("name") {
                let name = doc::get_str(document, "name").unwrap_or_default().to_string();
                let clash = store
                    .count(
                        kind,
                        &Filter::active()
                            .eq("organization", org)
                            .eq("name", &name)
                            .not_id(id),
                        tx,
                    )
                    .await?;
                if clash > 0 {
                    return Err(TaskgridError::UniquenessConflict {
                        kind,
                        field: "name",
                        value: name,
                    });
                }
            }
        }
        EntityKind::User => {
            if relevant("email") {
                let email = doc::get_str(document, "email").unwrap_or_default().to_string();
                let clash = store
                    .count(
                        kind,
                        &Filter::active()
                            .eq("organization", org)
                            .eq("email", &email)
                            .not_id(id),
                        tx,
                    )
                    .await?;
                if clash > 0 {
                    return Err(TaskgridError::UniquenessConflict {
                        kind,
                        field: "email",
                        value: email,
                    });
                }
            }
            if relevant("role") || relevant("department") {
                let role = doc::get_str(document, "role").unwrap_or_default();
                let admin_roles = [
                    UserRole::SuperAdmin.as_str(),
                    UserRole::Admin.as_str(),
                ];
                if admin_roles.contains(&role) {
                    let dept = doc::get_uuid(document, "department");
                    let clash = store
                        .count(
                            kind,
                            &Filter::active()
                                .eq("organization", org)
                                .eq("department", dept)
                                .is_in(
                                    "role",
                                    admin_roles
                                        .iter()
                                        .map(|r| Value::String((*r).to_string()))
                                        .collect(),
                                )
                                .not_id(id),
                            tx,
                        )
                        .await?;
                    if clash > 0 {
                        return Err(TaskgridError::UniquenessConflict {
                            kind,
                            field: "role",
                            value: format!("admin slot of department {}", opt_label(dept)),
                        });
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn opt_label(id: Option<Uuid>) -> String {
    id.map(|u| u.to_string()).unwrap_or_else(|| "?".into())
}
