//! Static reference-rule tables.
//!
//! One table per entity kind, listing every reference field, what it may
//! point at, and which tenant keys must match. The validator walks these
//! tables; nothing else in the engine hardcodes field semantics.

use taskgrid_core::kind::EntityKind;
use taskgrid_core::models::task::TaskType;

/// Which tenant keys of the referencing entity must equal the target's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tenancy {
    /// Organization and department must both match.
    OrgAndDept,
    /// Organization must match; the target may sit in another department.
    OrgOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    One,
    Optional,
    Many,
}

/// Admissible targets of a reference field.
#[derive(Debug, Clone, Copy)]
pub enum Target {
    /// Fixed target collection; stored as a bare id.
    Kind(EntityKind),
    /// Polymorphic target; stored as an `EntityRef` with an explicit tag.
    Poly(&'static [EntityKind]),
}

#[derive(Debug, Clone, Copy)]
pub struct RefRule {
    pub field: &'static str,
    pub target: Target,
    pub tenancy: Tenancy,
    pub arity: Arity,
    /// When the resolved target is a Task, restrict admissible variants.
    pub task_variants: Option<&'static [TaskType]>,
}

const fn rule(field: &'static str, target: Target, tenancy: Tenancy, arity: Arity) -> RefRule {
    RefRule {
        field,
        target,
        tenancy,
        arity,
        task_variants: None,
    }
}

const fn org_rule() -> RefRule {
    rule(
        "organization",
        Target::Kind(EntityKind::Organization),
        Tenancy::OrgOnly,
        Arity::One,
    )
}

const fn dept_rule(arity: Arity) -> RefRule {
    rule(
        "department",
        Target::Kind(EntityKind::Department),
        Tenancy::OrgAndDept,
        arity,
    )
}

const fn user_rule(field: &'static str, tenancy: Tenancy, arity: Arity) -> RefRule {
    rule(field, Target::Kind(EntityKind::User), tenancy, arity)
}

/// Kinds a comment may hang off.
pub const COMMENT_PARENTS: &[EntityKind] = &[EntityKind::Task, EntityKind::TaskActivity];
/// Kinds an attachment may hang off.
pub const ATTACHMENT_PARENTS: &[EntityKind] = &[
    EntityKind::Task,
    EntityKind::TaskActivity,
    EntityKind::TaskComment,
];
/// Kinds a material may be charged against.
pub const MATERIAL_PARENTS: &[EntityKind] = &[EntityKind::Task, EntityKind::TaskActivity];
/// Kinds a notification may be about: anything but another notification.
pub const NOTIFICATION_TARGETS: &[EntityKind] = &[
    EntityKind::Organization,
    EntityKind::Department,
    EntityKind::User,
    EntityKind::Task,
    EntityKind::TaskActivity,
    EntityKind::TaskComment,
    EntityKind::Attachment,
    EntityKind::Material,
    EntityKind::Vendor,
];

const ACTIVITY_TASK_VARIANTS: &[TaskType] = &[TaskType::Assigned, TaskType::Project];
const MATERIAL_TASK_VARIANTS: &[TaskType] = &[TaskType::Routine];

const DEPARTMENT_RULES: &[RefRule] = &[org_rule()];

const USER_RULES: &[RefRule] = &[org_rule(), dept_rule(Arity::One)];

const TASK_RULES: &[RefRule] = &[
    org_rule(),
    dept_rule(Arity::One),
    user_rule("created_by", Tenancy::OrgAndDept, Arity::One),
    user_rule("assignees", Tenancy::OrgAndDept, Arity::Many),
    user_rule("watchers", Tenancy::OrgOnly, Arity::Many),
];

const TASK_ACTIVITY_RULES: &[RefRule] = &[
    org_rule(),
    dept_rule(Arity::One),
    RefRule {
        field: "task",
        target: Target::Kind(EntityKind::Task),
        tenancy: Tenancy::OrgAndDept,
        arity: Arity::One,
        task_variants: Some(ACTIVITY_TASK_VARIANTS),
    },
    user_rule("created_by", Tenancy::OrgAndDept, Arity::One),
];

const TASK_COMMENT_RULES: &[RefRule] = &[
    org_rule(),
    dept_rule(Arity::One),
    rule(
        "parent",
        Target::Poly(COMMENT_PARENTS),
        Tenancy::OrgAndDept,
        Arity::One,
    ),
    user_rule("created_by", Tenancy::OrgAndDept, Arity::One),
    user_rule("mentions", Tenancy::OrgAndDept, Arity::Many),
];

const ATTACHMENT_RULES: &[RefRule] = &[
    org_rule(),
    dept_rule(Arity::One),
    rule(
        "parent",
        Target::Poly(ATTACHMENT_PARENTS),
        Tenancy::OrgAndDept,
        Arity::One,
    ),
    user_rule("uploaded_by", Tenancy::OrgAndDept, Arity::One),
];

const MATERIAL_RULES: &[RefRule] = &[
    org_rule(),
    dept_rule(Arity::One),
    RefRule {
        field: "parent",
        target: Target::Poly(MATERIAL_PARENTS),
        tenancy: Tenancy::OrgAndDept,
        arity: Arity::One,
        task_variants: Some(MATERIAL_TASK_VARIANTS),
    },
    rule(
        "vendor",
        Target::Kind(EntityKind::Vendor),
        Tenancy::OrgOnly,
        Arity::Optional,
    ),
];

const NOTIFICATION_RULES: &[RefRule] = &[
    org_rule(),
    dept_rule(Arity::One),
    user_rule("created_by", Tenancy::OrgAndDept, Arity::One),
    user_rule("recipients", Tenancy::OrgAndDept, Arity::Many),
    rule(
        "target",
        Target::Poly(NOTIFICATION_TARGETS),
        Tenancy::OrgOnly,
        Arity::Optional,
    ),
];

const VENDOR_RULES: &[RefRule] = &[org_rule(), dept_rule(Arity::Optional)];

pub fn ref_rules(kind: EntityKind) -> &'static [RefRule] {
    match kind {
        EntityKind::Organization => &[],
        EntityKind::Department => DEPARTMENT_RULES,
        EntityKind::User => USER_RULES,
        EntityKind::Task => TASK_RULES,
        EntityKind::TaskActivity => TASK_ACTIVITY_RULES,
        EntityKind::TaskComment => TASK_COMMENT_RULES,
        EntityKind::Attachment => ATTACHMENT_RULES,
        EntityKind::Material => MATERIAL_RULES,
        EntityKind::Notification => NOTIFICATION_RULES,
        EntityKind::Vendor => VENDOR_RULES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scoped_kind_declares_an_organization_rule() {
        for &kind in EntityKind::ALL {
            if kind == EntityKind::Organization {
                continue;
            }
            assert!(
                ref_rules(kind).iter().any(|r| r.field == "organization"),
                "{kind} lacks an organization rule"
            );
        }
    }

    #[test]
    fn poly_rules_never_admit_notifications_as_parents() {
        for &kind in EntityKind::ALL {
            for rule in ref_rules(kind) {
                if let Target::Poly(allowed) = rule.target {
                    assert!(
                        !allowed.contains(&EntityKind::Notification),
                        "{kind}.{} admits a notification parent",
                        rule.field
                    );
                }
            }
        }
    }

    #[test]
    fn variant_constraints_only_apply_to_task_targets() {
        for &kind in EntityKind::ALL {
            for rule in ref_rules(kind) {
                if rule.task_variants.is_some() {
                    let targets_task = match rule.target {
                        Target::Kind(k) => k == EntityKind::Task,
                        Target::Poly(allowed) => allowed.contains(&EntityKind::Task),
                    };
                    assert!(targets_task, "{kind}.{} constrains a non-task", rule.field);
                }
            }
        }
    }
}
