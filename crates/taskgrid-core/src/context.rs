//! Tenant context supplied by the (external) authentication layer.

use uuid::Uuid;

use crate::models::user::UserRole;

/// The acting identity and tenant scope of a command.
///
/// Opaque to the core beyond being compared against entity tenant keys:
/// a command never writes outside `organization`, and org-wide roles aside,
/// never outside `department`.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub organization: Uuid,
    pub department: Option<Uuid>,
    pub actor: Uuid,
    pub role: UserRole,
}

impl TenantContext {
    /// Whether the acting role may write across departments of its
    /// organization.
    pub fn is_org_wide(&self) -> bool {
        matches!(self.role, UserRole::SuperAdmin | UserRole::Admin)
    }
}
