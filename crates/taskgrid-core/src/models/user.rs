//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Manager,
    User,
}

impl UserRole {
    /// String form, identical to the serde tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::User => "user",
        }
    }

    /// Roles that occupy a department's single admin slot.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::SuperAdmin | UserRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub organization: Uuid,
    pub department: Uuid,
    pub name: String,
    /// Unique among non-deleted users of the organization.
    pub email: String,
    pub role: UserRole,
    /// Opaque credential hash; producing it is the auth layer's concern.
    pub password_hash: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub organization: Uuid,
    pub department: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub password_hash: Option<String>,
}
