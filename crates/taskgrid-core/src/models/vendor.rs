//! Vendor domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A supplier of materials. Organization-scoped; the department link is
/// optional and informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub organization: Uuid,
    pub department: Option<Uuid>,
    /// Unique among non-deleted vendors of the organization.
    pub name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVendor {
    pub organization: Uuid,
    pub department: Option<Uuid>,
    pub name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateVendor {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<Option<String>>,
}
