//! Department domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A department groups users and work items inside one organization.
/// The (organization, department) pair is the fine-grained tenant boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub organization: Uuid,
    /// Unique among non-deleted departments of the organization.
    pub name: String,
    pub description: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDepartment {
    pub organization: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub description: Option<String>,
}
