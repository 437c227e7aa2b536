//! Organization domain model.
//!
//! Organizations are the root tenant boundary. Every other entity carries
//! its organization's id as a tenant key; no reference ever crosses it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rough headcount class, used for account management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgSize {
    Small,
    Medium,
    Large,
    Enterprise,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    /// Human-readable name, unique among non-deleted organizations.
    pub name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub industry: String,
    pub size: OrgSize,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub industry: String,
    pub size: OrgSize,
}

/// Fields that can be updated on an existing organization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<Option<String>>,
    pub industry: Option<String>,
    pub size: Option<OrgSize>,
}
