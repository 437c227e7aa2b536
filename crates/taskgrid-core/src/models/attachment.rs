//! Attachment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::EntityRef;

/// A file attached to a task, activity or comment. The blob itself lives
/// in external storage; only the locator is kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub organization: Uuid,
    pub department: Uuid,
    /// Polymorphic parent: Task, TaskActivity or TaskComment.
    pub parent: EntityRef,
    pub uploaded_by: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub storage_key: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttachment {
    pub organization: Uuid,
    pub department: Uuid,
    pub parent: EntityRef,
    pub uploaded_by: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub storage_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAttachment {
    pub name: Option<String>,
}
