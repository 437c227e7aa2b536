//! Task comment domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::EntityRef;

/// A comment on a task or on one of its activities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskComment {
    pub id: Uuid,
    pub organization: Uuid,
    pub department: Uuid,
    /// Polymorphic parent: a Task or a TaskActivity.
    pub parent: EntityRef,
    pub created_by: Uuid,
    pub content: String,
    /// Mentioned users, deduplicated.
    pub mentions: Vec<Uuid>,
    /// Denormalized attachment ids, pruned by the cascade.
    pub attachments: Vec<Uuid>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskComment {
    pub organization: Uuid,
    pub department: Uuid,
    pub parent: EntityRef,
    pub created_by: Uuid,
    pub content: String,
    pub mentions: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTaskComment {
    pub content: Option<String>,
    pub mentions: Option<Vec<Uuid>>,
    pub add_mentions: Option<Vec<Uuid>>,
    pub remove_mentions: Option<Vec<Uuid>>,
}
