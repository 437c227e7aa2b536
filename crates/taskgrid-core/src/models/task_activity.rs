//! Task activity domain model.
//!
//! Activities only exist under `Assigned` and `Project` tasks; the
//! validator rejects a `Routine` parent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskActivity {
    pub id: Uuid,
    pub organization: Uuid,
    pub department: Uuid,
    /// Owning task; Assigned/Project variants only.
    pub task: Uuid,
    pub created_by: Uuid,
    pub description: String,
    pub logged_at: DateTime<Utc>,
    /// Denormalized child ids, pruned by the cascade when children die.
    pub attachments: Vec<Uuid>,
    pub materials: Vec<Uuid>,
    pub comments: Vec<Uuid>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskActivity {
    pub organization: Uuid,
    pub department: Uuid,
    pub task: Uuid,
    pub created_by: Uuid,
    pub description: String,
    /// Defaults to the command timestamp when absent.
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTaskActivity {
    pub description: Option<String>,
    pub logged_at: Option<DateTime<Utc>>,
}
