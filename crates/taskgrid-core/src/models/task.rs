//! Task domain model.
//!
//! Tasks come in three variants sharing the common fields: `Routine`
//! (recurring work carrying materials), `Assigned` and `Project` (staffed
//! work carrying assignees, watchers and activities). The variant is an
//! explicit tagged enum flattened into the document under `task_type`;
//! behavior differences are dispatched by matching on the tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Blocked,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Variant tag, stored as the `task_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Routine,
    Assigned,
    Project,
}

impl TaskType {
    /// String form, identical to the serde tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Routine => "routine",
            TaskType::Assigned => "assigned",
            TaskType::Project => "project",
        }
    }

    /// Whether this variant carries a `TaskActivity` fan-out.
    pub fn has_activities(&self) -> bool {
        matches!(self, TaskType::Assigned | TaskType::Project)
    }
}

/// Variant-dependent payload, flattened into the task document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "task_type", rename_all = "snake_case")]
pub enum TaskDetail {
    /// Recurring maintenance work; consumes materials directly.
    Routine { materials: Vec<Uuid> },
    /// Work assigned to specific users.
    Assigned {
        assignees: Vec<Uuid>,
        watchers: Vec<Uuid>,
        activities: Vec<Uuid>,
    },
    /// Longer-running staffed work, structurally identical to `Assigned`
    /// but reported and prioritized separately.
    Project {
        assignees: Vec<Uuid>,
        watchers: Vec<Uuid>,
        activities: Vec<Uuid>,
    },
}

impl TaskDetail {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskDetail::Routine { .. } => TaskType::Routine,
            TaskDetail::Assigned { .. } => TaskType::Assigned,
            TaskDetail::Project { .. } => TaskType::Project,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub organization: Uuid,
    pub department: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Creating user; must share the task's organization and department.
    pub created_by: Uuid,
    #[serde(flatten)]
    pub detail: TaskDetail,
    /// Denormalized child ids, pruned by the cascade when children die.
    pub comments: Vec<Uuid>,
    pub attachments: Vec<Uuid>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub organization: Uuid,
    pub department: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_by: Uuid,
    pub detail: TaskDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Whole-array replacement; rejected on a `Routine` task.
    pub assignees: Option<Vec<Uuid>>,
    pub add_assignees: Option<Vec<Uuid>>,
    pub remove_assignees: Option<Vec<Uuid>>,
    pub watchers: Option<Vec<Uuid>>,
    pub add_watchers: Option<Vec<Uuid>>,
    pub remove_watchers: Option<Vec<Uuid>>,
}
