//! Notification domain model.
//!
//! A notification optionally points at the entity it is about; the cascade
//! invalidates it when that target is soft-deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::EntityRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskAssigned,
    TaskStatusChanged,
    CommentAdded,
    MentionAdded,
    SystemNotice,
}

/// Per-recipient read marker. Collapsed by user, keeping the most recent
/// timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub user: Uuid,
    pub read_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub organization: Uuid,
    pub department: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub created_by: Uuid,
    /// Recipient users, deduplicated.
    pub recipients: Vec<Uuid>,
    pub reads: Vec<ReadReceipt>,
    /// The entity this notification is about, if any.
    pub target: Option<EntityRef>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub organization: Uuid,
    pub department: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub created_by: Uuid,
    pub recipients: Vec<Uuid>,
    pub target: Option<EntityRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateNotification {
    pub message: Option<String>,
    pub recipients: Option<Vec<Uuid>>,
    pub add_recipients: Option<Vec<Uuid>>,
    pub remove_recipients: Option<Vec<Uuid>>,
    /// Read receipts to merge in, collapsed by user keeping the newest.
    pub add_reads: Option<Vec<ReadReceipt>>,
}
