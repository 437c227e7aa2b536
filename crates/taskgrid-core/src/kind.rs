//! Entity kinds and polymorphic references.
//!
//! Every collection in the store is addressed by an [`EntityKind`].
//! Polymorphic parent/target fields carry an [`EntityRef`]: the target id
//! paired with an explicit kind tag, never a bare id resolved by name.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Discriminant for every entity collection in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Organization,
    Department,
    User,
    Task,
    TaskActivity,
    TaskComment,
    Attachment,
    Material,
    Notification,
    Vendor,
}

impl EntityKind {
    /// All kinds, in dependency order (parents before children).
    pub const ALL: &'static [EntityKind] = &[
        EntityKind::Organization,
        EntityKind::Department,
        EntityKind::User,
        EntityKind::Vendor,
        EntityKind::Task,
        EntityKind::TaskActivity,
        EntityKind::TaskComment,
        EntityKind::Attachment,
        EntityKind::Material,
        EntityKind::Notification,
    ];

    /// Collection name, identical to the serde tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Organization => "organization",
            EntityKind::Department => "department",
            EntityKind::User => "user",
            EntityKind::Task => "task",
            EntityKind::TaskActivity => "task_activity",
            EntityKind::TaskComment => "task_comment",
            EntityKind::Attachment => "attachment",
            EntityKind::Material => "material",
            EntityKind::Notification => "notification",
            EntityKind::Vendor => "vendor",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discriminated reference: target id plus an explicit kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    /// JSON shape used inside stored documents.
    ///
    /// Must stay in sync with the serde derive: `{"kind": "...", "id": "..."}`.
    pub fn to_value(&self) -> Value {
        json!({ "kind": self.kind.as_str(), "id": self.id.to_string() })
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
