//! Material domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::EntityRef;

/// A consumable charged against a routine task or an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub organization: Uuid,
    pub department: Uuid,
    /// Polymorphic parent: a Routine task or a TaskActivity.
    pub parent: EntityRef,
    pub name: String,
    pub quantity: f64,
    pub unit_cost: f64,
    /// Supplying vendor; organization match only.
    pub vendor: Option<Uuid>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMaterial {
    pub organization: Uuid,
    pub department: Uuid,
    pub parent: EntityRef,
    pub name: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub vendor: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMaterial {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub unit_cost: Option<f64>,
    /// `Some(Some(id))` = set, `Some(None)` = clear, `None` = no change.
    pub vendor: Option<Option<Uuid>>,
}
