//! Error types for the TaskGrid core.

use thiserror::Error;

use crate::kind::EntityKind;

#[derive(Debug, Error)]
pub enum TaskgridError {
    #[error("tenant integrity violation on {entity}.{field}: {reason}")]
    TenantIntegrityViolation {
        entity: EntityKind,
        field: &'static str,
        reason: String,
    },

    #[error("referenced {kind} {id} does not exist")]
    ParentNotFound { kind: EntityKind, id: String },

    #[error("uniqueness conflict: {kind}.{field} = {value} already in use")]
    UniquenessConflict {
        kind: EntityKind,
        field: &'static str,
        value: String,
    },

    #[error("cascade aborted: {reason}")]
    CascadeAborted { reason: String },

    #[error("entity not found: {kind} with id {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("invalid command: {message}")]
    Invalid { message: String },

    #[error("store error: {0}")]
    Store(String),
}

pub type TaskgridResult<T> = Result<T, TaskgridError>;
