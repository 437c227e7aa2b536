//! Store-specific error types and conversions.

use taskgrid_core::error::TaskgridError;
use taskgrid_core::kind::EntityKind;

/// Store-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate id on insert: {kind} {id}")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("document is not an object: {kind}")]
    MalformedDocument { kind: EntityKind },

    #[error("document has no id: {kind}")]
    MissingId { kind: EntityKind },
}

impl From<StoreError> for TaskgridError {
    fn from(err: StoreError) -> Self {
        TaskgridError::Store(err.to_string())
    }
}
