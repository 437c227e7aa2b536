//! Engine-specific error types and conversions.

use taskgrid_core::error::TaskgridError;
use taskgrid_core::kind::EntityKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("patch does not apply to this {kind}: {reason}")]
    PatchMismatch { kind: EntityKind, reason: String },

    #[error("reference kind {found} is not allowed on {entity}.{field}")]
    PolyKindNotAllowed {
        entity: EntityKind,
        field: &'static str,
        found: EntityKind,
    },

    #[error("{entity}.{field} must reference a {expected} task, found {found}")]
    TaskVariantMismatch {
        entity: EntityKind,
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("reference field {entity}.{field} is malformed")]
    MalformedReference {
        entity: EntityKind,
        field: &'static str,
    },

    #[error("cascade closure exceeded {limit} entities")]
    ClosureOverflow { limit: u64 },
}

impl From<EngineError> for TaskgridError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ClosureOverflow { .. } => TaskgridError::CascadeAborted {
                reason: err.to_string(),
            },
            other => TaskgridError::Invalid {
                message: other.to_string(),
            },
        }
    }
}
