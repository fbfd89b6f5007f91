//! Cloning failure types.
//!
//! Every failure is local to one `deep_clone` call and propagates
//! synchronously to the caller. Nothing is swallowed or logged-and-ignored,
//! nothing is retried, and no partially-populated destination graph is ever
//! returned.

use mimeo_core::CoreError;
use thiserror::Error;

/// Errors raised while deep-copying a value graph.
#[derive(Debug, Error)]
pub enum CloneError {
    /// The raw allocator cannot produce an instance of the named type.
    #[error("cannot allocate instance of `{type_name}`: {reason}")]
    Allocation {
        /// Offending type name
        type_name: String,
        /// Why allocation is impossible (abstract type, unknown tag, ...)
        reason: String,
    },

    /// A field could not be read from the source or written to the
    /// destination.
    #[error("cannot access field `{field}` on `{type_name}`")]
    FieldAccess {
        /// Owning type name
        type_name: String,
        /// Field name
        field: String,
    },

    /// The source contains something the engine cannot reconstruct (an
    /// unrecognized container variant or an opaque handle). Never silently
    /// downgraded to reusing the original reference.
    #[error("unsupported value for deep copy: {0}")]
    Unsupported(String),

    /// Registry or value-model failure during traversal.
    #[error("value model error: {0}")]
    Core(#[from] CoreError),

    /// Context wrapper for failures during recursive population.
    #[error("failed to deep copy object: {0}")]
    Traversal(#[source] Box<CloneError>),
}

impl CloneError {
    pub(crate) fn allocation(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Allocation {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn field_access(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::FieldAccess {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    /// Wrap a population failure with traversal context, without stacking
    /// wrappers on an already-wrapped error.
    pub(crate) fn traversal(inner: CloneError) -> Self {
        match inner {
            already @ Self::Traversal(_) => already,
            other => Self::Traversal(Box::new(other)),
        }
    }
}

/// Result type for cloning operations.
pub type CloneResult<T> = std::result::Result<T, CloneError>;
