//! Value-model error types

use thiserror::Error;

/// Errors raised by the value model and type registry.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A type tag is not present in the registry.
    #[error("unknown type tag #{0}")]
    UnknownType(u32),

    /// A type name is already registered.
    #[error("type `{0}` is already registered")]
    DuplicateType(String),

    /// A parent tag named in a `TypeSpec` is not registered.
    #[error("unknown parent type for `{0}`")]
    UnknownParent(String),

    /// A type marked abstract cannot be constructed through the registry.
    #[error("type `{0}` is abstract and cannot be instantiated")]
    AbstractType(String),

    /// Wrong number of field values passed to `new_object`.
    #[error("type `{type_name}` has {expected} field slots, got {got} values")]
    FieldArity {
        /// Registered type name
        type_name: String,
        /// Total slot count across the inheritance chain
        expected: usize,
        /// Number of values supplied
        got: usize,
    },

    /// A slot index is outside the instance's layout.
    #[error("no field slot {slot} on `{type_name}`")]
    BadSlot {
        /// Registered type name
        type_name: String,
        /// Offending slot index
        slot: usize,
    },

    /// Write rejected because the instance is frozen.
    #[error("cannot write to frozen instance of `{0}`")]
    FrozenWrite(String),

    /// A value does not match an array's declared element kind.
    #[error("array of {kind:?} cannot hold {value}")]
    ElemKindMismatch {
        /// The array's declared element kind
        kind: crate::array::ElemKind,
        /// Short description of the rejected value
        value: String,
    },

    /// Array index out of bounds.
    #[error("array index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        /// Offending index
        index: usize,
        /// Array length
        len: usize,
    },
}

/// Result type for value-model operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
