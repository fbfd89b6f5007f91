//! # Mimeo Core
//!
//! Value model and type registry for the mimeo deep-copy engine.
//!
//! ## Design Principles
//!
//! - **Thread-safe**: Values are `Send + Sync`; containers use `parking_lot`
//!   locks for interior mutability
//! - **Identity-bearing containers**: every container sits behind an `Arc`,
//!   so reference identity (and therefore cycle/sharing detection) is a
//!   pointer comparison
//! - **Registry-described composites**: composite layouts and their cloning
//!   metadata are explicit records attached at type-registration time, not
//!   runtime reflection

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod array;
pub mod collections;
pub mod error;
pub mod key;
pub mod object;
pub mod registry;
pub mod value;

pub use array::{ArrayData, ElemKind};
pub use collections::{MapData, MapVariant, SeqData, SetData, SetVariant};
pub use error::{CoreError, CoreResult};
pub use key::Key;
pub use object::ObjectData;
pub use registry::{
    EnumConstant, FieldDescriptor, FieldSpec, ImmutableMarker, TypeInfo, TypeRegistry, TypeSpec,
    TypeTag,
};
pub use value::{OpaqueHandle, Value};
