//! # Mimeo Engine
//!
//! Generic, cycle-safe deep-copy engine over the mimeo value model: given
//! an arbitrary runtime value, produce a fully independent structural copy
//! with no shared mutable substructure, while preserving reference identity
//! for cyclic and shared substructure within a single copy operation.
//!
//! ## Design Principles
//!
//! - **Cycle-safe**: an identity-keyed visited map, consulted before any
//!   allocation, with record-before-populate container cloning
//! - **Per-type caching**: cloner resolution and field introspection happen
//!   once per concrete type, in concurrent publish-once caches
//! - **Constructor bypass**: destination instances come from a raw
//!   allocator, never from caller construction logic
//! - **Loud failures**: non-reconstructible values surface an error; the
//!   engine never silently aliases the source into the copy

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod alloc;
pub mod classify;
mod cloner;
pub mod engine;
pub mod error;
pub mod policy;

pub use alloc::{Instantiator, RawAllocator};
pub use classify::{CollectionVariant, Kind, classify};
pub use engine::{Engine, EngineBuilder};
pub use error::{CloneError, CloneResult};
pub use policy::{ClonePolicy, Decision, FieldPolicy};
