//! Constructor-bypassing allocation.
//!
//! Cloning must never re-run caller construction logic: target types may
//! have guarded factories, validation, or registration side effects that an
//! allocate-then-populate workflow would re-trigger or trip over. The
//! `Instantiator` seam produces zeroed instances directly from the type's
//! registered layout.

use std::sync::Arc;

use mimeo_core::{ObjectData, TypeRegistry, TypeTag};

use crate::error::{CloneError, CloneResult};

/// Capability: obtain a usable instance of a concrete type without running
/// any construction or validation logic.
pub trait Instantiator: Send + Sync {
    /// Allocate a zeroed instance of `tag`. Fails loudly when the type
    /// cannot be allocated this way (abstract, or unknown to the registry).
    fn allocate(&self, registry: &TypeRegistry, tag: TypeTag) -> CloneResult<Arc<ObjectData>>;
}

/// Default instantiator: builds an instance with every slot `Null` from the
/// registered layout alone.
#[derive(Debug, Default)]
pub struct RawAllocator;

impl Instantiator for RawAllocator {
    fn allocate(&self, registry: &TypeRegistry, tag: TypeTag) -> CloneResult<Arc<ObjectData>> {
        let info = registry
            .get(tag)
            .map_err(|e| CloneError::allocation(format!("#{}", tag.raw()), e.to_string()))?;
        if info.is_abstract() {
            return Err(CloneError::allocation(info.name(), "type is abstract"));
        }
        Ok(ObjectData::zeroed(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimeo_core::{TypeSpec, Value};

    #[test]
    fn allocates_zeroed_instances() {
        let registry = TypeRegistry::new();
        let tag = registry
            .register(TypeSpec::new("Point").field("x").field("y"))
            .unwrap();
        let obj = RawAllocator.allocate(&registry, tag).unwrap();
        assert_eq!(obj.get(0), Some(Value::Null));
        assert_eq!(obj.get(1), Some(Value::Null));
        assert!(!obj.is_frozen());
    }

    #[test]
    fn abstract_types_fail_loudly() {
        let registry = TypeRegistry::new();
        let tag = registry
            .register(TypeSpec::new("Shape").abstract_type())
            .unwrap();
        let err = RawAllocator.allocate(&registry, tag).unwrap_err();
        assert!(matches!(err, CloneError::Allocation { ref type_name, .. } if type_name == "Shape"));
    }
}
