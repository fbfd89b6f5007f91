//! Composite object instances.
//!
//! An `ObjectData` is a slot vector laid out by its `TypeInfo` (inherited
//! slots first), plus a frozen flag implementing the freezable capability:
//! once frozen, an instance is an immutable snapshot and rejects writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::registry::{TypeInfo, TypeTag};
use crate::value::Value;

/// A composite object instance.
pub struct ObjectData {
    ty: Arc<TypeInfo>,
    frozen: AtomicBool,
    slots: RwLock<Vec<Value>>,
}

impl ObjectData {
    /// Instance with every slot set to `Null` and no construction logic
    /// executed. This is the raw-allocation path used by the cloning
    /// engine; ordinary callers construct through
    /// `TypeRegistry::new_object`.
    pub fn zeroed(ty: Arc<TypeInfo>) -> Arc<Self> {
        let slots = vec![Value::Null; ty.slot_count()];
        Arc::new(Self {
            ty,
            frozen: AtomicBool::new(false),
            slots: RwLock::new(slots),
        })
    }

    pub(crate) fn with_slots(ty: Arc<TypeInfo>, slots: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            ty,
            frozen: AtomicBool::new(false),
            slots: RwLock::new(slots),
        })
    }

    /// Type description of this instance.
    pub fn ty(&self) -> &Arc<TypeInfo> {
        &self.ty
    }

    /// Registry tag of this instance's type.
    pub fn tag(&self) -> TypeTag {
        self.ty.tag()
    }

    /// Registered type name.
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Freezable capability: does this instance report itself frozen?
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Put this instance into its immutable-snapshot state. Irreversible.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    /// Value at `slot`, or `None` when the slot is outside the layout.
    pub fn get(&self, slot: usize) -> Option<Value> {
        self.slots.read().get(slot).cloned()
    }

    /// Value of the field called `name`, searching the inheritance chain.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.ty.slot_of(name).and_then(|slot| self.get(slot))
    }

    /// Write `value` at `slot`. Rejects writes to frozen instances and
    /// slots outside the layout.
    pub fn set(&self, slot: usize, value: Value) -> CoreResult<()> {
        if self.is_frozen() {
            return Err(CoreError::FrozenWrite(self.type_name().to_string()));
        }
        let mut slots = self.slots.write();
        match slots.get_mut(slot) {
            Some(dest) => {
                *dest = value;
                Ok(())
            }
            None => Err(CoreError::BadSlot {
                type_name: self.type_name().to_string(),
                slot,
            }),
        }
    }

    /// Write the field called `name`, searching the inheritance chain.
    pub fn set_field(&self, name: &str, value: Value) -> CoreResult<()> {
        let slot = self.ty.slot_of(name).ok_or_else(|| CoreError::BadSlot {
            type_name: self.type_name().to_string(),
            slot: usize::MAX,
        })?;
        self.set(slot, value)
    }

    /// Copy of the slot vector, in layout order.
    pub fn slots_snapshot(&self) -> Vec<Value> {
        self.slots.read().clone()
    }
}

impl std::fmt::Debug for ObjectData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ObjectData({}, slots={}, frozen={})",
            self.type_name(),
            self.slots.read().len(),
            self.is_frozen()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{TypeRegistry, TypeSpec};

    fn person_registry() -> (TypeRegistry, TypeTag) {
        let registry = TypeRegistry::new();
        let tag = registry
            .register(TypeSpec::new("Person").field("name").field("age"))
            .unwrap();
        (registry, tag)
    }

    #[test]
    fn zeroed_instances_have_null_slots() {
        let (registry, tag) = person_registry();
        let info = registry.get(tag).unwrap();
        let obj = ObjectData::zeroed(info);
        assert_eq!(obj.get(0), Some(Value::Null));
        assert_eq!(obj.get(1), Some(Value::Null));
        assert_eq!(obj.get(2), None);
    }

    #[test]
    fn field_access_by_name() {
        let (registry, tag) = person_registry();
        let obj = registry
            .new_object(tag, vec![Value::from("Bob"), Value::Int(21)])
            .unwrap();
        assert_eq!(obj.get_field("name"), Some(Value::from("Bob")));
        obj.set_field("age", Value::Int(22)).unwrap();
        assert_eq!(obj.get_field("age"), Some(Value::Int(22)));
        assert!(obj.set_field("missing", Value::Null).is_err());
    }

    #[test]
    fn frozen_instances_reject_writes() {
        let (registry, tag) = person_registry();
        let obj = registry
            .new_object(tag, vec![Value::from("Bob"), Value::Int(21)])
            .unwrap();
        assert!(!obj.is_frozen());
        obj.freeze();
        assert!(obj.is_frozen());
        assert!(matches!(
            obj.set(0, Value::from("Eve")),
            Err(CoreError::FrozenWrite(_))
        ));
        // Reads still work
        assert_eq!(obj.get_field("name"), Some(Value::from("Bob")));
    }
}
