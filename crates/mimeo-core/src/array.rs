//! Fixed-length arrays with a declared element kind.
//!
//! The element kind is fixed at construction and type-checks every write,
//! mirroring arrays whose component type is part of the array type itself.
//! Scalar-kinded arrays are what make the engine's bulk-copy fast path
//! sound: no element can hold a mutable reference.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::value::Value;

/// Declared element kind of an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElemKind {
    /// Booleans only
    Bool,
    /// Integers only
    Int,
    /// Floats only
    Float,
    /// Strings (or null)
    Str,
    /// Any value
    Any,
}

impl ElemKind {
    /// Can elements of this kind hold mutable references?
    /// Scalar kinds cannot, which enables bulk copying.
    pub fn is_scalar(self) -> bool {
        !matches!(self, Self::Any)
    }

    fn default_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            // Reference-kinded slots default to absent
            Self::Str | Self::Any => Value::Null,
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Bool => matches!(value, Value::Bool(_)),
            Self::Int => matches!(value, Value::Int(_)),
            Self::Float => matches!(value, Value::Float(_)),
            Self::Str => matches!(value, Value::Str(_) | Value::Null),
            Self::Any => true,
        }
    }
}

/// A fixed-length array. Length and element kind never change after
/// construction; elements are interior-mutable.
pub struct ArrayData {
    kind: ElemKind,
    elems: RwLock<Vec<Value>>,
}

impl ArrayData {
    /// Create an array of `len` default-valued elements.
    pub fn new(kind: ElemKind, len: usize) -> Arc<Self> {
        Arc::new(Self {
            kind,
            elems: RwLock::new(vec![kind.default_value(); len]),
        })
    }

    /// Create an array from existing values, type-checking each against
    /// `kind`.
    pub fn from_values(kind: ElemKind, values: Vec<Value>) -> CoreResult<Arc<Self>> {
        for v in &values {
            if !kind.accepts(v) {
                return Err(CoreError::ElemKindMismatch {
                    kind,
                    value: format!("{v:?}"),
                });
            }
        }
        Ok(Arc::new(Self {
            kind,
            elems: RwLock::new(values),
        }))
    }

    /// Declared element kind.
    pub fn kind(&self) -> ElemKind {
        self.kind
    }

    /// Array length.
    pub fn len(&self) -> usize {
        self.elems.read().len()
    }

    /// Is the array empty?
    pub fn is_empty(&self) -> bool {
        self.elems.read().is_empty()
    }

    /// Element at `index`, or `None` when out of bounds.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.elems.read().get(index).cloned()
    }

    /// Write `value` at `index`, checking bounds and element kind.
    pub fn set(&self, index: usize, value: Value) -> CoreResult<()> {
        if !self.kind.accepts(&value) {
            return Err(CoreError::ElemKindMismatch {
                kind: self.kind,
                value: format!("{value:?}"),
            });
        }
        let mut elems = self.elems.write();
        let len = elems.len();
        match elems.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(CoreError::IndexOutOfBounds { index, len }),
        }
    }

    /// Copy of the element vector.
    pub fn snapshot(&self) -> Vec<Value> {
        self.elems.read().clone()
    }

    /// Overwrite all elements from `other` in one pass. Both arrays must
    /// have the same length and kind; used for the scalar bulk-copy path.
    pub fn copy_from(&self, other: &ArrayData) -> CoreResult<()> {
        let src = other.snapshot();
        let mut elems = self.elems.write();
        if src.len() != elems.len() || self.kind != other.kind {
            return Err(CoreError::ElemKindMismatch {
                kind: self.kind,
                value: format!("bulk copy from {:?}[{}]", other.kind, src.len()),
            });
        }
        *elems = src;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_array_is_default_filled() {
        let ints = ArrayData::new(ElemKind::Int, 3);
        assert_eq!(ints.len(), 3);
        assert_eq!(ints.get(0), Some(Value::Int(0)));

        let strs = ArrayData::new(ElemKind::Str, 2);
        assert_eq!(strs.get(1), Some(Value::Null));
    }

    #[test]
    fn writes_are_kind_checked() {
        let ints = ArrayData::new(ElemKind::Int, 1);
        assert!(ints.set(0, Value::Int(7)).is_ok());
        assert!(matches!(
            ints.set(0, Value::from("no")),
            Err(CoreError::ElemKindMismatch { .. })
        ));
        assert!(matches!(
            ints.set(5, Value::Int(1)),
            Err(CoreError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn bulk_copy_requires_matching_shape() {
        let a = ArrayData::from_values(
            ElemKind::Int,
            vec![Value::Int(1), Value::Int(2)],
        )
        .unwrap();
        let b = ArrayData::new(ElemKind::Int, 2);
        b.copy_from(&a).unwrap();
        assert_eq!(b.get(1), Some(Value::Int(2)));

        let short = ArrayData::new(ElemKind::Int, 1);
        assert!(short.copy_from(&a).is_err());
    }
}
