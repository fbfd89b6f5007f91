//! Membership keys for sets and mappings.
//!
//! `Key` gives `Value` the `Eq + Hash + Ord` required for set/map backing
//! stores. Scalars compare structurally; floats use their bit pattern for
//! equality/hashing and `f64::total_cmp` for ordering (so `NaN` is a usable
//! key and the order is total). Heap values compare by reference identity,
//! ordered by (variant rank, pointer address).

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::value::Value;

/// A `Value` wrapper usable as a set element or mapping key.
#[derive(Clone, Debug)]
pub struct Key(Value);

impl Key {
    /// Wrap a value for use as a key.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying value.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Unwrap the underlying value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Variant rank used to order keys of different kinds.
    fn rank(&self) -> u8 {
        match &self.0 {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::Str(_) => 4,
            Value::Enum(_) => 5,
            Value::Array(_) => 6,
            Value::Seq(_) => 7,
            Value::Set(_) => 8,
            Value::Map(_) => 9,
            Value::Object(_) => 10,
            Value::Handle(_) => 11,
        }
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => {
                a.type_name() == b.type_name() && a.ordinal() == b.ordinal()
            }
            _ => match (self.0.heap_addr(), other.0.heap_addr()) {
                (Some(a), Some(b)) => self.rank() == other.rank() && a == b,
                _ => false,
            },
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match &self.0 {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Enum(e) => {
                e.type_name().hash(state);
                e.ordinal().hash(state);
            }
            // Heap values hash by identity (heap_addr is Some for all of them)
            other => other.heap_addr().unwrap_or(0).hash(state),
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Enum(a), Value::Enum(b)) => a
                .type_name()
                .cmp(b.type_name())
                .then(a.ordinal().cmp(&b.ordinal())),
            _ => self
                .rank()
                .cmp(&other.rank())
                .then_with(|| self.0.heap_addr().cmp(&other.0.heap_addr())),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::SeqData;

    #[test]
    fn integer_keys_order_numerically() {
        let mut keys: Vec<Key> = [5i64, 3, 1, 4, 2]
            .into_iter()
            .map(|i| Key::new(Value::Int(i)))
            .collect();
        keys.sort();
        let sorted: Vec<i64> = keys.iter().filter_map(|k| k.value().as_int()).collect();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn nan_is_a_usable_key() {
        let a = Key::new(Value::Float(f64::NAN));
        let b = Key::new(Value::Float(f64::NAN));
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn heap_keys_compare_by_identity() {
        let seq = SeqData::new();
        let a = Key::new(Value::Seq(seq.clone()));
        let b = Key::new(Value::Seq(seq));
        assert_eq!(a, b);

        let c = Key::new(Value::Seq(SeqData::new()));
        assert_ne!(a, c);
        assert_ne!(a.cmp(&c), Ordering::Equal);
    }

    #[test]
    fn cross_kind_keys_never_collide() {
        assert_ne!(Key::new(Value::Int(3)), Key::new(Value::Float(3.0)));
        assert_ne!(Key::new(Value::Null), Key::new(Value::Bool(false)));
    }
}
