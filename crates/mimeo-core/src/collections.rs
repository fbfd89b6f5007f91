//! Backing data structures for sequences, sets, and mappings.
//!
//! Sets and mappings carry a *variant* chosen at construction (unordered or
//! sorted) and expose it through a capability query, so the cloning engine
//! can reconstruct a structurally matching container without inspecting
//! concrete backing types.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::key::Key;
use crate::value::Value;

/// Ordered growable sequence of values.
pub struct SeqData {
    elems: RwLock<Vec<Value>>,
}

impl SeqData {
    /// Create an empty sequence.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            elems: RwLock::new(Vec::new()),
        })
    }

    /// Create a sequence from existing values.
    pub fn from_values(values: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            elems: RwLock::new(values),
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elems.read().len()
    }

    /// Is the sequence empty?
    pub fn is_empty(&self) -> bool {
        self.elems.read().is_empty()
    }

    /// Element at `index`, or `None` when out of bounds.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.elems.read().get(index).cloned()
    }

    /// Append an element.
    pub fn push(&self, value: Value) {
        self.elems.write().push(value);
    }

    /// Copy of the element vector, in order.
    pub fn snapshot(&self) -> Vec<Value> {
        self.elems.read().clone()
    }
}

impl std::fmt::Debug for SeqData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SeqData(len={})", self.len())
    }
}

/// Set variant capability tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetVariant {
    /// Hash-backed, no iteration-order guarantee
    Unordered,
    /// Tree-backed, iterates in ascending key order
    Sorted,
}

enum SetInner {
    Unordered(FxHashSet<Key>),
    Sorted(BTreeSet<Key>),
}

/// A set of values, unordered or sorted.
pub struct SetData {
    inner: RwLock<SetInner>,
}

impl SetData {
    /// Create an empty unordered (hash) set.
    pub fn unordered() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(SetInner::Unordered(FxHashSet::default())),
        })
    }

    /// Create an empty sorted (tree) set.
    pub fn sorted() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(SetInner::Sorted(BTreeSet::new())),
        })
    }

    /// Which variant is this set?
    pub fn variant(&self) -> SetVariant {
        match &*self.inner.read() {
            SetInner::Unordered(_) => SetVariant::Unordered,
            SetInner::Sorted(_) => SetVariant::Sorted,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match &*self.inner.read() {
            SetInner::Unordered(s) => s.len(),
            SetInner::Sorted(s) => s.len(),
        }
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a value. Returns `true` if it was not already present.
    pub fn insert(&self, value: Value) -> bool {
        let key = Key::new(value);
        match &mut *self.inner.write() {
            SetInner::Unordered(s) => s.insert(key),
            SetInner::Sorted(s) => s.insert(key),
        }
    }

    /// Membership test.
    pub fn contains(&self, value: &Value) -> bool {
        let key = Key::new(value.clone());
        match &*self.inner.read() {
            SetInner::Unordered(s) => s.contains(&key),
            SetInner::Sorted(s) => s.contains(&key),
        }
    }

    /// Elements in iteration order (ascending for the sorted variant).
    pub fn snapshot(&self) -> Vec<Value> {
        match &*self.inner.read() {
            SetInner::Unordered(s) => s.iter().map(|k| k.value().clone()).collect(),
            SetInner::Sorted(s) => s.iter().map(|k| k.value().clone()).collect(),
        }
    }
}

impl std::fmt::Debug for SetData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SetData({:?}, len={})", self.variant(), self.len())
    }
}

/// Mapping variant capability tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapVariant {
    /// Hash-backed, no iteration-order guarantee
    Unordered,
    /// Tree-backed, iterates in ascending key order
    Sorted,
}

enum MapInner {
    Unordered(FxHashMap<Key, Value>),
    Sorted(BTreeMap<Key, Value>),
}

/// A keyed mapping, unordered or sorted.
pub struct MapData {
    inner: RwLock<MapInner>,
}

impl MapData {
    /// Create an empty unordered (hash) mapping.
    pub fn unordered() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(MapInner::Unordered(FxHashMap::default())),
        })
    }

    /// Create an empty sorted (tree) mapping.
    pub fn sorted() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(MapInner::Sorted(BTreeMap::new())),
        })
    }

    /// Which variant is this mapping?
    pub fn variant(&self) -> MapVariant {
        match &*self.inner.read() {
            MapInner::Unordered(_) => MapVariant::Unordered,
            MapInner::Sorted(_) => MapVariant::Sorted,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match &*self.inner.read() {
            MapInner::Unordered(m) => m.len(),
            MapInner::Sorted(m) => m.len(),
        }
    }

    /// Is the mapping empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or update `key` → `value`. Returns the previous value if the
    /// key was already present.
    pub fn insert(&self, key: Value, value: Value) -> Option<Value> {
        let key = Key::new(key);
        match &mut *self.inner.write() {
            MapInner::Unordered(m) => m.insert(key, value),
            MapInner::Sorted(m) => m.insert(key, value),
        }
    }

    /// Value associated with `key`, if any.
    pub fn get(&self, key: &Value) -> Option<Value> {
        let key = Key::new(key.clone());
        match &*self.inner.read() {
            MapInner::Unordered(m) => m.get(&key).cloned(),
            MapInner::Sorted(m) => m.get(&key).cloned(),
        }
    }

    /// Entries in iteration order (ascending key order for the sorted
    /// variant).
    pub fn entries(&self) -> Vec<(Value, Value)> {
        match &*self.inner.read() {
            MapInner::Unordered(m) => m
                .iter()
                .map(|(k, v)| (k.value().clone(), v.clone()))
                .collect(),
            MapInner::Sorted(m) => m
                .iter()
                .map(|(k, v)| (k.value().clone(), v.clone()))
                .collect(),
        }
    }

    /// Values in iteration order.
    pub fn values(&self) -> Vec<Value> {
        self.entries().into_iter().map(|(_, v)| v).collect()
    }
}

impl std::fmt::Debug for MapData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MapData({:?}, len={})", self.variant(), self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_set_iterates_ascending() {
        let set = SetData::sorted();
        for i in [5i64, 3, 1, 4, 2] {
            set.insert(Value::Int(i));
        }
        let order: Vec<i64> = set.snapshot().iter().filter_map(Value::as_int).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn unordered_set_deduplicates() {
        let set = SetData::unordered();
        assert!(set.insert(Value::Int(1)));
        assert!(!set.insert(Value::Int(1)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.variant(), SetVariant::Unordered);
    }

    #[test]
    fn sorted_map_iterates_by_key() {
        let map = MapData::sorted();
        map.insert(Value::Int(3), Value::from("c"));
        map.insert(Value::Int(1), Value::from("a"));
        map.insert(Value::Int(2), Value::from("b"));
        let values: Vec<String> = map
            .values()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn map_insert_replaces() {
        let map = MapData::unordered();
        assert!(map.insert(Value::Int(1), Value::from("a")).is_none());
        let prev = map.insert(Value::Int(1), Value::from("b"));
        assert_eq!(prev, Some(Value::from("a")));
        assert_eq!(map.get(&Value::Int(1)), Some(Value::from("b")));
    }
}
