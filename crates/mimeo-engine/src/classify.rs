//! Type classification.
//!
//! `classify` routes a value to its copying discipline. It is pure and
//! deterministic, and container variants come from capability queries on
//! the data (a closed tagged-variant set), never from concrete backing
//! types at call sites.

use mimeo_core::{MapVariant, TypeTag, Value};

/// How a value is copied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Terminal: null, bool, int, float, string. Copy returns the value
    /// itself; scalars are values, not references.
    Scalar,
    /// Terminal: enumerated constant. The same instance is returned, since
    /// constants are process-wide singletons.
    EnumConst,
    /// Element-wise, with a bulk path for scalar element kinds.
    Array,
    /// Key/value-wise.
    Mapping(MapVariant),
    /// Element-wise.
    Collection(CollectionVariant),
    /// Field-wise via the cloner registry.
    Composite(TypeTag),
    /// Not reconstructible; cloning is a reportable error unless a policy
    /// overrides it at the owning field.
    Opaque,
}

/// Collection variant, resolved via capability query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionVariant {
    /// Growable sequence preserving insertion order
    OrderedSequence,
    /// Hash set, no iteration-order guarantee
    UnorderedSet,
    /// Tree set iterating in ascending order
    SortedSet,
}

/// Classify a value by its copying discipline.
pub fn classify(value: &Value) -> Kind {
    match value {
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => {
            Kind::Scalar
        }
        Value::Enum(_) => Kind::EnumConst,
        Value::Array(_) => Kind::Array,
        Value::Map(m) => Kind::Mapping(m.variant()),
        Value::Seq(_) => Kind::Collection(CollectionVariant::OrderedSequence),
        Value::Set(s) => Kind::Collection(match s.variant() {
            mimeo_core::SetVariant::Unordered => CollectionVariant::UnorderedSet,
            mimeo_core::SetVariant::Sorted => CollectionVariant::SortedSet,
        }),
        Value::Object(o) => Kind::Composite(o.tag()),
        Value::Handle(_) => Kind::Opaque,
    }
}
