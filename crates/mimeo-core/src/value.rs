//! Runtime values
//!
//! `Value` is a cheap-to-clone tagged value. Scalars are stored inline and
//! copied by value; everything else is a shared heap reference (`Arc`) whose
//! pointer address doubles as its identity for cycle and sharing detection.
//!
//! This type is `Send + Sync` because all heap-allocated data is behind
//! `Arc` with lock-based interior mutability.

use std::sync::Arc;

use crate::array::ArrayData;
use crate::collections::{MapData, SeqData, SetData};
use crate::object::ObjectData;
use crate::registry::EnumConstant;

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Int(i64),
    /// Floating-point scalar
    Float(f64),
    /// Immutable string (the `Arc` is shared, never copied)
    Str(Arc<str>),
    /// Enumerated constant (process-wide singleton)
    Enum(Arc<EnumConstant>),
    /// Fixed-length array with a declared element kind
    Array(Arc<ArrayData>),
    /// Ordered growable sequence
    Seq(Arc<SeqData>),
    /// Set (unordered or sorted)
    Set(Arc<SetData>),
    /// Mapping (unordered or sorted)
    Map(Arc<MapData>),
    /// Composite object described by the type registry
    Object(Arc<ObjectData>),
    /// Opaque foreign resource the value model cannot reconstruct
    Handle(Arc<OpaqueHandle>),
}

/// An opaque foreign resource (file handle, logger, socket) carried inside a
/// value graph. It has identity but no reconstructible structure.
pub struct OpaqueHandle {
    name: Arc<str>,
}

impl OpaqueHandle {
    /// Create a handle with a diagnostic name.
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }

    /// Diagnostic name of the resource.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OpaqueHandle({})", self.name)
    }
}

impl Value {
    /// String value from anything string-like.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::Str(s.into())
    }

    /// Is this the absent value?
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Is this a terminal scalar (null, bool, int, float, string)?
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_)
        )
    }

    /// Boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, if any.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// String payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Enum constant, if any.
    pub fn as_enum(&self) -> Option<&Arc<EnumConstant>> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Array payload, if any.
    pub fn as_array(&self) -> Option<&Arc<ArrayData>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Sequence payload, if any.
    pub fn as_seq(&self) -> Option<&Arc<SeqData>> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Set payload, if any.
    pub fn as_set(&self) -> Option<&Arc<SetData>> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Mapping payload, if any.
    pub fn as_map(&self) -> Option<&Arc<MapData>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Composite object payload, if any.
    pub fn as_object(&self) -> Option<&Arc<ObjectData>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Opaque handle payload, if any.
    pub fn as_handle(&self) -> Option<&Arc<OpaqueHandle>> {
        match self {
            Self::Handle(h) => Some(h),
            _ => None,
        }
    }

    /// Heap identity of this value: the container's pointer address, or
    /// `None` for scalars and enum constants (which are never visited-map
    /// concerns).
    pub fn heap_addr(&self) -> Option<usize> {
        match self {
            Self::Array(a) => Some(Arc::as_ptr(a) as usize),
            Self::Seq(s) => Some(Arc::as_ptr(s) as usize),
            Self::Set(s) => Some(Arc::as_ptr(s) as usize),
            Self::Map(m) => Some(Arc::as_ptr(m) as usize),
            Self::Object(o) => Some(Arc::as_ptr(o) as usize),
            Self::Handle(h) => Some(Arc::as_ptr(h) as usize),
            _ => None,
        }
    }

    /// Do `self` and `other` refer to the same heap allocation?
    /// Always `false` for scalars.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self.heap_addr(), other.heap_addr()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

/// Structural equality with an identity fast path.
///
/// Two values referring to the same heap allocation are equal without any
/// traversal, so identity probes on cyclic graphs terminate. Structural
/// comparison of two *distinct* cyclic graphs does not terminate; callers
/// comparing potentially-cyclic graphs should compare identities instead.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.same_instance(other) {
            return true;
        }
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a.type_name() == b.type_name() && a.name() == b.name(),
            (Self::Array(a), Self::Array(b)) => {
                a.kind() == b.kind() && a.snapshot() == b.snapshot()
            }
            (Self::Seq(a), Self::Seq(b)) => a.snapshot() == b.snapshot(),
            (Self::Set(a), Self::Set(b)) => {
                a.variant() == b.variant() && a.len() == b.len()
                    && a.snapshot().iter().all(|v| b.contains(v))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.variant() == b.variant() && a.len() == b.len()
                    && a.entries()
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|bv| bv == *v))
            }
            (Self::Object(a), Self::Object(b)) => {
                a.tag() == b.tag() && a.slots_snapshot() == b.slots_snapshot()
            }
            // Distinct handles are never structurally equal
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Enum(e) => write!(f, "Enum({e})"),
            Self::Array(a) => write!(f, "Array(kind={:?}, len={})", a.kind(), a.len()),
            Self::Seq(s) => write!(f, "Seq(len={})", s.len()),
            Self::Set(s) => write!(f, "Set({:?}, len={})", s.variant(), s.len()),
            Self::Map(m) => write!(f, "Map({:?}, len={})", m.variant(), m.len()),
            Self::Object(o) => write!(f, "Object({})", o.type_name()),
            Self::Handle(h) => write!(f, "Handle({})", h.name()),
        }
    }
}

/// Recursive rendering of the value graph. Intended for acyclic values
/// (demo output, test diagnostics); rendering a cyclic graph recurses
/// without bound, as the underlying graph has no finite text form.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Enum(e) => write!(f, "{e}"),
            Self::Array(a) => write_items(f, "[", a.snapshot().iter(), "]"),
            Self::Seq(s) => write_items(f, "[", s.snapshot().iter(), "]"),
            Self::Set(s) => write_items(f, "{", s.snapshot().iter(), "}"),
            Self::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.entries().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Object(o) => {
                write!(f, "{} {{", o.type_name())?;
                for (i, v) in o.slots_snapshot().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match o.ty().field_name(i) {
                        Some(name) => write!(f, "{name}: {v}")?,
                        None => write!(f, "{v}")?,
                    }
                }
                write!(f, "}}")
            }
            Self::Handle(h) => write!(f, "<handle {}>", h.name()),
        }
    }
}

fn write_items<'a>(
    f: &mut std::fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Value>,
    close: &str,
) -> std::fmt::Result {
    write!(f, "{open}")?;
    for (i, v) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{v}")?;
    }
    write!(f, "{close}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::SeqData;

    #[test]
    fn scalar_equality_is_structural() {
        assert_eq!(Value::Int(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Float(3.0));
        assert_eq!(Value::from("abc"), Value::string("abc"));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn identity_fast_path() {
        let seq = SeqData::new();
        seq.push(Value::Int(1));
        let a = Value::Seq(seq.clone());
        let b = Value::Seq(seq);
        assert!(a.same_instance(&b));
        assert_eq!(a, b);

        let other = SeqData::new();
        other.push(Value::Int(1));
        let c = Value::Seq(other);
        assert!(!a.same_instance(&c));
        // Still structurally equal
        assert_eq!(a, c);
    }

    #[test]
    fn scalars_have_no_heap_identity() {
        assert_eq!(Value::Int(7).heap_addr(), None);
        assert_eq!(Value::from("x").heap_addr(), None);
        assert!(!Value::Int(7).same_instance(&Value::Int(7)));
    }

    #[test]
    fn display_renders_nested_values() {
        let seq = SeqData::new();
        seq.push(Value::Int(1));
        seq.push(Value::from("two"));
        assert_eq!(Value::Seq(seq).to_string(), r#"[1, "two"]"#);
    }
}
