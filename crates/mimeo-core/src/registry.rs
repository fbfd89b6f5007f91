//! Type registry: composite layouts and cloning metadata.
//!
//! Rust has no runtime reflection, so composite types are described to the
//! engine up front: a `TypeSpec` names a type's fields (in declaration
//! order), its optional parent, and its cloning metadata — the immutability
//! marker (optionally applying to subtypes), the freezable capability, and
//! per-field "substitute null instead of cloning" markers. Registered types
//! are immutable for the registry's lifetime.
//!
//! The registry also hosts the field introspector: `fields_of` flattens a
//! type's inheritance chain into an ordered field list and caches the
//! result per tag. Caches are concurrent maps with publish-once semantics;
//! redundant computation under a racing first access is acceptable,
//! corruption is not.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;

use crate::error::{CoreError, CoreResult};
use crate::object::ObjectData;
use crate::value::Value;

/// Opaque handle to a registered composite type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag(u32);

impl TypeTag {
    /// Raw numeric id, for diagnostics.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Type-level immutability marker: instances need not be copied.
#[derive(Clone, Copy, Debug)]
pub struct ImmutableMarker {
    /// Does the marker also cover subtypes of the marked type?
    pub applies_to_subtypes: bool,
}

/// One declared field of a composite type.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    name: Arc<str>,
    null_instead: bool,
}

/// Builder for registering a composite type.
#[derive(Debug)]
pub struct TypeSpec {
    name: Arc<str>,
    parent: Option<TypeTag>,
    fields: Vec<FieldSpec>,
    immutable: Option<ImmutableMarker>,
    freezable: bool,
    substitute_null: bool,
    is_abstract: bool,
}

impl TypeSpec {
    /// Start a spec for a type called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            immutable: None,
            freezable: false,
            substitute_null: false,
            is_abstract: false,
        }
    }

    /// Set the parent type; this type inherits the parent's field slots.
    pub fn parent(mut self, parent: TypeTag) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Declare an instance field. Declaration order is preserved.
    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            null_instead: false,
        });
        self
    }

    /// Declare a field that is never cloned: copies get `Null` instead.
    pub fn field_null_instead(mut self, name: &str) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            null_instead: true,
        });
        self
    }

    /// Mark the type immutable: cloning returns the original reference.
    pub fn immutable(mut self, applies_to_subtypes: bool) -> Self {
        self.immutable = Some(ImmutableMarker {
            applies_to_subtypes,
        });
        self
    }

    /// Mark the type freezable: instances can report a frozen state that
    /// short-circuits cloning.
    pub fn freezable(mut self) -> Self {
        self.freezable = true;
        self
    }

    /// Mark the type as "substitute null": cloning any instance yields the
    /// absent value.
    pub fn substitute_null(mut self) -> Self {
        self.substitute_null = true;
        self
    }

    /// Mark the type abstract: it cannot be instantiated, only inherited.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

/// Resolved, immutable description of a registered type.
#[derive(Debug)]
pub struct TypeInfo {
    tag: TypeTag,
    name: Arc<str>,
    parent: Option<Arc<TypeInfo>>,
    declared: Box<[FieldSpec]>,
    /// Slot index where this type's own fields start (parents first).
    base_slot: usize,
    /// Total slot count including inherited fields.
    slot_count: usize,
    immutable: Option<ImmutableMarker>,
    freezable: bool,
    substitute_null: bool,
    is_abstract: bool,
}

impl TypeInfo {
    /// Registry tag of this type.
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent type, if any.
    pub fn parent(&self) -> Option<&Arc<TypeInfo>> {
        self.parent.as_ref()
    }

    /// Immutability marker, if any.
    pub fn immutable(&self) -> Option<ImmutableMarker> {
        self.immutable
    }

    /// Does this type opt into the freezable capability?
    pub fn freezable(&self) -> bool {
        self.freezable
    }

    /// Is this type marked "substitute null on clone"?
    pub fn substitute_null(&self) -> bool {
        self.substitute_null
    }

    /// Is this type abstract?
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Total slot count across the inheritance chain.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Name of the field stored at `slot`, searching the chain.
    pub fn field_name(&self, slot: usize) -> Option<&str> {
        let mut level = Some(self);
        while let Some(info) = level {
            if slot >= info.base_slot {
                return info
                    .declared
                    .get(slot - info.base_slot)
                    .map(|f| f.name.as_ref());
            }
            level = info.parent.as_deref();
        }
        None
    }

    /// Slot index of the field called `name`, searching the chain from the
    /// most-derived level down.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        let mut level = Some(self);
        while let Some(info) = level {
            for (i, field) in info.declared.iter().enumerate() {
                if field.name.as_ref() == name {
                    return Some(info.base_slot + i);
                }
            }
            level = info.parent.as_deref();
        }
        None
    }
}

/// One entry of the field introspector's output: a field, its slot, and its
/// field-level cloning marker.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// Type (in the chain) that declares this field.
    pub owner: TypeTag,
    /// Field name.
    pub name: Arc<str>,
    /// Slot index in the instance layout.
    pub slot: usize,
    /// Substitute `Null` instead of cloning this field.
    pub null_instead: bool,
}

/// An enumerated constant. Constants are process-wide singletons; copying
/// one must return the same instance.
#[derive(Debug)]
pub struct EnumConstant {
    type_name: Arc<str>,
    name: Arc<str>,
    ordinal: u32,
}

impl EnumConstant {
    /// Name of the enumerated type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Constant name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position within the enumeration.
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }
}

impl std::fmt::Display for EnumConstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.type_name, self.name)
    }
}

/// The type registry. Owns every registered type, enum definition, and the
/// field-introspection cache. Constructed once and shared; all caches
/// tolerate concurrent first population.
pub struct TypeRegistry {
    types: DashMap<TypeTag, Arc<TypeInfo>>,
    by_name: DashMap<Arc<str>, TypeTag>,
    enums: DashMap<Arc<str>, Arc<[Arc<EnumConstant>]>>,
    fields: DashMap<TypeTag, Arc<[FieldDescriptor]>>,
    next_tag: AtomicU32,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
            by_name: DashMap::new(),
            enums: DashMap::new(),
            fields: DashMap::new(),
            next_tag: AtomicU32::new(0),
        }
    }

    /// Register a composite type. Fails on duplicate names and unknown
    /// parents.
    pub fn register(&self, spec: TypeSpec) -> CoreResult<TypeTag> {
        let parent = match spec.parent {
            Some(tag) => Some(
                self.types
                    .get(&tag)
                    .map(|e| e.value().clone())
                    .ok_or_else(|| CoreError::UnknownParent(spec.name.to_string()))?,
            ),
            None => None,
        };
        if self.by_name.contains_key(&spec.name) {
            return Err(CoreError::DuplicateType(spec.name.to_string()));
        }

        let base_slot = parent.as_ref().map_or(0, |p| p.slot_count);
        let tag = TypeTag(self.next_tag.fetch_add(1, Ordering::Relaxed));
        let info = Arc::new(TypeInfo {
            tag,
            name: spec.name.clone(),
            parent,
            base_slot,
            slot_count: base_slot + spec.fields.len(),
            declared: spec.fields.into_boxed_slice(),
            immutable: spec.immutable,
            freezable: spec.freezable,
            substitute_null: spec.substitute_null,
            is_abstract: spec.is_abstract,
        });
        self.types.insert(tag, info);
        self.by_name.insert(spec.name, tag);
        Ok(tag)
    }

    /// Look up a registered type by tag.
    pub fn get(&self, tag: TypeTag) -> CoreResult<Arc<TypeInfo>> {
        self.types
            .get(&tag)
            .map(|e| e.value().clone())
            .ok_or(CoreError::UnknownType(tag.0))
    }

    /// Look up a registered type by name.
    pub fn lookup(&self, name: &str) -> Option<TypeTag> {
        self.by_name.get(name).map(|e| *e.value())
    }

    /// Define an enumerated type and return its constants as values.
    pub fn define_enum(&self, name: &str, constants: &[&str]) -> CoreResult<Vec<Value>> {
        let type_name: Arc<str> = name.into();
        if self.enums.contains_key(&type_name) {
            return Err(CoreError::DuplicateType(name.to_string()));
        }
        let built: Arc<[Arc<EnumConstant>]> = constants
            .iter()
            .enumerate()
            .map(|(i, c)| {
                Arc::new(EnumConstant {
                    type_name: type_name.clone(),
                    name: (*c).into(),
                    ordinal: i as u32,
                })
            })
            .collect();
        let published = self
            .enums
            .entry(type_name)
            .or_insert(built)
            .value()
            .clone();
        Ok(published.iter().cloned().map(Value::Enum).collect())
    }

    /// Field introspector: the flattened instance-field list of `tag`
    /// across its inheritance chain — most-derived type first, declaration
    /// order within each type. Cached per tag.
    pub fn fields_of(&self, tag: TypeTag) -> CoreResult<Arc<[FieldDescriptor]>> {
        if let Some(cached) = self.fields.get(&tag) {
            return Ok(cached.value().clone());
        }
        // Compute outside the cache entry, then publish-if-absent; a racing
        // thread may compute redundantly but both produce identical lists.
        let info = self.get(tag)?;
        let mut out = Vec::with_capacity(info.slot_count);
        let mut level = Some(info.as_ref());
        while let Some(current) = level {
            for (i, field) in current.declared.iter().enumerate() {
                out.push(FieldDescriptor {
                    owner: current.tag,
                    name: field.name.clone(),
                    slot: current.base_slot + i,
                    null_instead: field.null_instead,
                });
            }
            level = current.parent.as_deref();
        }
        let computed: Arc<[FieldDescriptor]> = out.into();
        Ok(self.fields.entry(tag).or_insert(computed).value().clone())
    }

    /// Construct an instance through the registry, supplying every field
    /// slot in layout order (inherited slots first). This is the ordinary
    /// construction path; the cloning engine bypasses it.
    pub fn new_object(&self, tag: TypeTag, values: Vec<Value>) -> CoreResult<Arc<ObjectData>> {
        let info = self.get(tag)?;
        if info.is_abstract {
            return Err(CoreError::AbstractType(info.name.to_string()));
        }
        if values.len() != info.slot_count {
            return Err(CoreError::FieldArity {
                type_name: info.name.to_string(),
                expected: info.slot_count,
                got: values.len(),
            });
        }
        Ok(ObjectData::with_slots(info, values))
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TypeRegistry(types={}, enums={})",
            self.types.len(),
            self.enums.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_introspection_is_most_derived_first() {
        let registry = TypeRegistry::new();
        let base = registry
            .register(TypeSpec::new("Base").field("id").field("created"))
            .unwrap();
        let derived = registry
            .register(TypeSpec::new("Derived").parent(base).field("name"))
            .unwrap();

        let fields = registry.fields_of(derived).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_ref()).collect();
        assert_eq!(names, vec!["name", "id", "created"]);
        // Slot layout extends the parent's root-first
        assert_eq!(fields[0].slot, 2);
        assert_eq!(fields[1].slot, 0);
        assert_eq!(fields[2].slot, 1);
        assert_eq!(fields[0].owner, derived);
        assert_eq!(fields[1].owner, base);
    }

    #[test]
    fn fields_of_is_cached() {
        let registry = TypeRegistry::new();
        let tag = registry.register(TypeSpec::new("T").field("x")).unwrap();
        let a = registry.fields_of(tag).unwrap();
        let b = registry.fields_of(tag).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = TypeRegistry::new();
        registry.register(TypeSpec::new("T")).unwrap();
        assert!(matches!(
            registry.register(TypeSpec::new("T")),
            Err(CoreError::DuplicateType(_))
        ));
    }

    #[test]
    fn abstract_types_cannot_be_constructed() {
        let registry = TypeRegistry::new();
        let tag = registry
            .register(TypeSpec::new("Shape").abstract_type().field("origin"))
            .unwrap();
        assert!(matches!(
            registry.new_object(tag, vec![Value::Null]),
            Err(CoreError::AbstractType(_))
        ));
    }

    #[test]
    fn enum_constants_are_singletons() {
        let registry = TypeRegistry::new();
        let colors = registry.define_enum("Color", &["Red", "Green"]).unwrap();
        assert_eq!(colors.len(), 2);
        let red = colors[0].as_enum().unwrap();
        assert_eq!(red.type_name(), "Color");
        assert_eq!(red.name(), "Red");
        assert_eq!(red.ordinal(), 0);
        assert!(matches!(
            registry.define_enum("Color", &["Red"]),
            Err(CoreError::DuplicateType(_))
        ));
    }

    #[test]
    fn slot_lookup_by_name() {
        let registry = TypeRegistry::new();
        let base = registry.register(TypeSpec::new("B").field("a")).unwrap();
        let derived = registry
            .register(TypeSpec::new("D").parent(base).field("b"))
            .unwrap();
        let info = registry.get(derived).unwrap();
        assert_eq!(info.slot_of("a"), Some(0));
        assert_eq!(info.slot_of("b"), Some(1));
        assert_eq!(info.field_name(0), Some("a"));
        assert_eq!(info.field_name(1), Some("b"));
        assert_eq!(info.slot_of("missing"), None);
    }
}
