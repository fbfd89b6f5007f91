//! Deep-clone engine.
//!
//! Key properties:
//! - Handles circular references: a visited map keyed by heap identity is
//!   consulted before any allocation, and every container records its copy
//!   *before* populating children
//! - Preserves reference identity within one clone operation: shared
//!   substructure in the source stays shared in the copy
//! - Fails loudly on non-cloneable values instead of handing back aliases
//!
//! The visited map is owned by one top-level `deep_clone` call and
//! discarded at its end; the per-type caches are shared across calls and
//! safe to populate concurrently, so one engine serves many threads.

use std::sync::Arc;

use mimeo_core::{
    ArrayData, MapData, MapVariant, ObjectData, SeqData, SetData, SetVariant, TypeRegistry, Value,
};
use rustc_hash::FxHashMap;

use crate::alloc::{Instantiator, RawAllocator};
use crate::classify::{Kind, classify};
use crate::cloner::{Cloner, ClonerCache, CompositeCloner};
use crate::error::{CloneError, CloneResult};
use crate::policy::{ClonePolicy, Decision};

/// Source identity → its copy, scoped to one top-level clone call.
type VisitedMap = FxHashMap<usize, Value>;

/// The deep-copy engine. Construct once (via [`Engine::new`] or
/// [`Engine::builder`]) and reuse across calls; per-type resolution is
/// cached for the engine's lifetime.
pub struct Engine {
    registry: Arc<TypeRegistry>,
    instantiator: Box<dyn Instantiator>,
    policies: Vec<Arc<dyn ClonePolicy>>,
    cloners: ClonerCache,
}

/// Builder for [`Engine`]. The policy chain and instantiator are fixed at
/// build time; there is no post-construction mutation to tear under
/// concurrent use.
pub struct EngineBuilder {
    registry: Arc<TypeRegistry>,
    instantiator: Box<dyn Instantiator>,
    policies: Vec<Arc<dyn ClonePolicy>>,
}

impl EngineBuilder {
    /// Replace the default [`RawAllocator`].
    pub fn instantiator(mut self, instantiator: Box<dyn Instantiator>) -> Self {
        self.instantiator = instantiator;
        self
    }

    /// Append a policy to the chain. Policies are consulted in the order
    /// they were added; the first non-default decision wins.
    pub fn policy(mut self, policy: Arc<dyn ClonePolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    /// Finish construction.
    pub fn build(self) -> Engine {
        Engine {
            registry: self.registry,
            instantiator: self.instantiator,
            policies: self.policies,
            cloners: ClonerCache::new(),
        }
    }
}

impl Engine {
    /// Engine with the default raw allocator and no policies.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::builder(registry).build()
    }

    /// Start building an engine over `registry`.
    pub fn builder(registry: Arc<TypeRegistry>) -> EngineBuilder {
        EngineBuilder {
            registry,
            instantiator: Box::new(RawAllocator),
            policies: Vec::new(),
        }
    }

    /// The registry this engine resolves types against.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Deep-copy `value`: the result shares no mutable substructure with
    /// the source, while cyclic and shared substructure *within* the source
    /// is reproduced as equivalent cyclic/shared structure in the copy.
    ///
    /// Recursion depth is bounded by the source graph's depth (cycles are
    /// resolved through the visited map, but a deep non-cyclic chain can
    /// still exhaust the stack). Callers needing a bound must limit graph
    /// size before invoking.
    pub fn deep_clone(&self, value: &Value) -> CloneResult<Value> {
        let mut visited = VisitedMap::default();
        self.clone_inner(value, &mut visited)
    }

    fn clone_inner(&self, value: &Value, visited: &mut VisitedMap) -> CloneResult<Value> {
        // Terminal kinds carry no mutable state; return them as-is with no
        // visited-map entry.
        if matches!(classify(value), Kind::Scalar | Kind::EnumConst) {
            return Ok(value.clone());
        }

        // Cycle/sharing resolution. Must precede any allocation so that
        // cyclic structures terminate.
        if let Some(copy) = value.heap_addr().and_then(|addr| visited.get(&addr)) {
            return Ok(copy.clone());
        }

        match value {
            Value::Array(src) => self.clone_array(src, visited),
            Value::Seq(src) => self.clone_seq(src, visited),
            Value::Set(src) => self.clone_set(src, visited),
            Value::Map(src) => self.clone_map(src, visited),
            Value::Object(src) => self.clone_composite(src, visited),
            Value::Handle(h) => Err(CloneError::unsupported(format!(
                "opaque handle `{}`",
                h.name()
            ))),
            // Scalars and enums already returned above
            other => Ok(other.clone()),
        }
    }

    fn clone_array(&self, src: &Arc<ArrayData>, visited: &mut VisitedMap) -> CloneResult<Value> {
        let dst = ArrayData::new(src.kind(), src.len());
        let copy = Value::Array(dst.clone());
        visited.insert(Arc::as_ptr(src) as usize, copy.clone());

        if src.kind().is_scalar() {
            // Scalar elements need no recursive cloning; copy in bulk.
            dst.copy_from(src)?;
        } else {
            for (i, elem) in src.snapshot().into_iter().enumerate() {
                let cloned = self.clone_inner(&elem, visited)?;
                dst.set(i, cloned)?;
            }
        }
        Ok(copy)
    }

    fn clone_seq(&self, src: &Arc<SeqData>, visited: &mut VisitedMap) -> CloneResult<Value> {
        let dst = SeqData::new();
        let copy = Value::Seq(dst.clone());
        visited.insert(Arc::as_ptr(src) as usize, copy.clone());

        for elem in src.snapshot() {
            let cloned = self.clone_inner(&elem, visited)?;
            // Elements whose clone resolves to absent are skipped
            if !cloned.is_null() {
                dst.push(cloned);
            }
        }
        Ok(copy)
    }

    fn clone_set(&self, src: &Arc<SetData>, visited: &mut VisitedMap) -> CloneResult<Value> {
        // The copy must structurally match the source's variant
        let dst = match src.variant() {
            SetVariant::Unordered => SetData::unordered(),
            SetVariant::Sorted => SetData::sorted(),
        };
        let copy = Value::Set(dst.clone());
        visited.insert(Arc::as_ptr(src) as usize, copy.clone());

        for elem in src.snapshot() {
            let cloned = self.clone_inner(&elem, visited)?;
            if !cloned.is_null() {
                dst.insert(cloned);
            }
        }
        Ok(copy)
    }

    fn clone_map(&self, src: &Arc<MapData>, visited: &mut VisitedMap) -> CloneResult<Value> {
        let dst = match src.variant() {
            MapVariant::Unordered => MapData::unordered(),
            MapVariant::Sorted => MapData::sorted(),
        };
        let copy = Value::Map(dst.clone());
        visited.insert(Arc::as_ptr(src) as usize, copy.clone());

        for (key, value) in src.entries() {
            let new_key = self.clone_inner(&key, visited)?;
            let new_value = self.clone_inner(&value, visited)?;
            dst.insert(new_key, new_value);
        }
        Ok(copy)
    }

    fn clone_composite(
        &self,
        src: &Arc<ObjectData>,
        visited: &mut VisitedMap,
    ) -> CloneResult<Value> {
        let cloner = self.cloners.resolve(&self.registry, src.tag())?;
        match &*cloner {
            Cloner::Ignore => Ok(Value::Object(src.clone())),
            Cloner::Null => Ok(Value::Null),
            Cloner::Freezable(plan) => {
                if src.is_frozen() {
                    // An immutable snapshot needs no duplication
                    Ok(Value::Object(src.clone()))
                } else {
                    self.clone_fields(plan, src, visited)
                }
            }
            Cloner::Composite(plan) => self.clone_fields(plan, src, visited),
        }
    }

    fn clone_fields(
        &self,
        plan: &CompositeCloner,
        src: &Arc<ObjectData>,
        visited: &mut VisitedMap,
    ) -> CloneResult<Value> {
        let dst = self.instantiator.allocate(&self.registry, src.tag())?;
        let copy = Value::Object(dst.clone());
        // Record before any field is copied, so self-referential fields
        // resolve to this copy
        visited.insert(Arc::as_ptr(src) as usize, copy.clone());

        self.populate(plan, src, &dst, visited)
            .map_err(CloneError::traversal)?;
        Ok(copy)
    }

    fn populate(
        &self,
        plan: &CompositeCloner,
        src: &Arc<ObjectData>,
        dst: &Arc<ObjectData>,
        visited: &mut VisitedMap,
    ) -> CloneResult<()> {
        for field in plan.fields.iter() {
            let current = src
                .get(field.slot)
                .ok_or_else(|| CloneError::field_access(src.type_name(), field.name.as_ref()))?;

            let next = if field.null_instead {
                Value::Null
            } else {
                match self.decide(src, field) {
                    Decision::Recurse => self.clone_inner(&current, visited)?,
                    Decision::SubstituteNull => Value::Null,
                    Decision::ReuseSameInstance => current,
                    Decision::Ignore => continue,
                }
            };
            dst.set(field.slot, next)
                .map_err(|_| CloneError::field_access(dst.type_name(), field.name.as_ref()))?;
        }
        Ok(())
    }

    /// First non-default policy answer wins; an empty chain means the
    /// default recursive clone.
    fn decide(
        &self,
        owner: &Arc<ObjectData>,
        field: &mimeo_core::FieldDescriptor,
    ) -> Decision {
        for policy in &self.policies {
            let decision = policy.decide(owner, field);
            if decision != Decision::Recurse {
                return decision;
            }
        }
        Decision::Recurse
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Engine(policies={})", self.policies.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimeo_core::TypeSpec;

    fn student_registry() -> (Arc<TypeRegistry>, mimeo_core::TypeTag) {
        let registry = TypeRegistry::new();
        let tag = registry
            .register(
                TypeSpec::new("Student")
                    .field("name")
                    .field("age")
                    .field("friends"),
            )
            .unwrap();
        (Arc::new(registry), tag)
    }

    fn student(
        registry: &TypeRegistry,
        tag: mimeo_core::TypeTag,
        name: &str,
        age: i64,
    ) -> Arc<ObjectData> {
        registry
            .new_object(
                tag,
                vec![
                    Value::from(name),
                    Value::Int(age),
                    Value::Seq(SeqData::new()),
                ],
            )
            .unwrap()
    }

    #[test]
    fn clone_scalars_returns_them_unchanged() {
        let (registry, _) = student_registry();
        let engine = Engine::new(registry);
        assert_eq!(engine.deep_clone(&Value::Null).unwrap(), Value::Null);
        assert_eq!(engine.deep_clone(&Value::Int(42)).unwrap(), Value::Int(42));
        assert_eq!(
            engine.deep_clone(&Value::Float(3.14159)).unwrap(),
            Value::Float(3.14159)
        );
        let s = Value::from("hello");
        assert_eq!(engine.deep_clone(&s).unwrap(), s);
    }

    #[test]
    fn clone_composite_is_a_distinct_equal_instance() {
        let (registry, tag) = student_registry();
        let engine = Engine::new(registry.clone());
        let src = student(&registry, tag, "Bob", 21);
        let original = Value::Object(src.clone());

        let copy = engine.deep_clone(&original).unwrap();
        assert!(!copy.same_instance(&original));
        assert_eq!(copy, original);

        // Mutating the copy must not touch the source
        let copied = copy.as_object().unwrap();
        copied.set_field("name", Value::from("Viktor")).unwrap();
        assert_eq!(src.get_field("name"), Some(Value::from("Bob")));
    }

    #[test]
    fn mutual_cycle_is_shape_preserved() {
        let (registry, tag) = student_registry();
        let engine = Engine::new(registry.clone());

        let sasha = student(&registry, tag, "Sasha", 20);
        let masha = student(&registry, tag, "Masha", 20);
        sasha
            .get_field("friends")
            .unwrap()
            .as_seq()
            .unwrap()
            .push(Value::Object(masha.clone()));
        masha
            .get_field("friends")
            .unwrap()
            .as_seq()
            .unwrap()
            .push(Value::Object(sasha.clone()));

        let copy = engine.deep_clone(&Value::Object(sasha)).unwrap();
        let copy_masha = copy
            .as_object()
            .unwrap()
            .get_field("friends")
            .unwrap()
            .as_seq()
            .unwrap()
            .get(0)
            .unwrap();
        let back = copy_masha
            .as_object()
            .unwrap()
            .get_field("friends")
            .unwrap()
            .as_seq()
            .unwrap()
            .get(0)
            .unwrap();
        // Traversing the cycle in the copy lands back on the copy itself
        assert!(back.same_instance(&copy));
    }

    #[test]
    fn self_referential_sequence_terminates() {
        let (registry, _) = student_registry();
        let engine = Engine::new(registry);

        let seq = SeqData::new();
        seq.push(Value::Seq(seq.clone()));
        let copy = engine.deep_clone(&Value::Seq(seq)).unwrap();
        let inner = copy.as_seq().unwrap().get(0).unwrap();
        assert!(inner.same_instance(&copy));
    }

    #[test]
    fn opaque_handles_fail_loudly() {
        let (registry, _) = student_registry();
        let engine = Engine::new(registry);
        let handle = Value::Handle(mimeo_core::OpaqueHandle::new("logger"));
        assert!(matches!(
            engine.deep_clone(&handle),
            Err(CloneError::Unsupported(_))
        ));
    }

    #[test]
    fn concurrent_clones_share_one_engine() {
        let (registry, tag) = student_registry();
        let engine = Engine::new(registry.clone());

        std::thread::scope(|scope| {
            for i in 0..4i64 {
                let engine = &engine;
                let registry = &registry;
                scope.spawn(move || {
                    let src = student(registry, tag, "Worker", i);
                    let original = Value::Object(src);
                    for _ in 0..100 {
                        let copy = engine.deep_clone(&original).unwrap();
                        assert_eq!(copy, original);
                        assert!(!copy.same_instance(&original));
                    }
                });
            }
        });
    }
}
