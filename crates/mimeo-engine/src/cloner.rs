//! Per-type cloner resolution.
//!
//! Each composite type resolves once to a cloning strategy, memoized in a
//! concurrent map: at-least-once computation under a racing first access,
//! at-most-one observable entry per type. Enumerated constants and arrays
//! never reach this registry — the classifier routes them a layer above.

use std::sync::Arc;

use dashmap::DashMap;
use mimeo_core::{FieldDescriptor, TypeInfo, TypeRegistry, TypeTag};
use tracing::debug;

use crate::error::CloneResult;

/// Resolved cloning strategy for one composite type.
pub(crate) enum Cloner {
    /// Terminal: return the original reference (immutable types).
    Ignore,
    /// Terminal: return the absent value.
    Null,
    /// Check the frozen flag first; fall through to field-wise cloning for
    /// unfrozen instances.
    Freezable(CompositeCloner),
    /// Field-wise cloning through the raw allocator.
    Composite(CompositeCloner),
}

/// Field-wise cloning plan: the introspected field list of one type.
pub(crate) struct CompositeCloner {
    pub fields: Arc<[FieldDescriptor]>,
}

/// Memoized tag → cloner cache, plus the resolved immutability cache.
pub(crate) struct ClonerCache {
    cloners: DashMap<TypeTag, Arc<Cloner>>,
    immutables: DashMap<TypeTag, bool>,
}

impl ClonerCache {
    pub fn new() -> Self {
        Self {
            cloners: DashMap::new(),
            immutables: DashMap::new(),
        }
    }

    /// Resolve the cloner for `tag`, building and publishing it on first
    /// use. Racing builders may do redundant work; the first published
    /// entry wins.
    pub fn resolve(&self, registry: &TypeRegistry, tag: TypeTag) -> CloneResult<Arc<Cloner>> {
        if let Some(cached) = self.cloners.get(&tag) {
            return Ok(cached.value().clone());
        }
        let built = Arc::new(self.build(registry, tag)?);
        Ok(self.cloners.entry(tag).or_insert(built).value().clone())
    }

    fn build(&self, registry: &TypeRegistry, tag: TypeTag) -> CloneResult<Cloner> {
        let info = registry.get(tag)?;
        let cloner = if info.freezable() {
            Cloner::Freezable(self.composite(registry, tag)?)
        } else if self.is_immutable(&info) {
            Cloner::Ignore
        } else if info.substitute_null() {
            Cloner::Null
        } else {
            Cloner::Composite(self.composite(registry, tag)?)
        };
        debug!(
            type_name = info.name(),
            cloner = cloner.kind_name(),
            "resolved cloner"
        );
        Ok(cloner)
    }

    fn composite(&self, registry: &TypeRegistry, tag: TypeTag) -> CloneResult<CompositeCloner> {
        Ok(CompositeCloner {
            fields: registry.fields_of(tag)?,
        })
    }

    /// Is `info` immutable — marked directly, or covered by an ancestor's
    /// subtype-applying marker? Cached per tag.
    pub fn is_immutable(&self, info: &Arc<TypeInfo>) -> bool {
        if let Some(cached) = self.immutables.get(&info.tag()) {
            return *cached.value();
        }
        let mut resolved = info.immutable().is_some();
        if !resolved {
            let mut ancestor = info.parent();
            while let Some(level) = ancestor {
                if level
                    .immutable()
                    .is_some_and(|marker| marker.applies_to_subtypes)
                {
                    resolved = true;
                    break;
                }
                ancestor = level.parent();
            }
        }
        *self
            .immutables
            .entry(info.tag())
            .or_insert(resolved)
            .value()
    }
}

impl Cloner {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Null => "null",
            Self::Freezable(_) => "freezable",
            Self::Composite(_) => "composite",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimeo_core::TypeSpec;

    #[test]
    fn resolution_order_prefers_freezable() {
        let registry = TypeRegistry::new();
        // Freezable wins even when the type is also marked immutable
        let tag = registry
            .register(TypeSpec::new("Snapshot").freezable().immutable(false))
            .unwrap();
        let cache = ClonerCache::new();
        let cloner = cache.resolve(&registry, tag).unwrap();
        assert!(matches!(&*cloner, Cloner::Freezable(_)));
    }

    #[test]
    fn immutable_marker_resolves_to_ignore() {
        let registry = TypeRegistry::new();
        let tag = registry
            .register(TypeSpec::new("Config").immutable(false).field("path"))
            .unwrap();
        let cache = ClonerCache::new();
        assert!(matches!(
            &*cache.resolve(&registry, tag).unwrap(),
            Cloner::Ignore
        ));
    }

    #[test]
    fn subtype_applying_marker_is_inherited() {
        let registry = TypeRegistry::new();
        let base = registry
            .register(TypeSpec::new("FrozenBase").immutable(true))
            .unwrap();
        let child = registry
            .register(TypeSpec::new("Child").parent(base).field("x"))
            .unwrap();
        let grandchild = registry
            .register(TypeSpec::new("Grandchild").parent(child).field("y"))
            .unwrap();

        let cache = ClonerCache::new();
        assert!(matches!(
            &*cache.resolve(&registry, grandchild).unwrap(),
            Cloner::Ignore
        ));
    }

    #[test]
    fn non_subtype_marker_is_not_inherited() {
        let registry = TypeRegistry::new();
        let base = registry
            .register(TypeSpec::new("Base").immutable(false))
            .unwrap();
        let child = registry
            .register(TypeSpec::new("Child").parent(base).field("x"))
            .unwrap();

        let cache = ClonerCache::new();
        assert!(matches!(
            &*cache.resolve(&registry, child).unwrap(),
            Cloner::Composite(_)
        ));
    }

    #[test]
    fn resolution_is_memoized() {
        let registry = TypeRegistry::new();
        let tag = registry.register(TypeSpec::new("T").field("x")).unwrap();
        let cache = ClonerCache::new();
        let a = cache.resolve(&registry, tag).unwrap();
        let b = cache.resolve(&registry, tag).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
