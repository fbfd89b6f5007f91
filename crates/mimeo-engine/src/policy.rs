//! Per-field cloning-policy hooks.
//!
//! Policies are the sole extension point for overriding the default
//! recursive-clone decision for specific (owner, field) pairs — e.g.
//! "never clone this logger handle, reuse it". The engine consults its
//! policy chain in order and uses the first non-default answer; the chain
//! is fixed at engine construction.

use std::sync::Arc;

use mimeo_core::{FieldDescriptor, ObjectData};

/// Decision for one (owner, field) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Decision {
    /// Default: recurse into the engine for this field's value.
    #[default]
    Recurse,
    /// Write the absent value instead of a clone.
    SubstituteNull,
    /// Write the original field value unchanged (shared with the source).
    ReuseSameInstance,
    /// Leave the field at its allocator-provided default.
    Ignore,
}

/// A caller-supplied cloning policy.
pub trait ClonePolicy: Send + Sync {
    /// Decide how to copy `field` of `owner`. Returning
    /// [`Decision::Recurse`] defers to later policies in the chain.
    fn decide(&self, owner: &Arc<ObjectData>, field: &FieldDescriptor) -> Decision;
}

/// Ready-made policy matching a single (type name, field name) pair.
pub struct FieldPolicy {
    type_name: Arc<str>,
    field: Arc<str>,
    decision: Decision,
}

impl FieldPolicy {
    /// Apply `decision` to field `field` of type `type_name`.
    pub fn new(type_name: &str, field: &str, decision: Decision) -> Arc<Self> {
        Arc::new(Self {
            type_name: type_name.into(),
            field: field.into(),
            decision,
        })
    }
}

impl ClonePolicy for FieldPolicy {
    fn decide(&self, owner: &Arc<ObjectData>, field: &FieldDescriptor) -> Decision {
        if owner.type_name() == self.type_name.as_ref() && field.name == self.field {
            self.decision
        } else {
            Decision::Recurse
        }
    }
}
