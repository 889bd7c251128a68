use vc_os::sync::Arc;
use vc_utils::hash::HashMap;

use crate::context::{DebugContext, ExternalResolvers, SerializationConfig};
use crate::context::{SerializationPolicy, TypeBinder};
use crate::value::{Guid, ObjectRef};

/// Session state of a reader.
///
/// An id may be bound to `None`: a node whose value was discarded still
/// occupies its id, and references to it resolve to null.
#[derive(Debug, Default)]
pub struct DeserializationContext {
    config: SerializationConfig,
    externals: ExternalResolvers,
    internal_references: HashMap<i32, Option<ObjectRef>>,
}

impl DeserializationContext {
    pub fn new(config: SerializationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_externals(mut self, externals: ExternalResolvers) -> Self {
        self.externals = externals;
        self
    }

    #[inline]
    pub fn config(&self) -> &SerializationConfig {
        &self.config
    }

    #[inline]
    pub fn set_config(&mut self, config: SerializationConfig) {
        self.config = config;
    }

    #[inline]
    pub fn policy(&self) -> &Arc<SerializationPolicy> {
        self.config.policy()
    }

    #[inline]
    pub fn binder(&self) -> &dyn TypeBinder {
        self.config.binder()
    }

    #[inline]
    pub fn debug(&self) -> &DebugContext {
        self.config.debug()
    }

    #[inline]
    pub fn externals(&self) -> &ExternalResolvers {
        &self.externals
    }

    #[inline]
    pub fn externals_mut(&mut self) -> &mut ExternalResolvers {
        &mut self.externals
    }

    /// Binds `id` to `object`, replacing any previous binding.
    ///
    /// Called as soon as a node's id is known, before its members are read,
    /// so that cycles resolve to the object under construction.
    pub fn register_internal_reference(&mut self, id: i32, object: Option<ObjectRef>) {
        self.internal_references.insert(id, object);
    }

    /// Returns the object bound to `id`, `None` if unbound or bound to null.
    pub fn internal_reference(&self, id: i32) -> Option<ObjectRef> {
        self.internal_references.get(&id).cloned().flatten()
    }

    /// Returns `true` if `id` was bound in this session, even to null.
    pub fn has_internal_reference(&self, id: i32) -> bool {
        self.internal_references.contains_key(&id)
    }

    #[inline]
    pub fn internal_reference_count(&self) -> usize {
        self.internal_references.len()
    }

    pub fn external_object_by_index(&self, index: i32) -> Option<ObjectRef> {
        self.externals.resolve_index(index)
    }

    pub fn external_object_by_guid(&self, guid: Guid) -> Option<ObjectRef> {
        self.externals.resolve_guid(guid)
    }

    pub fn external_object_by_string(&self, key: &str) -> Option<ObjectRef> {
        self.externals.resolve_string(key)
    }

    /// Forgets every bound id. Configuration and resolvers are kept.
    pub fn prepare_new_session(&mut self) {
        self.internal_references.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::DeserializationContext;
    use crate::value::ObjectRef;

    #[test]
    fn null_bindings_occupy_ids() {
        let mut context = DeserializationContext::default();
        let object = ObjectRef::from_value(7_u8);
        context.register_internal_reference(0, Some(object.clone()));
        context.register_internal_reference(1, None);

        assert!(context.internal_reference(0).unwrap().ptr_eq(&object));
        assert!(context.internal_reference(1).is_none());
        assert!(context.has_internal_reference(1));
        assert!(context.internal_reference(2).is_none());
        assert_eq!(context.internal_reference_count(), 2);
    }
}
