use alloc::vec::Vec;

use vc_os::sync::Arc;
use vc_utils::hash::AddressMap;

use crate::context::{DebugContext, ExternalReference, ExternalResolvers};
use crate::context::{SerializationConfig, SerializationPolicy, TypeBinder};
use crate::value::ObjectRef;

// -----------------------------------------------------------------------------
// InternalReference

/// Outcome of [`SerializationContext::try_register_internal_reference`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InternalReference {
    /// First sighting in this session; the object is written in full.
    New(i32),
    /// Already written; only a reference entry is written.
    Existing(i32),
}

impl InternalReference {
    #[inline]
    pub fn id(self) -> i32 {
        match self {
            Self::New(id) | Self::Existing(id) => id,
        }
    }
}

// -----------------------------------------------------------------------------
// SerializationContext

/// Session state of a writer.
///
/// Objects are identified by address. Every registered object is kept
/// alive until the session ends so an address is never reused for a
/// different object within one session.
#[derive(Debug, Default)]
pub struct SerializationContext {
    config: SerializationConfig,
    externals: ExternalResolvers,
    internal_ids: AddressMap<i32>,
    registered: Vec<ObjectRef>,
}

impl SerializationContext {
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

    /// Registers `object` by identity.
    ///
    /// Ids are assigned from 0 in registration order.
    pub fn try_register_internal_reference(&mut self, object: &ObjectRef) -> InternalReference {
        if let Some(&id) = self.internal_ids.get(&object.address()) {
            return InternalReference::Existing(id);
        }
        let id = self.registered.len() as i32;
        self.internal_ids.insert(object.address(), id);
        self.registered.push(object.clone());
        InternalReference::New(id)
    }

    /// Asks the external resolvers for a key of `object`.
    #[inline]
    pub fn try_register_external_reference(&self, object: &ObjectRef) -> Option<ExternalReference> {
        self.externals.reference_of(object)
    }

    /// Returns the id `object` was registered under in this session.
    pub fn internal_id_of(&self, object: &ObjectRef) -> Option<i32> {
        self.internal_ids.get(&object.address()).copied()
    }

    /// The number of objects registered in this session.
    #[inline]
    pub fn internal_reference_count(&self) -> usize {
        self.registered.len()
    }

    /// Forgets every registered object. Configuration and resolvers are kept.
    pub fn prepare_new_session(&mut self) {
        self.internal_ids.clear();
        self.registered.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{InternalReference, SerializationContext};
    use crate::value::ObjectRef;

    #[test]
    fn identity_decides_registration() {
        let mut context = SerializationContext::default();
        let a = ObjectRef::from_value(1_i32);
        let b = ObjectRef::from_value(1_i32);

        assert_eq!(context.try_register_internal_reference(&a), InternalReference::New(0));
        assert_eq!(context.try_register_internal_reference(&b), InternalReference::New(1));
        assert_eq!(
            context.try_register_internal_reference(&a.clone()),
            InternalReference::Existing(0)
        );
        assert_eq!(context.internal_reference_count(), 2);

        context.prepare_new_session();
        assert_eq!(context.internal_id_of(&a), None);
        assert_eq!(context.try_register_internal_reference(&b), InternalReference::New(0));
    }
}
