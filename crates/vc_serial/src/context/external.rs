use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

use crate::value::{Guid, ObjectRef};

// -----------------------------------------------------------------------------
// Resolvers

/// Host table mapping objects outside the graph to integer indices.
pub trait ExternalIndexResolver {
    /// Returns the index `object` is referenced by, `None` to serialize it inline.
    fn can_reference(&self, object: &ObjectRef) -> Option<i32>;

    /// Returns the object registered under `index`.
    fn try_resolve(&self, index: i32) -> Option<ObjectRef>;
}

/// Host table mapping objects outside the graph to guids.
pub trait ExternalGuidResolver {
    fn can_reference(&self, object: &ObjectRef) -> Option<Guid>;

    fn try_resolve(&self, guid: Guid) -> Option<ObjectRef>;
}

/// Host table mapping objects outside the graph to string keys.
pub trait ExternalStringResolver {
    fn can_reference(&self, object: &ObjectRef) -> Option<String>;

    fn try_resolve(&self, key: &str) -> Option<ObjectRef>;
}

// -----------------------------------------------------------------------------
// ExternalReference

/// The key an external object is written as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExternalReference {
    Index(i32),
    Guid(Guid),
    String(String),
}

// -----------------------------------------------------------------------------
// ExternalResolvers

/// The resolver set of a context. Resolvers are asked in the order
/// index, guid, string.
///
/// Resolvers hold live objects, so like the contexts they are confined to
/// the thread of their session.
#[derive(Clone, Default)]
pub struct ExternalResolvers {
    pub index: Option<Rc<dyn ExternalIndexResolver>>,
    pub guid: Option<Rc<dyn ExternalGuidResolver>>,
    pub string: Option<Rc<dyn ExternalStringResolver>>,
}

impl ExternalResolvers {
    /// Returns the external key of `object`, `None` if it lives in the graph.
    pub fn reference_of(&self, object: &ObjectRef) -> Option<ExternalReference> {
        if let Some(index) = self.index.as_ref().and_then(|r| r.can_reference(object)) {
            return Some(ExternalReference::Index(index));
        }
        if let Some(guid) = self.guid.as_ref().and_then(|r| r.can_reference(object)) {
            return Some(ExternalReference::Guid(guid));
        }
        self.string
            .as_ref()
            .and_then(|r| r.can_reference(object))
            .map(ExternalReference::String)
    }

    pub fn resolve_index(&self, index: i32) -> Option<ObjectRef> {
        self.index.as_ref()?.try_resolve(index)
    }

    pub fn resolve_guid(&self, guid: Guid) -> Option<ObjectRef> {
        self.guid.as_ref()?.try_resolve(guid)
    }

    pub fn resolve_string(&self, key: &str) -> Option<ObjectRef> {
        self.string.as_ref()?.try_resolve(key)
    }
}

impl fmt::Debug for ExternalResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalResolvers")
            .field("index", &self.index.is_some())
            .field("guid", &self.guid.is_some())
            .field("string", &self.string.is_some())
            .finish()
    }
}
