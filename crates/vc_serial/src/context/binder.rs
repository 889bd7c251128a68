use alloc::string::String;

use crate::context::DebugContext;
use crate::info::TypeInfo;
use crate::registry::TypeRegistryArc;

// -----------------------------------------------------------------------------
// TypeBinder

/// A bidirectional mapping between types and the names written to streams.
///
/// Must be deterministic and reversible for every type a stream references.
pub trait TypeBinder: Send + Sync {
    /// Returns the name `ty` is written as.
    fn bind_to_name(&self, ty: &'static TypeInfo, debug: &DebugContext) -> String;

    /// Resolves a written name, `None` if no type is known under it.
    fn bind_to_type(&self, name: &str, debug: &DebugContext) -> Option<&'static TypeInfo>;

    /// Returns `true` if `name` resolves to a type.
    fn contains_type(&self, name: &str) -> bool;
}

// -----------------------------------------------------------------------------
// DefaultTypeBinder

/// Binds types by their full [`type_path`](TypeInfo::type_path) through a
/// [`TypeRegistry`](crate::registry::TypeRegistry).
///
/// Names are resolved by full path first, then by unambiguous short name.
/// Binding a type to a name registers it, so every type written by a
/// process can be read back by the same process.
#[derive(Clone, Debug)]
pub struct DefaultTypeBinder {
    registry: TypeRegistryArc,
}

impl Default for DefaultTypeBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultTypeBinder {
    /// Creates a binder over the process-wide registry.
    pub fn new() -> Self {
        Self {
            registry: TypeRegistryArc::global(),
        }
    }

    /// Creates a binder over `registry`.
    pub fn with_registry(registry: TypeRegistryArc) -> Self {
        Self { registry }
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistryArc {
        &self.registry
    }
}

impl TypeBinder for DefaultTypeBinder {
    fn bind_to_name(&self, ty: &'static TypeInfo, _debug: &DebugContext) -> String {
        if !self.registry.read().contains(ty.type_id()) {
            self.registry.write().register_info(ty);
        }
        String::from(ty.type_path())
    }

    fn bind_to_type(&self, name: &str, debug: &DebugContext) -> Option<&'static TypeInfo> {
        let registry = self.registry.read();
        let found = registry
            .get_with_type_path(name)
            .or_else(|| registry.get_with_type_name(name))
            .map(|meta| meta.type_info());
        if found.is_none() {
            debug.log_warning(format_args!("no type named `{name}` could be found"));
        }
        found
    }

    fn contains_type(&self, name: &str) -> bool {
        let registry = self.registry.read();
        registry.get_with_type_path(name).is_some() || registry.get_with_type_name(name).is_some()
    }
}
