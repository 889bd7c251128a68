use core::any::TypeId;
use core::fmt;

use vc_os::sync::{Arc, LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use vc_os::sync::{read_lock, write_lock};
use vc_utils::TypeIdMap;
use vc_utils::hash::{HashMap, HashSet};

use crate::info::{TypeInfo, Typed};
use crate::registry::type_meta::for_each_dependency;
use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeTrait, TypeTraitConvert};
use crate::value::Guid;

// -----------------------------------------------------------------------------
// TypeRegistry

/// The central store of registered types.
///
/// Types are indexed by [`TypeId`], by full [type path] and by short
/// [type name]. Short names shared by several types are ambiguous and only
/// reachable through their full path.
///
/// # Example
///
/// ```
/// use vc_serial::registry::TypeRegistry;
///
/// let registry = TypeRegistry::new();
///
/// let meta = registry.get_with_type_name("String").unwrap();
/// assert_eq!(meta.type_path(), "alloc::string::String");
/// ```
///
/// [type path]: crate::info::TypePath::type_path
/// [type name]: crate::info::TypePath::type_name
pub struct TypeRegistry {
    type_meta_table: TypeIdMap<TypeMeta>,
    type_path_to_id: HashMap<&'static str, TypeId>,
    type_name_to_id: HashMap<&'static str, TypeId>,
    ambiguous_names: HashSet<&'static str>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            type_meta_table: TypeIdMap::new(),
            type_path_to_id: HashMap::default(),
            type_name_to_id: HashMap::default(),
            ambiguous_names: HashSet::default(),
        }
    }

    /// Creates a registry with every primitive type registered.
    ///
    /// - `bool` `char`
    /// - `i8 - i64` `isize`
    /// - `u8 - u64` `usize`
    /// - `f32` `f64`
    /// - `String` [`Guid`]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<alloc::string::String>();
        registry.register::<Guid>();
        registry
    }

    // # Validity
    // The type must **not** already exist.
    fn add_new_type_indices(
        type_meta: &TypeMeta,
        type_path_to_id: &mut HashMap<&'static str, TypeId>,
        type_name_to_id: &mut HashMap<&'static str, TypeId>,
        ambiguous_names: &mut HashSet<&'static str>,
    ) {
        let ty = type_meta.ty();
        let type_name = ty.name();

        if !ambiguous_names.contains(type_name) {
            if type_name_to_id.contains_key(type_name) {
                type_name_to_id.remove(type_name);
                ambiguous_names.insert(type_name);
                log::debug!(
                    target: "vc_serial",
                    "short type name `{type_name}` is ambiguous, use the full type path"
                );
            } else {
                type_name_to_id.insert(type_name, ty.id());
            }
        }

        if let Some(previous) = type_path_to_id.insert(ty.path(), ty.id()) {
            log::warn!(
                target: "vc_serial",
                "type path `{}` is used by more than one type ({previous:?} and {:?}), \
                 only the latter can be bound by name",
                ty.path(),
                ty.id(),
            );
        }
    }

    // - If key [`TypeId`] has already exist, the function will do nothing and return `false`.
    // - If the key [`TypeId`] does not exist, the function will insert value and return `true`.
    fn register_internal(
        &mut self,
        type_id: TypeId,
        get_type_meta: impl FnOnce() -> TypeMeta,
    ) -> bool {
        self.type_meta_table.try_insert(type_id, || {
            let meta = get_type_meta();
            Self::add_new_type_indices(
                &meta,
                &mut self.type_path_to_id,
                &mut self.type_name_to_id,
                &mut self.ambiguous_names,
            );
            meta
        })
    }

    /// Inserts `type_meta` if its type is not registered yet.
    ///
    /// Returns `false` and does nothing if the type already exists. Type
    /// dependencies are _not_ registered.
    pub fn try_insert_type_meta(&mut self, type_meta: TypeMeta) -> bool {
        self.register_internal(type_meta.type_id(), || type_meta)
    }

    /// Inserts or **overwrites** the meta of a type.
    ///
    /// Name indices are only added for new types. Type dependencies are
    /// _not_ registered.
    pub fn insert_type_meta(&mut self, type_meta: TypeMeta) {
        if !self.type_meta_table.contains(&type_meta.type_id()) {
            Self::add_new_type_indices(
                &type_meta,
                &mut self.type_path_to_id,
                &mut self.type_name_to_id,
                &mut self.ambiguous_names,
            );
        }
        self.type_meta_table.insert(type_meta.type_id(), type_meta);
    }

    /// Registers `T` and, recursively, the types it refers to.
    ///
    /// Does nothing if `T` is already registered.
    ///
    /// # Example
    ///
    /// ```
    /// use core::any::TypeId;
    /// use vc_serial::registry::TypeRegistry;
    ///
    /// let mut registry = TypeRegistry::empty();
    /// registry.register::<Vec<Option<u8>>>();
    ///
    /// assert!(registry.contains(TypeId::of::<Vec<Option<u8>>>()));
    /// assert!(registry.contains(TypeId::of::<Option<u8>>()));
    /// assert!(registry.contains(TypeId::of::<u8>()));
    /// ```
    pub fn register<T: GetTypeMeta>(&mut self) {
        if self.register_internal(TypeId::of::<T>(), T::get_type_meta) {
            T::register_dependencies(self);
        }
    }

    /// Registers a type by its info and, recursively, the types it refers to.
    ///
    /// The meta is created by the type's [`GetTypeMeta`] implementation when
    /// the info carries one. Returns `false` if the type was already registered.
    pub fn register_info(&mut self, type_info: &'static TypeInfo) -> bool {
        if self.register_internal(type_info.type_id(), || type_info.create_type_meta()) {
            self.register_dependencies(type_info);
            true
        } else {
            false
        }
    }

    /// Registers every type directly or transitively referenced by `type_info`.
    pub fn register_dependencies(&mut self, type_info: &'static TypeInfo) {
        for_each_dependency(type_info, |dependency| {
            self.register_info(dependency);
        });
    }

    /// Registers every non generic `#[derive(Serial)]` type of the process.
    ///
    /// Repeated calls are cheap and will not insert duplicates. Returns
    /// `true` if automatic registration is supported on this platform.
    ///
    /// Requires the `auto_register` feature, without it this does nothing
    /// and returns `false`.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            use crate::__macro_exports::auto_register;
            // Reduce the cost of duplicate registrations.
            if self.contains(TypeId::of::<auto_register::__AvailFlag>()) {
                return true;
            }
            auto_register::__register_types(self);
            self.contains(TypeId::of::<auto_register::__AvailFlag>())
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    /// Registers the type trait `D` for type `T`, registering `T` first if needed.
    ///
    /// Used for generic types, whose derive cannot register type traits
    /// without knowing the type parameters.
    pub fn register_type_trait<T: Typed, D: TypeTrait + FromType<T>>(&mut self) {
        self.register_info(T::type_info());
        if let Some(type_meta) = self.type_meta_table.get_mut(&TypeId::of::<T>()) {
            type_meta.insert_trait(D::from_type());
        }
    }

    /// Registers the conversion `S -> E`, used when a stored `S` is read
    /// into a slot expecting `E`.
    ///
    /// # Example
    ///
    /// ```
    /// use core::any::TypeId;
    /// use vc_serial::info::Typed;
    /// use vc_serial::registry::{TypeRegistry, TypeTraitConvert};
    ///
    /// let mut registry = TypeRegistry::new();
    /// registry.register_conversion::<i32, i64>();
    ///
    /// let convert = registry.get_type_trait::<TypeTraitConvert>(TypeId::of::<i32>()).unwrap();
    /// assert!(convert.can_convert_to(i64::type_info()));
    /// ```
    pub fn register_conversion<S: Typed, E: Typed + From<S>>(&mut self) {
        self.register_info(S::type_info());
        self.register_info(E::type_info());
        if let Some(type_meta) = self.type_meta_table.get_mut(&TypeId::of::<S>()) {
            type_meta
                .get_or_insert_trait(TypeTraitConvert::default)
                .add::<S, E>();
        }
    }

    /// Whether the type with given [`TypeId`] has been registered.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.type_meta_table.contains(&type_id)
    }

    /// Returns the [`TypeMeta`] of the type with the given [`TypeId`].
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.type_meta_table.get(&type_id)
    }

    /// Returns the mutable [`TypeMeta`] of the type with the given [`TypeId`].
    #[inline]
    pub fn get_mut(&mut self, type_id: TypeId) -> Option<&mut TypeMeta> {
        self.type_meta_table.get_mut(&type_id)
    }

    /// Returns the [`TypeMeta`] of the type with the given full [type path].
    ///
    /// [type path]: crate::info::TypePath::type_path
    pub fn get_with_type_path(&self, type_path: &str) -> Option<&TypeMeta> {
        match self.type_path_to_id.get(type_path) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Returns the [`TypeMeta`] of the type with the given short [type name].
    ///
    /// Returns `None` if the name is ambiguous.
    ///
    /// [type name]: crate::info::TypePath::type_name
    pub fn get_with_type_name(&self, type_name: &str) -> Option<&TypeMeta> {
        match self.type_name_to_id.get(type_name) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Returns `true` if the given [type name] matches multiple registered types.
    ///
    /// [type name]: crate::info::TypePath::type_name
    pub fn is_ambiguous(&self, type_name: &str) -> bool {
        self.ambiguous_names.contains(type_name)
    }

    /// Returns the [`TypeTrait`] `T` of the type with the given [`TypeId`].
    pub fn get_type_trait<T: TypeTrait>(&self, type_id: TypeId) -> Option<&T> {
        match self.get(type_id) {
            Some(type_meta) => type_meta.get_trait::<T>(),
            None => None,
        }
    }

    /// Returns the [`TypeInfo`] of the type with the given [`TypeId`].
    pub fn get_type_info(&self, type_id: TypeId) -> Option<&'static TypeInfo> {
        self.get(type_id).map(TypeMeta::type_info)
    }

    /// Number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.type_meta_table.len()
    }

    /// Returns an iterator over the registered [`TypeMeta`]s.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeMeta> {
        self.type_meta_table.values()
    }

    /// Returns the registered types carrying the [`TypeTrait`] `T`.
    pub fn iter_with_trait<T: TypeTrait>(&self) -> impl Iterator<Item = (&TypeMeta, &T)> {
        self.type_meta_table
            .values()
            .filter_map(|item| item.get_trait::<T>().map(|t| (item, t)))
    }
}

// -----------------------------------------------------------------------------
// TypeRegistryArc

static GLOBAL_REGISTRY: LazyLock<TypeRegistryArc> = LazyLock::new(|| {
    let mut registry = TypeRegistry::new();
    registry.auto_register();
    TypeRegistryArc::new(registry)
});

/// A shareable [`TypeRegistry`].
#[derive(Clone, Default)]
pub struct TypeRegistryArc {
    /// The wrapped [`TypeRegistry`].
    pub internal: Arc<RwLock<TypeRegistry>>,
}

impl TypeRegistryArc {
    #[inline]
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            internal: Arc::new(RwLock::new(registry)),
        }
    }

    /// The process-wide registry.
    ///
    /// Seeded with the primitive types and, with the `auto_register`
    /// feature, every non generic `#[derive(Serial)]` type.
    #[inline]
    pub fn global() -> Self {
        GLOBAL_REGISTRY.clone()
    }

    /// Takes a read lock on the underlying [`TypeRegistry`].
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        read_lock(&self.internal)
    }

    /// Takes a write lock on the underlying [`TypeRegistry`].
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
        write_lock(&self.internal)
    }

    /// Returns a copy of the type trait `T` of `type_info`, registering the
    /// type first if needed.
    pub fn type_trait<T: TypeTrait + Clone>(&self, type_info: &'static TypeInfo) -> Option<T> {
        if !self.read().contains(type_info.type_id()) {
            self.write().register_info(type_info);
        }
        self.read()
            .get_type_trait::<T>(type_info.type_id())
            .cloned()
    }
}

impl fmt::Debug for TypeRegistryArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.read().type_path_to_id.keys())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{TypeRegistry, TypeRegistryArc};
    use crate::info::{NonGenericTypeInfoCell, TypeInfo, TypeKind, TypePath, Typed};
    use crate::registry::{GetTypeMeta, TypeTraitConvert};
    use core::any::TypeId;

    macro_rules! opaque {
        ($ident:ident, $path:literal) => {
            struct $ident;

            impl TypePath for $ident {
                fn type_path() -> &'static str {
                    $path
                }
                fn type_name() -> &'static str {
                    "Same"
                }
            }

            impl Typed for $ident {
                fn type_info() -> &'static TypeInfo {
                    static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                    CELL.get_or_init(|| TypeInfo::new::<Self>(TypeKind::Opaque))
                }
            }

            impl GetTypeMeta for $ident {}
        };
    }

    opaque!(First, "a::Same");
    opaque!(Second, "b::Same");

    #[test]
    fn ambiguous_short_names() {
        let mut registry = TypeRegistry::empty();
        registry.register::<First>();
        assert!(registry.get_with_type_name("Same").is_some());

        registry.register::<Second>();
        assert!(registry.is_ambiguous("Same"));
        assert!(registry.get_with_type_name("Same").is_none());
        assert_eq!(
            registry.get_with_type_path("b::Same").map(|m| m.type_id()),
            Some(TypeId::of::<Second>())
        );
    }

    #[test]
    fn register_info_is_idempotent() {
        let mut registry = TypeRegistry::empty();
        assert!(registry.register_info(u8::type_info()));
        assert!(!registry.register_info(u8::type_info()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn conversions_are_stored_on_the_source() {
        let mut registry = TypeRegistry::empty();
        registry.register_conversion::<u8, u16>();
        registry.register_conversion::<u8, u32>();

        let convert = registry
            .get_type_trait::<TypeTraitConvert>(TypeId::of::<u8>())
            .unwrap();
        assert_eq!(convert.targets().count(), 2);
        assert!(registry.contains(TypeId::of::<u32>()));
    }

    #[test]
    fn global_contains_primitives() {
        let global = TypeRegistryArc::global();
        assert!(global.read().contains(TypeId::of::<alloc::string::String>()));
        assert!(global.read().get_with_type_path("i32").is_some());
    }
}
