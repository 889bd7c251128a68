use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use vc_utils::TypeIdMap;

use crate::info::{Type, TypeInfo, TypeKind, Typed};
use crate::registry::{TypeRegistry, TypeTrait};

// -----------------------------------------------------------------------------
// TypeMeta

/// Runtime storage for a registered type: its [`TypeInfo`] and a
/// [`TypeTrait`] table.
///
/// Usually created by the [`GetTypeMeta`] implementation generated by
/// `#[derive(Serial)]`.
///
/// # Example
///
/// ```
/// use vc_serial::registry::{FromType, TypeMeta, TypeTraitSerde};
///
/// let mut meta = TypeMeta::of::<u32>();
/// meta.insert_trait::<TypeTraitSerde>(FromType::<u32>::from_type());
///
/// assert!(meta.has_trait::<TypeTraitSerde>());
/// assert_eq!(meta.type_info().type_path(), "u32");
/// ```
pub struct TypeMeta {
    type_info: &'static TypeInfo,
    trait_table: TypeIdMap<Box<dyn TypeTrait>>,
}

impl TypeMeta {
    /// Creates a meta without type traits for `T`.
    #[inline]
    pub fn of<T: Typed + ?Sized>() -> Self {
        Self::from_info(T::type_info())
    }

    /// Creates a meta without type traits from a type info.
    #[inline]
    pub fn from_info(type_info: &'static TypeInfo) -> Self {
        Self {
            type_info,
            trait_table: TypeIdMap::new(),
        }
    }

    #[inline(always)]
    pub fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    #[inline(always)]
    pub fn ty(&self) -> &'static Type {
        self.type_info.ty()
    }

    #[inline(always)]
    pub fn type_id(&self) -> TypeId {
        self.type_info.type_id()
    }

    #[inline(always)]
    pub fn type_path(&self) -> &'static str {
        self.type_info.type_path()
    }

    #[inline(always)]
    pub fn type_name(&self) -> &'static str {
        self.type_info.type_name()
    }

    /// Inserts a [`TypeTrait`], replacing a previous value of the same type.
    #[inline(always)]
    pub fn insert_trait<T: TypeTrait>(&mut self, data: T) {
        self.insert_trait_by_id(TypeId::of::<T>(), Box::new(data));
    }

    #[inline(never)]
    fn insert_trait_by_id(&mut self, id: TypeId, val: Box<dyn TypeTrait>) {
        self.trait_table.insert(id, val);
    }

    /// Removes a [`TypeTrait`] from the meta.
    pub fn remove_trait<T: TypeTrait>(&mut self) -> Option<Box<T>> {
        self.trait_table
            .remove(&TypeId::of::<T>())
            .and_then(|val| val.downcast::<T>().ok())
    }

    /// Returns a [`TypeTrait`], `None` if it does not exist.
    #[inline]
    pub fn get_trait<T: TypeTrait>(&self) -> Option<&T> {
        self.trait_table
            .get(&TypeId::of::<T>())
            .and_then(|val| val.downcast_ref::<T>())
    }

    /// Returns a mutable [`TypeTrait`], `None` if it does not exist.
    #[inline]
    pub fn get_trait_mut<T: TypeTrait>(&mut self) -> Option<&mut T> {
        self.trait_table
            .get_mut(&TypeId::of::<T>())
            .and_then(|val| val.downcast_mut::<T>())
    }

    /// Returns the [`TypeTrait`], inserting the result of `f` if it does not exist.
    pub fn get_or_insert_trait<T: TypeTrait>(&mut self, f: impl FnOnce() -> T) -> &mut T {
        let val = self
            .trait_table
            .get_or_insert(TypeId::of::<T>(), || Box::new(f()));
        match val.downcast_mut::<T>() {
            Some(val) => val,
            None => unreachable!("trait table is keyed by the trait type"),
        }
    }

    #[inline]
    pub fn has_trait<T: TypeTrait>(&self) -> bool {
        self.trait_table.contains(&TypeId::of::<T>())
    }

    #[inline]
    pub fn trait_len(&self) -> usize {
        self.trait_table.len()
    }
}

impl Clone for TypeMeta {
    fn clone(&self) -> Self {
        let mut trait_table = TypeIdMap::new();
        for type_trait in self.trait_table.values() {
            let cloned = (**type_trait).clone_type_trait();
            trait_table.insert(Any::type_id(&*cloned), cloned);
        }
        Self {
            type_info: self.type_info,
            trait_table,
        }
    }
}

impl fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMeta")
            .field("type_path", &self.type_path())
            .field("trait_len", &self.trait_len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta

/// Creates the [`TypeMeta`] of a type for registration into a [`TypeRegistry`].
///
/// Implemented by `#[derive(Serial)]`, which adds the type traits requested
/// through its attributes. The default implementation has no type traits.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `GetTypeMeta` so cannot provide type registration information",
    note = "consider annotating `{Self}` with `#[derive(Serial)]`"
)]
pub trait GetTypeMeta: Typed {
    /// Returns the [`TypeMeta`] of this type.
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }

    /// Registers the types this type refers to.
    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register_dependencies(Self::type_info());
    }
}

/// Calls `f` for every type directly referenced by `info`.
pub(crate) fn for_each_dependency(info: &'static TypeInfo, mut f: impl FnMut(&'static TypeInfo)) {
    match info.kind() {
        TypeKind::Struct(info) => info.fields().iter().for_each(|field| f(field.type_info())),
        TypeKind::List(info) => f(info.item()),
        TypeKind::Collection(info) => f(info.item()),
        TypeKind::Map(info) => {
            f(info.key());
            f(info.value());
        }
        TypeKind::Nullable(info) => f(info.inner()),
        TypeKind::Reference(info) => f(info.target()),
        _ => {}
    }
    info.generics().for_each(&mut f);
    info.implements().for_each(&mut f);
}
