//! Containers for static storage of type information.
//!
//! For non generic types [`NonGenericTypeInfoCell`] wraps a [`OnceLock`].
//!
//! A `static CELL` inside a generic function is shared by every
//! instantiation, so [`GenericTypeInfoCell`] and [`GenericTypePathCell`]
//! keep a [`TypeIdMap`] behind a [`RwLock`] and leak one value per type.

use alloc::boxed::Box;
use alloc::string::String;
use core::any::{Any, TypeId};

use vc_os::sync::{OnceLock, RwLock, read_lock, write_lock};
use vc_utils::TypeIdMap;

use crate::info::TypeInfo;

mod sealed {
    use super::TypeInfo;
    use alloc::string::String;

    pub trait TypedProperty: Send + Sync + 'static {}

    impl TypedProperty for String {}
    impl TypedProperty for TypeInfo {}
}

use sealed::TypedProperty;

// -----------------------------------------------------------------------------
// NonGeneric

/// Static storage for the info of a non generic type.
pub struct NonGenericTypeCell<T: TypedProperty>(OnceLock<T>);

/// Static storage for the [`TypeInfo`] of a non generic type.
pub type NonGenericTypeInfoCell = NonGenericTypeCell<TypeInfo>;

impl<T: TypedProperty> NonGenericTypeCell<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        self.0.get_or_init(f)
    }
}

// -----------------------------------------------------------------------------
// Generic

/// Static storage for per-instantiation info of a generic type.
pub struct GenericTypeCell<T: TypedProperty>(RwLock<TypeIdMap<&'static T>>);

/// Static storage for the [`TypeInfo`] of a generic type.
pub type GenericTypeInfoCell = GenericTypeCell<TypeInfo>;

/// Static storage for the computed type path of a generic type.
pub type GenericTypePathCell = GenericTypeCell<String>;

impl<T: TypedProperty> GenericTypeCell<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    /// Returns the value stored for `G`, building it with `f` on first access.
    ///
    /// `f` runs without holding the lock, so it may access the same cell for
    /// other instantiations. If two threads race, the first insert wins.
    #[inline(always)]
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> T) -> &T {
        self.get_or_insert_by_type_id(TypeId::of::<G>(), f)
    }

    #[inline(never)]
    fn get_or_insert_by_type_id(&self, type_id: TypeId, f: impl FnOnce() -> T) -> &T {
        let cached = read_lock(&self.0).get(&type_id).copied();
        match cached {
            Some(value) => value,
            None => {
                let value = f();
                *write_lock(&self.0).get_or_insert(type_id, || Box::leak(Box::new(value)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GenericTypePathCell;
    use alloc::string::ToString;

    #[test]
    fn generic_cell_is_per_type() {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        fn path_of<T: 'static>(name: &str) -> &'static str {
            CELL.get_or_insert::<T>(|| name.to_string()).as_str()
        }

        assert_eq!(path_of::<u8>("u8"), "u8");
        assert_eq!(path_of::<u16>("u16"), "u16");
        // The first value wins.
        assert_eq!(path_of::<u8>("other"), "u8");
    }
}
