//! [`Typed`](crate::info::Typed) and [`Serial`](crate::Serial) for
//! foreign types.
//!
//! ## Implemented Menu
//!
//! - primitives: `bool`, `char`, `i8`-`i64`, `isize`, `u8`-`u64`, `usize`,
//!   `f32`, `f64`, `String`, [`Guid`](crate::value::Guid)
//! - lists: `Vec<T>`
//! - collections: `VecDeque<T>`, `HashSet<T>`, `BTreeSet<T>`
//! - maps: `HashMap<K, V>`, `BTreeMap<K, V>`
//! - `Option<T>` of a value type, and `Option<Obj<T>>` reference slots
//! - `core::time::Duration`
//! - [`AnyValue`](crate::value::AnyValue), [`TypeRef`](crate::value::TypeRef)
//! - `dyn Reflect`, the root interface
//!
//! Interface markers for user traits are declared with [`impl_interface!`].

// -----------------------------------------------------------------------------
// Modules

mod collections;
mod option;
mod primitive;
mod special;

// -----------------------------------------------------------------------------
// Generic definitions

/// Generic definition path of `HashMap<K, V>`.
pub const HASH_MAP_DEFINITION: &str = "std::collections::HashMap";
/// Generic definition path of `BTreeMap<K, V>`.
pub const BTREE_MAP_DEFINITION: &str = "alloc::collections::BTreeMap";
/// Generic definition path of `Option<T>`.
pub const OPTION_DEFINITION: &str = "core::option::Option";
/// Generic definition path of `Vec<T>`.
pub const VEC_DEFINITION: &str = "alloc::vec::Vec";

/// An efficient string concatenation, used for generic type paths.
///
/// # Example
///
/// ```
/// use vc_serial::impls;
///
/// let s = impls::concat(&["alloc::vec::Vec", "<", "i32", ">"]);
/// assert_eq!(s, "alloc::vec::Vec<i32>");
/// assert_eq!(s.capacity(), 20);
/// ```
#[inline(never)]
pub fn concat(arr: &[&str]) -> alloc::string::String {
    let len = arr.iter().map(|item| item.len()).sum();
    let mut res = alloc::string::String::with_capacity(len);
    for &item in arr {
        res.push_str(item);
    }
    res
}

/// Implements `TypePath` for a generic type from its definition path.
macro_rules! impl_generic_type_path {
    ($ty:ident < $($param:ident),+ >, $module:literal, $name:literal) => {
        impl<$($param: $crate::info::TypePath),+> $crate::info::TypePath for $ty<$($param),+> {
            fn type_path() -> &'static str {
                static CELL: $crate::info::GenericTypePathCell = $crate::info::GenericTypePathCell::new();
                CELL.get_or_insert::<Self>(|| {
                    let args = [$(<$param as $crate::info::TypePath>::type_path()),+].join(", ");
                    $crate::impls::concat(&[$module, "::", $name, "<", &args, ">"])
                })
            }

            fn type_name() -> &'static str {
                static CELL: $crate::info::GenericTypePathCell = $crate::info::GenericTypePathCell::new();
                CELL.get_or_insert::<Self>(|| {
                    let args = [$(<$param as $crate::info::TypePath>::type_name()),+].join(", ");
                    $crate::impls::concat(&[$name, "<", &args, ">"])
                })
            }

            fn module_path() -> Option<&'static str> {
                Some($module)
            }
        }
    };
}

pub(crate) use impl_generic_type_path;

// -----------------------------------------------------------------------------
// Interfaces

/// Declares `dyn Trait` as an interface marker type.
///
/// Interface markers can be the declared type of reference slots
/// (`Option<Obj<dyn Trait>>`) and are listed by implementing types with
/// `#[serial(implements(dyn Trait))]`. They are abstract: nothing is ever
/// instantiated as an interface.
///
/// # Example
///
/// ```
/// use vc_serial::impl_interface;
/// use vc_serial::info::{TypePath, Typed};
///
/// pub trait Animal {}
///
/// impl_interface!(dyn Animal, "demo::Animal");
///
/// assert!(<dyn Animal>::type_info().is_abstract());
/// assert_eq!(<dyn Animal>::type_path(), "demo::Animal");
/// ```
#[macro_export]
macro_rules! impl_interface {
    ($ty:ty, $path:literal) => {
        impl $crate::info::TypePath for $ty {
            fn type_path() -> &'static str {
                $path
            }

            fn type_name() -> &'static str {
                match $path.rfind("::") {
                    Some(index) => $path.split_at(index + 2).1,
                    None => $path,
                }
            }
        }

        impl $crate::info::Typed for $ty {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static CELL: $crate::info::NonGenericTypeInfoCell =
                    $crate::info::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    $crate::info::TypeInfo::new::<Self>($crate::info::TypeKind::Interface(
                        $crate::info::InterfaceInfo::new(),
                    ))
                })
            }
        }

        impl $crate::registry::GetTypeMeta for $ty {}
    };
}
