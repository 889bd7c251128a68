//! Static type metadata.
//!
//! Rust has no runtime reflection, so every serializable type describes
//! itself once through [`Typed::type_info`]. A `&'static TypeInfo` is the
//! runtime type handle used everywhere else in this crate: it is written to
//! streams (through a binder), compared, tested for assignability and asked
//! for its default constructor or compiled serialization hooks.
//!
//! ## Menu
//!
//! - [`TypePath`] / [`Type`]: stable names and the `TypeId` of a type.
//! - [`Typed`]: access to the static [`TypeInfo`] of a type.
//! - [`TypeKind`]: the shape of a type (primitive, struct, list, reference, ...).
//! - [`NonGenericTypeInfoCell`], [`GenericTypeInfoCell`], [`GenericTypePathCell`]:
//!   static storage used by `Typed` implementations.

// -----------------------------------------------------------------------------
// Modules

mod cell;
mod kinds;
mod type_info;
mod type_path;
mod typed;

// -----------------------------------------------------------------------------
// Exports

pub use cell::{GenericTypeInfoCell, GenericTypePathCell, NonGenericTypeInfoCell};
pub use kinds::{CollectionInfo, EnumInfo, EnumVariant, InterfaceInfo, ListInfo, MapInfo};
pub use kinds::{FieldInfo, FieldMarker, StructInfo};
pub use kinds::{NullableInfo, PrimitiveKind, ReferenceInfo, TypeKind};
pub use type_info::{TypeHooks, TypeInfo};
pub use type_path::{Type, TypePath};
pub use typed::Typed;
