//! Process-wide registry of serializable types.
//!
//! The registry maps written type names back to [`TypeInfo`]s and stores
//! optional per-type capabilities ([`TypeTrait`]s) that the formatter
//! locator and the polymorphic serializer consult.
//!
//! ## Menu
//!
//! - [`TypeTrait`]: a capability supported by a type.
//! - [`FromType`]: creates a `TypeTrait` from a concrete type.
//! - [`TypeMeta`]: a [`TypeInfo`] plus its `TypeTrait` table.
//! - [`GetTypeMeta`]: creates the `TypeMeta` of a type.
//! - [`TypeRegistry`] / [`TypeRegistryArc`]: storage, and its shareable form.
//! - TypeTraits:
//!     - [`TypeTraitSelfFormatter`]: the type formats itself, see [`SelfFormatted`].
//!     - [`TypeTraitSerde`]: the type is serialized through its `serde` implementations.
//!     - [`TypeTraitConvert`]: conversions into other types, used when a
//!       stored value does not fit the expected type.
//!
//! ## auto_register
//!
//! With the `auto_register` feature every non generic `#[derive(Serial)]`
//! type is submitted to [`inventory`] and registered into
//! [`TypeRegistryArc::global`] the first time it is accessed. See
//! [`TypeRegistry::auto_register`].
//!
//! [`TypeInfo`]: crate::info::TypeInfo
//! [`SelfFormatted`]: crate::formatter::SelfFormatted
//! [`inventory`]: https://docs.rs/inventory

// -----------------------------------------------------------------------------
// Modules

mod from_type;
mod traits;
mod type_meta;
mod type_registry;
mod type_trait;

// -----------------------------------------------------------------------------
// Exports

pub use from_type::FromType;
pub use traits::{TypeTraitConvert, TypeTraitSelfFormatter, TypeTraitSerde};
pub use type_meta::{GetTypeMeta, TypeMeta};
pub use type_registry::{TypeRegistry, TypeRegistryArc};
pub use type_trait::TypeTrait;
