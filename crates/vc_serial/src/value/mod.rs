//! Runtime values: shared objects, the dynamic slot and boxed primitives.
//!
//! ## Menu
//!
//! - [`ObjectRef`]: an identity-carrying shared object of any type.
//! - [`Obj`]: a typed view of an [`ObjectRef`], used for reference fields
//!   (`Option<Obj<T>>`). `T` may be an interface marker such as `dyn Animal`.
//! - [`AnyValue`]: the fully dynamic slot (null, boxed primitive, boxed value
//!   or shared object).
//! - [`PrimitiveValue`]: tagged union of every primitive.
//! - [`TypeRef`]: a reflected type value.
//! - [`Guid`]: 128-bit identifier, re-exported from `uuid`.

// -----------------------------------------------------------------------------
// Modules

mod any_value;
mod object;
mod primitive;
mod type_ref;

// -----------------------------------------------------------------------------
// Exports

pub use any_value::AnyValue;
pub use object::{Obj, ObjectRef};
pub use primitive::PrimitiveValue;
pub use type_ref::TypeRef;

/// A 128-bit globally unique identifier.
pub use uuid::Uuid as Guid;
