//! Serializers: type-specialized dispatchers over primitives and formatters.
//!
//! A serializer reads and writes one value of its type as exactly one
//! entry or node. Statically typed code goes through [`get`], which returns
//! the [`Serializer`] chosen by [`Serial::create_serializer`]. Code that only
//! knows a runtime [`TypeInfo`] goes through [`for_type`], which returns the
//! same instance as an [`ErasedSerializer`], or the reflection driven
//! [`AnySerializer`] when the type has no compiled serializer and weak
//! fallback is allowed.
//!
//! ## Menu
//!
//! - [`ErasedSerializer`] / [`Serializer`]: weak (boxed) and strong entry points.
//! - [`PrimitiveSerializer`]: one entry per primitive.
//! - [`EnumSerializer`]: field-less enums as their discriminant.
//! - [`ComplexTypeSerializer`]: struct nodes driven by a formatter.
//! - [`ReferenceSerializer`]: shared objects in `Option<Obj<T>>` slots.
//! - [`DynamicSerializer`]: the fully dynamic [`AnyValue`](crate::value::AnyValue) slot.
//! - [`AnySerializer`]: the weak fallback for any runtime type.
//! - [`SerializationCallbacks`]: hooks around the (de)serialization of a value.
//!
//! [`Serial::create_serializer`]: crate::Serial::create_serializer

// -----------------------------------------------------------------------------
// Modules

mod any;
mod complex;
mod dynamic;
mod enum_serializer;
mod polymorphic;
mod primitive;
mod reference;

// -----------------------------------------------------------------------------
// Exports

pub use any::AnySerializer;
pub use complex::ComplexTypeSerializer;
pub use dynamic::DynamicSerializer;
pub use enum_serializer::EnumSerializer;
pub use primitive::{PrimitiveSerializer, PrimitiveType};
pub use reference::ReferenceSerializer;

pub(crate) use complex::{read_value_node, write_value_node};
pub(crate) use polymorphic::{read_polymorphic, read_skipped_node, write_object};

use alloc::boxed::Box;
use core::any::Any;

use vc_os::sync::{Arc, RwLock, read_lock, write_lock};
use vc_utils::TypeIdMap;

use crate::error::{AbortError, SerialResult};
use crate::info::TypeInfo;
use crate::stream::{DataReader, DataWriter};
use crate::{Reflect, Serial};

// -----------------------------------------------------------------------------
// Serializer

/// The weakly typed half of a serializer: values are passed as `dyn Reflect`.
pub trait ErasedSerializer: Send + Sync {
    /// The type this serializer reads and writes.
    fn serialized_type(&self) -> &'static TypeInfo;

    /// Writes `value` as one entry or node named `name`.
    ///
    /// A value of another type is logged as an error and written as null.
    fn write_value_weak(
        &self,
        name: Option<&str>,
        value: &dyn Reflect,
        writer: &mut dyn DataWriter,
    ) -> SerialResult<()>;

    /// Reads one value, substituting the default if the data does not fit.
    fn read_value_weak(&self, reader: &mut dyn DataReader) -> SerialResult<Box<dyn Reflect>>;
}

/// A serializer of values of type `T`.
pub trait Serializer<T>: ErasedSerializer {
    /// Writes `value` as one entry or node named `name`.
    fn write_value(&self, name: Option<&str>, value: &T, writer: &mut dyn DataWriter) -> SerialResult<()>;

    /// Reads one value, substituting the default if the data does not fit.
    fn read_value(&self, reader: &mut dyn DataReader) -> SerialResult<T>;
}

/// Hooks run around the (de)serialization of a value's members.
///
/// Attached with `#[serial(callbacks)]`.
pub trait SerializationCallbacks {
    /// Runs once before every full write of the value.
    ///
    /// Later occurrences of the same shared object are written as references
    /// and do not run the hook again.
    fn on_before_serialize(&self) {}

    /// Runs once after the members of the value have been read.
    fn on_after_deserialize(&mut self) {}
}

/// Writes a weakly passed value through a typed serializer.
pub(crate) fn write_weak<T: Serial>(
    serializer: &dyn Serializer<T>,
    name: Option<&str>,
    value: &dyn Reflect,
    writer: &mut dyn DataWriter,
) -> SerialResult<()> {
    match value.downcast_ref::<T>() {
        Some(value) => serializer.write_value(name, value, writer),
        None => {
            writer.context().debug().log_error(format_args!(
                "serializer of `{}` was given a value of type `{}`, writing null",
                T::type_path(),
                value.reflect_type_info(),
            ));
            writer.write_null(name)
        }
    }
}

// -----------------------------------------------------------------------------
// Caches

static TYPED_CACHE: RwLock<TypeIdMap<Box<dyn Any + Send + Sync>>> = RwLock::new(TypeIdMap::new());
static STRONG_CACHE: RwLock<TypeIdMap<Arc<dyn ErasedSerializer>>> = RwLock::new(TypeIdMap::new());
static WEAK_CACHE: RwLock<TypeIdMap<Arc<dyn ErasedSerializer>>> = RwLock::new(TypeIdMap::new());

/// Returns the serializer of `T`.
///
/// The serializer is created once per process through
/// [`Serial::create_serializer`]; later calls return the same instance.
///
/// # Example
///
/// ```
/// use vc_serial::serializer;
/// use std::sync::Arc;
///
/// let a = serializer::get::<i32>();
/// let b = serializer::get::<i32>();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub fn get<T: Serial>() -> Arc<dyn Serializer<T>> {
    let cached = read_lock(&TYPED_CACHE)
        .get_type::<T>()
        .and_then(|cached| cached.downcast_ref::<Arc<dyn Serializer<T>>>())
        .cloned();
    if let Some(serializer) = cached {
        return serializer;
    }

    // Built outside the lock: creating a serializer may look up others.
    let created = T::create_serializer();
    let mut cache = write_lock(&TYPED_CACHE);
    let entry = cache.get_or_insert(core::any::TypeId::of::<T>(), || {
        Box::new(created) as Box<dyn Any + Send + Sync>
    });
    match entry.downcast_ref::<Arc<dyn Serializer<T>>>() {
        Some(serializer) => serializer.clone(),
        None => unreachable!("typed serializer cache is keyed by the value type"),
    }
}

/// Returns the serializer of a runtime type.
///
/// Types with a compiled serializer (every [`Serial`] type) return the same
/// instance as [`get`]. For other types the reflection driven
/// [`AnySerializer`] is returned if `allow_weak_fallback` is set; otherwise
/// the abort signal is raised naming the type and its generic arguments.
pub fn for_type(
    ty: &'static TypeInfo,
    allow_weak_fallback: bool,
) -> SerialResult<Arc<dyn ErasedSerializer>> {
    let cache = if allow_weak_fallback {
        &WEAK_CACHE
    } else {
        &STRONG_CACHE
    };
    if let Some(serializer) = read_lock(cache).get(&ty.type_id()) {
        return Ok(serializer.clone());
    }

    let created = match ty.compiled_serializer() {
        Some(serializer) => serializer,
        None if allow_weak_fallback => Arc::new(AnySerializer::new(ty)),
        None => {
            return Err(AbortError::MissingCompiledSupport {
                type_path: ty.type_path().into(),
                generics: ty.describe_generics(),
            }
            .into());
        }
    };
    Ok(write_lock(cache)
        .get_or_insert(ty.type_id(), || created)
        .clone())
}
