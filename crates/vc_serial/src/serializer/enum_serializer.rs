use alloc::boxed::Box;
use core::marker::PhantomData;

use crate::error::SerialResult;
use crate::info::{EnumInfo, TypeInfo, TypeKind, Typed};
use crate::serializer::primitive::log_lost_entry;
use crate::serializer::{ErasedSerializer, Serializer, write_weak};
use crate::stream::{DataReader, DataWriter};
use crate::{Reflect, Serial};

// -----------------------------------------------------------------------------
// EnumSerializer

/// Reads and writes a field-less enum as its discriminant.
///
/// The discriminant is written as an unsigned integer entry, negative
/// discriminants wrapping around. An unknown discriminant reads as the
/// default variant.
pub struct EnumSerializer<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T: Serial> EnumSerializer<T> {
    /// # Panics
    ///
    /// Panics if `T` is not described as an enum.
    pub fn new() -> Self {
        assert!(
            matches!(T::type_info().kind(), TypeKind::Enum(_)),
            "`{}` is not an enum type",
            T::type_path(),
        );
        Self {
            marker: PhantomData,
        }
    }
}

impl<T: Serial> Default for EnumSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serial> ErasedSerializer for EnumSerializer<T> {
    fn serialized_type(&self) -> &'static TypeInfo {
        T::type_info()
    }

    fn write_value_weak(
        &self,
        name: Option<&str>,
        value: &dyn Reflect,
        writer: &mut dyn DataWriter,
    ) -> SerialResult<()> {
        write_weak::<T>(self, name, value, writer)
    }

    fn read_value_weak(&self, reader: &mut dyn DataReader) -> SerialResult<Box<dyn Reflect>> {
        Ok(Box::new(self.read_value(reader)?))
    }
}

impl<T: Serial> Serializer<T> for EnumSerializer<T> {
    fn write_value(&self, name: Option<&str>, value: &T, writer: &mut dyn DataWriter) -> SerialResult<()> {
        write_enum(T::type_info(), name, value, writer)
    }

    fn read_value(&self, reader: &mut dyn DataReader) -> SerialResult<T> {
        let value = read_enum(T::type_info(), reader)?;
        Ok(value.and_then(|value| value.take::<T>().ok()).unwrap_or_default())
    }
}

// -----------------------------------------------------------------------------
// Helpers

fn enum_info(ty: &'static TypeInfo) -> &'static EnumInfo {
    match ty.kind() {
        TypeKind::Enum(info) => info,
        _ => unreachable!("`{ty}` is not an enum type"),
    }
}

/// Writes the discriminant of an enum value of type `ty`.
pub(crate) fn write_enum(
    ty: &'static TypeInfo,
    name: Option<&str>,
    value: &dyn Reflect,
    writer: &mut dyn DataWriter,
) -> SerialResult<()> {
    match enum_info(ty).to_value(value) {
        Some(discriminant) => writer.write_u64(name, discriminant as u64),
        None => {
            writer.context().debug().log_error(format_args!(
                "value of type `{}` is not a variant of `{ty}`, writing null",
                value.reflect_type_info(),
            ));
            writer.write_null(name)
        }
    }
}

/// Reads an enum value of type `ty`, `None` if the entry or the
/// discriminant did not fit. Every failure is logged once.
pub(crate) fn read_enum(
    ty: &'static TypeInfo,
    reader: &mut dyn DataReader,
) -> SerialResult<Option<Box<dyn Reflect>>> {
    let (entry, name) = reader.peek_entry()?;
    let Some(raw) = reader.read_u64()? else {
        log_lost_entry(reader, ty, entry, name.as_deref());
        return Ok(None);
    };
    let discriminant = raw as i64;
    let value = enum_info(ty).from_value(discriminant);
    if value.is_none() {
        reader.context().debug().log_warning(format_args!(
            "`{ty}` has no variant with discriminant {discriminant}, using the default",
        ));
    }
    Ok(value)
}
