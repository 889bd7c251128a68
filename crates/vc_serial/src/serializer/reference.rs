use alloc::boxed::Box;
use core::marker::PhantomData;

use crate::error::SerialResult;
use crate::info::{TypeInfo, Typed};
use crate::serializer::{ErasedSerializer, Serializer, read_polymorphic, write_object, write_weak};
use crate::stream::{DataReader, DataWriter};
use crate::value::{AnyValue, Obj, ObjectRef};
use crate::{Reflect, Serial};

// -----------------------------------------------------------------------------
// ReferenceSerializer

/// Reads and writes a reference slot `Option<Obj<T>>`.
///
/// `T` is the declared type of the slot: a concrete type or an interface
/// marker. Objects always carry their runtime type in the stream.
pub struct ReferenceSerializer<T: ?Sized> {
    marker: PhantomData<fn() -> *const T>,
}

impl<T: Typed + ?Sized> ReferenceSerializer<T> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T: Typed + ?Sized> Default for ReferenceSerializer<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Typed + ?Sized> ErasedSerializer for ReferenceSerializer<T>
where
    Option<Obj<T>>: Serial,
{
    fn serialized_type(&self) -> &'static TypeInfo {
        <Option<Obj<T>>>::type_info()
    }

    fn write_value_weak(
        &self,
        name: Option<&str>,
        value: &dyn Reflect,
        writer: &mut dyn DataWriter,
    ) -> SerialResult<()> {
        write_weak::<Option<Obj<T>>>(self, name, value, writer)
    }

    fn read_value_weak(&self, reader: &mut dyn DataReader) -> SerialResult<Box<dyn Reflect>> {
        Ok(Box::new(self.read_value(reader)?))
    }
}

impl<T: Typed + ?Sized> Serializer<Option<Obj<T>>> for ReferenceSerializer<T>
where
    Option<Obj<T>>: Serial,
{
    fn write_value(
        &self,
        name: Option<&str>,
        value: &Option<Obj<T>>,
        writer: &mut dyn DataWriter,
    ) -> SerialResult<()> {
        write_object(name, value.as_ref().map(Obj::object), writer)
    }

    fn read_value(&self, reader: &mut dyn DataReader) -> SerialResult<Option<Obj<T>>> {
        let value = read_polymorphic(reader, T::type_info())?;
        Ok(into_object(value).and_then(Obj::from_object))
    }
}

/// Moves a read value into a shared object.
///
/// Values read from untyped struct nodes are promoted to fresh objects.
pub(crate) fn into_object(value: AnyValue) -> Option<ObjectRef> {
    match value {
        AnyValue::Null => None,
        AnyValue::Primitive(value) => Some(ObjectRef::new(value.into_reflect())),
        AnyValue::Value(value) => Some(ObjectRef::new(value)),
        AnyValue::Object(object) => Some(object),
    }
}
