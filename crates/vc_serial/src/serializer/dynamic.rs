use alloc::boxed::Box;

use crate::error::SerialResult;
use crate::formatter;
use crate::info::{TypeInfo, Typed};
use crate::serializer::{ErasedSerializer, Serializer, read_polymorphic, write_object, write_weak};
use crate::stream::{DataReader, DataWriter};
use crate::value::AnyValue;
use crate::Reflect;

// -----------------------------------------------------------------------------
// DynamicSerializer

/// Reads and writes the fully dynamic [`AnyValue`] slot.
///
/// Anything but null is written with its runtime type: boxed primitives and
/// boxed values as typed struct nodes, shared objects as reference nodes.
#[derive(Default)]
pub struct DynamicSerializer;

impl ErasedSerializer for DynamicSerializer {
    fn serialized_type(&self) -> &'static TypeInfo {
        AnyValue::type_info()
    }

    fn write_value_weak(
        &self,
        name: Option<&str>,
        value: &dyn Reflect,
        writer: &mut dyn DataWriter,
    ) -> SerialResult<()> {
        write_weak::<AnyValue>(self, name, value, writer)
    }

    fn read_value_weak(&self, reader: &mut dyn DataReader) -> SerialResult<Box<dyn Reflect>> {
        Ok(Box::new(self.read_value(reader)?))
    }
}

impl Serializer<AnyValue> for DynamicSerializer {
    fn write_value(&self, name: Option<&str>, value: &AnyValue, writer: &mut dyn DataWriter) -> SerialResult<()> {
        match value {
            AnyValue::Null => writer.write_null(name),
            AnyValue::Primitive(primitive) => {
                writer.begin_struct_node(name, Some(primitive.type_info()))?;
                primitive.write(None, writer)?;
                writer.end_node(name)
            }
            AnyValue::Value(value) => write_boxed(name, &**value, writer),
            AnyValue::Object(object) => write_object(name, Some(object), writer),
        }
    }

    fn read_value(&self, reader: &mut dyn DataReader) -> SerialResult<AnyValue> {
        read_polymorphic(reader, AnyValue::type_info())
    }
}

/// Writes a boxed value as a struct node declaring its runtime type.
pub(crate) fn write_boxed(name: Option<&str>, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
    let ty = value.reflect_type_info();
    let formatter = formatter::for_writer(ty, writer)?;
    writer.begin_struct_node(name, Some(ty))?;
    ty.invoke_before_serialize(value);
    formatter.serialize(value, writer)?;
    writer.end_node(name)
}
