use alloc::boxed::Box;

use crate::Reflect;
use crate::error::SerialResult;
use crate::info::{TypeInfo, TypeKind};
use crate::serializer::complex::instantiate;
use crate::serializer::dynamic::DynamicSerializer;
use crate::serializer::enum_serializer::{read_enum, write_enum};
use crate::serializer::primitive::read_primitive_weak;
use crate::serializer::reference::into_object;
use crate::serializer::{ErasedSerializer, Serializer, read_polymorphic, read_value_node};
use crate::serializer::{write_object, write_value_node};
use crate::stream::{DataReader, DataWriter};
use crate::value::{AnyValue, PrimitiveValue};

// -----------------------------------------------------------------------------
// AnySerializer

/// The weak fallback serializer of a runtime type without a compiled
/// serializer.
///
/// Values only pass through `dyn Reflect`, dispatched on the shape of the
/// type. Reading needs the type's default constructor; a type without one
/// raises the abort signal.
pub struct AnySerializer {
    ty: &'static TypeInfo,
}

impl AnySerializer {
    #[inline]
    pub const fn new(ty: &'static TypeInfo) -> Self {
        Self { ty }
    }
}

impl ErasedSerializer for AnySerializer {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn write_value_weak(
        &self,
        name: Option<&str>,
        value: &dyn Reflect,
        writer: &mut dyn DataWriter,
    ) -> SerialResult<()> {
        let ty = self.ty;
        if value.reflect_type_info() != ty {
            writer.context().debug().log_error(format_args!(
                "serializer of `{ty}` was given a value of type `{}`, writing null",
                value.reflect_type_info(),
            ));
            return writer.write_null(name);
        }

        match ty.kind() {
            TypeKind::Primitive(_) => match PrimitiveValue::from_reflect(value) {
                Some(primitive) => primitive.write(name, writer),
                None => writer.write_null(name),
            },
            TypeKind::Enum(_) => write_enum(ty, name, value, writer),
            TypeKind::Reference(info) => write_object(name, info.get(value).as_ref(), writer),
            TypeKind::Dynamic => match value.downcast_ref::<AnyValue>() {
                Some(value) => DynamicSerializer.write_value(name, value, writer),
                None => writer.write_null(name),
            },
            _ => write_value_node(ty, name, value, writer),
        }
    }

    fn read_value_weak(&self, reader: &mut dyn DataReader) -> SerialResult<Box<dyn Reflect>> {
        let ty = self.ty;
        match ty.kind() {
            TypeKind::Primitive(kind) => Ok(read_primitive_weak(*kind, reader)?.into_reflect()),
            TypeKind::Enum(_) => match read_enum(ty, reader)? {
                Some(value) => Ok(value),
                None => instantiate(ty),
            },
            TypeKind::Reference(info) => {
                let object = into_object(read_polymorphic(reader, info.target())?);
                let mut slot = instantiate(ty)?;
                if !info.set(&mut *slot, object) {
                    reader.context().debug().log_warning(format_args!(
                        "object read for a slot of `{ty}` cannot be assigned to `{}`, using null",
                        info.target(),
                    ));
                }
                Ok(slot)
            }
            TypeKind::Dynamic => Ok(Box::new(DynamicSerializer.read_value(reader)?)),
            _ => read_value_node(ty, reader, &|| instantiate(ty)),
        }
    }
}
