use alloc::boxed::Box;
use core::marker::PhantomData;

use crate::error::{AbortError, SerialResult};
use crate::formatter;
use crate::info::{TypeInfo, Typed};
use crate::registry::{TypeRegistryArc, TypeTraitConvert};
use crate::serializer::{ErasedSerializer, Serializer, write_weak};
use crate::stream::{DataReader, DataWriter, DeclaredType, EntryType, NodeInfo};
use crate::{Reflect, Serial};

// -----------------------------------------------------------------------------
// ComplexTypeSerializer

/// Reads and writes a value type as a struct node whose members are handled
/// by the type's formatter.
///
/// Value types have no identity, so the node carries neither an id nor a
/// type. When reading, a node that declares another type is converted if a
/// conversion is registered, read as `T` if the policy allows invalid data,
/// and dropped otherwise.
pub struct ComplexTypeSerializer<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T: Serial> ComplexTypeSerializer<T> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T: Serial> Default for ComplexTypeSerializer<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serial> ErasedSerializer for ComplexTypeSerializer<T> {
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

impl<T: Serial> Serializer<T> for ComplexTypeSerializer<T> {
    fn write_value(&self, name: Option<&str>, value: &T, writer: &mut dyn DataWriter) -> SerialResult<()> {
        write_value_node(T::type_info(), name, value, writer)
    }

    fn read_value(&self, reader: &mut dyn DataReader) -> SerialResult<T> {
        let value = read_value_node(T::type_info(), reader, &|| Ok(Box::new(T::default())))?;
        Ok(value.take::<T>().unwrap_or_default())
    }
}

// -----------------------------------------------------------------------------
// Value nodes

/// Creates the default instance of `ty`, aborting if it has no constructor.
pub(crate) fn instantiate(ty: &'static TypeInfo) -> SerialResult<Box<dyn Reflect>> {
    ty.create_default()
        .ok_or_else(|| AbortError::NotConstructible(ty.type_path().into()).into())
}

/// Writes `value` of type `ty` as an untyped struct node.
pub(crate) fn write_value_node(
    ty: &'static TypeInfo,
    name: Option<&str>,
    value: &dyn Reflect,
    writer: &mut dyn DataWriter,
) -> SerialResult<()> {
    let formatter = formatter::for_writer(ty, writer)?;
    writer.begin_struct_node(name, None)?;
    ty.invoke_before_serialize(value);
    formatter.serialize(value, writer)?;
    writer.end_node(name)
}

/// Reads a struct node holding a value of type `ty`.
///
/// Anything that is not a node yields `create()` after one warning.
pub(crate) fn read_value_node(
    ty: &'static TypeInfo,
    reader: &mut dyn DataReader,
    create: &dyn Fn() -> SerialResult<Box<dyn Reflect>>,
) -> SerialResult<Box<dyn Reflect>> {
    let (entry, name) = reader.peek_entry()?;
    match entry {
        EntryType::StartOfNode => {}
        EntryType::Null => {
            reader.context().debug().log_warning(format_args!(
                "expected a node of value type `{ty}` for entry {name:?} but found null, \
                 using the default",
            ));
            reader.read_null()?;
            return create();
        }
        entry => {
            reader.context().debug().log_warning(format_args!(
                "expected a node of value type `{ty}` for entry {name:?} but found {entry:?}, \
                 the value is lost",
            ));
            crate::stream::skip_entry(reader)?;
            return create();
        }
    }

    let Some(node) = reader.enter_node()? else {
        return create();
    };
    let value = read_value_contents(ty, &node, reader, create)?;
    reader.exit_node()?;
    Ok(value)
}

fn read_value_contents(
    ty: &'static TypeInfo,
    node: &NodeInfo,
    reader: &mut dyn DataReader,
    create: &dyn Fn() -> SerialResult<Box<dyn Reflect>>,
) -> SerialResult<Box<dyn Reflect>> {
    let allow_invalid = reader.context().policy().allow_deserialize_invalid_data();
    match &node.declared {
        DeclaredType::Absent => read_members(ty, reader, create),
        DeclaredType::Resolved(source) if *source == ty => read_members(ty, reader, create),
        DeclaredType::Resolved(source) => {
            let source: &'static TypeInfo = source;
            let convert = TypeRegistryArc::global().type_trait::<TypeTraitConvert>(source);
            if let Some(convert) = convert.filter(|c| c.can_convert_to(ty)) {
                let value = read_members(source, reader, &|| instantiate(source))?;
                return match convert.convert(value, ty) {
                    Ok(value) if value.reflect_type_info() == ty => Ok(value),
                    _ => {
                        log_value_lost(reader, source, ty);
                        create()
                    }
                };
            }
            if allow_invalid {
                reader.context().debug().log_warning(format_args!(
                    "node declares type `{source}` which is not `{ty}`, reading its members \
                     as `{ty}`",
                ));
                read_members(ty, reader, create)
            } else {
                log_value_lost(reader, source, ty);
                create()
            }
        }
        DeclaredType::Unresolved(type_name) => {
            if allow_invalid {
                reader.context().debug().log_warning(format_args!(
                    "node declares unknown type {type_name:?}, reading its members as `{ty}`",
                ));
                read_members(ty, reader, create)
            } else {
                reader.context().debug().log_warning(format_args!(
                    "Value lost: node declares unknown type {type_name:?} where `{ty}` is \
                     expected",
                ));
                create()
            }
        }
    }
}

/// Reads the members of the current node into a new instance.
pub(crate) fn read_members(
    ty: &'static TypeInfo,
    reader: &mut dyn DataReader,
    create: &dyn Fn() -> SerialResult<Box<dyn Reflect>>,
) -> SerialResult<Box<dyn Reflect>> {
    let formatter = formatter::for_reader(ty, reader)?;
    let mut value = create()?;
    formatter.deserialize(&mut *value, reader)?;
    ty.invoke_after_deserialize(&mut *value);
    Ok(value)
}

pub(crate) fn log_value_lost(reader: &dyn DataReader, source: &TypeInfo, expected: &TypeInfo) {
    reader.context().debug().log_warning(format_args!(
        "Value lost: node of type `{source}` cannot be cast to `{expected}`",
    ));
}
