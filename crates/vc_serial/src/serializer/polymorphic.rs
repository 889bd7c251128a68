//! Reference nodes and cast recovery for reference slots.
//!
//! A shared object is written in full the first time it is met in a session,
//! as a reference node carrying its id and its runtime type. Later
//! occurrences only write a reference entry.
//!
//! When a node declares a type `S` that is not the expected type `E`, reading
//! recovers in order: accept `S` if it is assignable to `E` (boxed primitives
//! in dynamic slots included); convert `S` through a registered conversion;
//! read the members as `E` if the policy tolerates invalid data; otherwise
//! read the node as `S` so the ids inside it stay resolvable, and drop it.

use alloc::format;
use alloc::string::String;

use crate::context::{ExternalReference, InternalReference};
use crate::error::SerialResult;
use crate::formatter;
use crate::info::{TypeInfo, TypeKind};
use crate::registry::{TypeRegistryArc, TypeTraitConvert};
use crate::serializer::complex::{instantiate, log_value_lost, read_members};
use crate::stream::{DataReader, DataWriter, DeclaredType, EntryType, NodeInfo, skip_entry};
use crate::value::{AnyValue, ObjectRef, PrimitiveValue};

// -----------------------------------------------------------------------------
// Write

/// Writes a reference slot holding `object`.
pub(crate) fn write_object(
    name: Option<&str>,
    object: Option<&ObjectRef>,
    writer: &mut dyn DataWriter,
) -> SerialResult<()> {
    let Some(object) = object else {
        return writer.write_null(name);
    };

    if let Some(external) = writer.context().try_register_external_reference(object) {
        return match external {
            ExternalReference::Index(index) => writer.write_external_reference_by_index(name, index),
            ExternalReference::Guid(guid) => writer.write_external_reference_by_guid(name, guid),
            ExternalReference::String(key) => writer.write_external_reference_by_string(name, &key),
        };
    }

    let id = match writer.context_mut().try_register_internal_reference(object) {
        InternalReference::Existing(id) => return writer.write_internal_reference(name, id),
        InternalReference::New(id) => id,
    };

    let ty = object.type_info();
    let formatter = formatter::for_writer(ty, writer)?;
    // Always typed, a skipping reader only registers ids of typed nodes.
    writer.begin_reference_node(name, Some(ty), id)?;
    match object.borrow() {
        Some(value) => {
            ty.invoke_before_serialize(&*value);
            formatter.serialize(&*value, writer)?;
        }
        None => writer.context().debug().log_error(format_args!(
            "object {id} of type `{ty}` is mutably borrowed or unfilled, writing it empty",
        )),
    }
    writer.end_node(name)
}

// -----------------------------------------------------------------------------
// Read

/// Returns `true` if a slot of type `expected` may hold boxed primitives.
pub(crate) fn may_box_primitive(expected: &TypeInfo) -> bool {
    match expected.kind() {
        TypeKind::Dynamic => true,
        TypeKind::Interface(info) => info.is_root(),
        _ => false,
    }
}

/// Reads a reference slot declared as `expected`.
///
/// Every failure is logged once and reads as [`AnyValue::Null`].
pub(crate) fn read_polymorphic(
    reader: &mut dyn DataReader,
    expected: &'static TypeInfo,
) -> SerialResult<AnyValue> {
    let (entry, name) = reader.peek_entry()?;
    match entry {
        EntryType::Null => {
            reader.read_null()?;
            Ok(AnyValue::Null)
        }
        EntryType::StartOfNode => {
            let Some(node) = reader.enter_node()? else {
                return Ok(AnyValue::Null);
            };
            let value = read_node(reader, &node, expected)?;
            reader.exit_node()?;
            Ok(value)
        }
        EntryType::InternalReference => {
            let Some(id) = reader.read_internal_reference()? else {
                return Ok(AnyValue::Null);
            };
            let object = reader.context().internal_reference(id);
            Ok(accept_reference(reader, object, expected, || format!("internal reference {id}")))
        }
        EntryType::ExternalReferenceByIndex => {
            let Some(index) = reader.read_external_reference_by_index()? else {
                return Ok(AnyValue::Null);
            };
            let object = reader.context().external_object_by_index(index);
            Ok(accept_reference(reader, object, expected, || {
                format!("external reference by index {index}")
            }))
        }
        EntryType::ExternalReferenceByGuid => {
            let Some(guid) = reader.read_external_reference_by_guid()? else {
                return Ok(AnyValue::Null);
            };
            let object = reader.context().external_object_by_guid(guid);
            Ok(accept_reference(reader, object, expected, || {
                format!("external reference by guid {guid}")
            }))
        }
        EntryType::ExternalReferenceByString => {
            let Some(key) = reader.read_external_reference_by_string()? else {
                return Ok(AnyValue::Null);
            };
            let object = reader.context().external_object_by_string(&key);
            Ok(accept_reference(reader, object, expected, || {
                format!("external reference by string {key:?}")
            }))
        }
        entry if entry.is_primitive() && may_box_primitive(expected) => read_boxed_primitive(reader, entry),
        entry if entry.is_end() => {
            reader.context().debug().log_warning(format_args!(
                "expected a value of `{expected}` but reached {entry:?}, using null",
            ));
            Ok(AnyValue::Null)
        }
        entry => {
            reader.context().debug().log_warning(format_args!(
                "entry {name:?} of type {entry:?} cannot be read as `{expected}`, using null",
            ));
            skip_entry(reader)?;
            Ok(AnyValue::Null)
        }
    }
}

fn accept_reference(
    reader: &dyn DataReader,
    object: Option<ObjectRef>,
    expected: &'static TypeInfo,
    describe: impl FnOnce() -> String,
) -> AnyValue {
    match object {
        Some(object) if object.type_info().is_assignable_to(expected) => AnyValue::Object(object),
        Some(object) => {
            reader.context().debug().log_warning(format_args!(
                "{} resolves to an object of type `{}` which cannot be assigned to `{expected}`, \
                 using null",
                describe(),
                object.type_info(),
            ));
            AnyValue::Null
        }
        None => {
            reader.context().debug().log_warning(format_args!(
                "{} could not be resolved, using null",
                describe(),
            ));
            AnyValue::Null
        }
    }
}

fn read_boxed_primitive(reader: &mut dyn DataReader, entry: EntryType) -> SerialResult<AnyValue> {
    let value = match entry {
        EntryType::Boolean => reader.read_bool()?.map(PrimitiveValue::Bool),
        EntryType::Integer => reader.read_i64()?.map(PrimitiveValue::I64),
        EntryType::FloatingPoint => reader.read_f64()?.map(PrimitiveValue::F64),
        EntryType::String => reader.read_string()?.map(PrimitiveValue::String),
        EntryType::Guid => reader.read_guid()?.map(PrimitiveValue::Guid),
        _ => None,
    };
    match value {
        Some(value) => Ok(AnyValue::Primitive(value)),
        None => {
            reader.context().debug().log_warning(format_args!(
                "failed to box a primitive entry of type {entry:?}, using null",
            ));
            Ok(AnyValue::Null)
        }
    }
}

// Reads the members of a node that was just entered.
fn read_node(
    reader: &mut dyn DataReader,
    node: &NodeInfo,
    expected: &'static TypeInfo,
) -> SerialResult<AnyValue> {
    let allow_invalid = reader.context().policy().allow_deserialize_invalid_data();
    match &node.declared {
        DeclaredType::Absent => read_as(reader, expected, node.id),
        DeclaredType::Resolved(source) if *source == expected => read_as(reader, expected, node.id),
        DeclaredType::Resolved(source) => {
            let source: &'static TypeInfo = source;
            // Boxed primitives and enums land here for dynamic slots.
            if source.is_assignable_to(expected) {
                return read_as(reader, source, node.id);
            }
            let convert = TypeRegistryArc::global().type_trait::<TypeTraitConvert>(source);
            if let Some(convert) = convert
                && let Some(target) = convert.target_for(expected)
            {
                return read_converted(reader, source, target, &convert, node.id);
            }
            if allow_invalid && !expected.is_abstract() {
                reader.context().debug().log_warning(format_args!(
                    "node {} declares type `{source}` which cannot be assigned to `{expected}`, \
                     reading its members as `{expected}`",
                    node.id,
                ));
                return read_as(reader, expected, node.id);
            }
            // Read as `S` so ids nested in the node stay registered.
            read_discarded(reader, source, node.id)?;
            log_value_lost(reader, source, expected);
            Ok(AnyValue::Null)
        }
        DeclaredType::Unresolved(type_name) if names_type(reader, type_name, expected) => {
            read_as(reader, expected, node.id)
        }
        DeclaredType::Unresolved(type_name) => {
            if allow_invalid && !expected.is_abstract() {
                reader.context().debug().log_warning(format_args!(
                    "node {} declares unknown type {type_name:?}, reading its members as \
                     `{expected}`",
                    node.id,
                ));
                return read_as(reader, expected, node.id);
            }
            register_null(reader, node.id);
            reader.context().debug().log_warning(format_args!(
                "Value lost: node {} declares unknown type {type_name:?} where `{expected}` is \
                 expected",
                node.id,
            ));
            Ok(AnyValue::Null)
        }
    }
}

// A node written with exactly the slot's type reads even when the binder
// cannot resolve the name.
fn names_type(reader: &dyn DataReader, type_name: &str, ty: &'static TypeInfo) -> bool {
    let context = reader.context();
    !ty.is_abstract() && context.binder().bind_to_name(ty, context.debug()) == type_name
}

fn register_null(reader: &mut dyn DataReader, id: i32) {
    if id >= 0 {
        reader.context_mut().register_internal_reference(id, None);
    }
}

/// Reads the members of the current node as a new `ty`.
///
/// A node with an id becomes a shared object, registered before its members
/// are read so that cycles through it resolve.
fn read_as(reader: &mut dyn DataReader, ty: &'static TypeInfo, id: i32) -> SerialResult<AnyValue> {
    if ty.is_abstract() {
        register_null(reader, id);
        reader.context().debug().log_warning(format_args!(
            "cannot instantiate abstract type `{ty}` for node {id}, using null",
        ));
        return Ok(AnyValue::Null);
    }
    if id < 0 {
        let value = read_members(ty, reader, &|| instantiate(ty))?;
        return Ok(AnyValue::from_value(value));
    }
    let object = ObjectRef::placeholder(ty);
    reader.context_mut().register_internal_reference(id, Some(object.clone()));
    let value = read_members(ty, reader, &|| instantiate(ty))?;
    object.fill(value);
    Ok(AnyValue::Object(object))
}

// The id is bound to the converted object, not to the source.
fn read_converted(
    reader: &mut dyn DataReader,
    source: &'static TypeInfo,
    target: &'static TypeInfo,
    convert: &TypeTraitConvert,
    id: i32,
) -> SerialResult<AnyValue> {
    let object = (id >= 0).then(|| ObjectRef::placeholder(target));
    if let Some(object) = &object {
        reader.context_mut().register_internal_reference(id, Some(object.clone()));
    }
    let value = read_members(source, reader, &|| instantiate(source))?;
    match convert.convert(value, target) {
        Ok(converted) if converted.reflect_type_info() == target => Ok(match object {
            Some(object) => {
                object.fill(converted);
                AnyValue::Object(object)
            }
            None => AnyValue::from_value(converted),
        }),
        _ => {
            register_null(reader, id);
            log_value_lost(reader, source, target);
            Ok(AnyValue::Null)
        }
    }
}

// Reads a node nobody asked for, keeping its ids resolvable.
fn read_discarded(reader: &mut dyn DataReader, ty: &'static TypeInfo, id: i32) -> SerialResult<()> {
    if ty.is_abstract() || !ty.has_default() {
        register_null(reader, id);
        return Ok(());
    }
    read_as(reader, ty, id).map(drop)
}

/// Reads a node met while skipping, see [`skip_entry`].
pub(crate) fn read_skipped_node(reader: &mut dyn DataReader, node: &NodeInfo) -> SerialResult<()> {
    match node.declared.resolved() {
        Some(ty) => read_discarded(reader, ty, node.id),
        None => Ok(()),
    }
}
