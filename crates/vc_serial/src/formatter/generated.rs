//! Support code for the formatters generated by `#[derive(Serial)]`.
//!
//! A generated formatter reads and writes the members of one struct through
//! their statically typed serializers, so no [`FieldInfo`] projection or
//! weak lookup happens per value. Member selection is decided once, when
//! the formatter is created for a policy.
//!
//! [`FieldInfo`]: crate::info::FieldInfo

use crate::context::SerializationPolicy;
use crate::error::SerialResult;
use crate::info::{TypeInfo, TypeKind};
use crate::stream::{DataReader, DataWriter, skip_entry, skip_to_end_of_node};
use crate::{Reflect, Serial, serializer};

/// Returns which of the `N` declared members of `ty` `policy` serializes.
pub fn select_members<const N: usize>(ty: &'static TypeInfo, policy: &SerializationPolicy) -> [bool; N] {
    let TypeKind::Struct(info) = ty.kind() else {
        return [false; N];
    };
    let fields = info.fields();
    core::array::from_fn(|index| {
        fields
            .get(index)
            .is_some_and(|field| policy.should_serialize_field(field))
    })
}

/// Writes one member as a named entry.
#[inline]
pub fn write_member<F: Serial>(name: &str, member: &F, writer: &mut dyn DataWriter) -> SerialResult<()> {
    serializer::get::<F>().write_value(Some(name), member, writer)
}

/// Reads the current entry into `member`.
#[inline]
pub fn read_member<F: Serial>(member: &mut F, reader: &mut dyn DataReader) -> SerialResult<bool> {
    *member = serializer::get::<F>().read_value(reader)?;
    Ok(true)
}

/// Reads entries until the end of the current node.
///
/// `read` is called with the name of every named entry and returns `false`
/// if no member takes it; such entries are logged and skipped.
pub fn read_members(
    ty: &'static TypeInfo,
    reader: &mut dyn DataReader,
    mut read: impl FnMut(&str, &mut dyn DataReader) -> SerialResult<bool>,
) -> SerialResult<()> {
    loop {
        let (entry, name) = reader.peek_entry()?;
        if entry.is_end() {
            return Ok(());
        }
        let Some(name) = name else {
            reader.context().debug().log_error(format_args!(
                "unnamed entry of type {entry:?} in a node of `{ty}`, skipping it",
            ));
            skip_entry(reader)?;
            continue;
        };
        if !read(&name, reader)? {
            reader.context().debug().log_warning(format_args!(
                "Lost serialization data for entry {name:?} of type {entry:?}: no member with \
                 that name could be found in type `{ty}`",
            ));
            skip_entry(reader)?;
        }
    }
}

/// Logs a value handed to the formatter of another type and writes nothing.
pub fn write_mismatched(ty: &'static TypeInfo, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
    writer.context().debug().log_error(format_args!(
        "formatter of `{ty}` was given a value of type `{}`, its members are not written",
        value.reflect_type_info(),
    ));
    Ok(())
}

/// Logs a value handed to the formatter of another type and skips the node.
pub fn read_mismatched(ty: &'static TypeInfo, value: &dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
    reader.context().debug().log_error(format_args!(
        "formatter of `{ty}` was given a value of type `{}`, its members are skipped",
        value.reflect_type_info(),
    ));
    skip_to_end_of_node(reader)
}

/// Panics for a field projection handed a value of another type.
#[cold]
pub fn owner_mismatch(ty: &'static TypeInfo) -> ! {
    panic!("member of `{ty}` projected from a value of another type")
}
