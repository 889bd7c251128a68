use alloc::vec::Vec;

use crate::Reflect;
use crate::context::SerializationPolicy;
use crate::error::SerialResult;
use crate::formatter::{Formatter, reader_allows_weak, writer_allows_weak};
use crate::info::{FieldInfo, TypeInfo, TypeKind};
use crate::serializer;
use crate::stream::{DataReader, DataWriter, skip_entry};

// -----------------------------------------------------------------------------
// ReflectionFormatter

/// Formats a struct by walking its [`FieldInfo`]s at call time.
///
/// Members are written as named entries in declaration order. Reading
/// matches entries by name, so reordered, missing or extra members are
/// tolerated: missing members keep their default, extra entries are logged
/// and skipped.
pub struct ReflectionFormatter {
    ty: &'static TypeInfo,
    fields: Vec<&'static FieldInfo>,
}

impl ReflectionFormatter {
    /// Creates the formatter of the members of `ty` that `policy` selects.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a struct.
    pub fn new(ty: &'static TypeInfo, policy: &SerializationPolicy) -> Self {
        let TypeKind::Struct(info) = ty.kind() else {
            panic!("`{ty}` is not a struct type");
        };
        let fields = info
            .fields()
            .iter()
            .filter(|field| policy.should_serialize_field(field))
            .collect();
        Self { ty, fields }
    }

    /// The members this formatter reads and writes.
    pub fn fields(&self) -> impl Iterator<Item = &'static FieldInfo> + '_ {
        self.fields.iter().copied()
    }

    fn field(&self, name: &str) -> Option<&'static FieldInfo> {
        self.fields.iter().copied().find(|field| field.name() == name)
    }
}

impl Formatter for ReflectionFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        let allow_weak = writer_allows_weak(writer);
        for field in &self.fields {
            let serializer = serializer::for_type(field.type_info(), allow_weak)?;
            serializer.write_value_weak(Some(field.name()), field.get(value), writer)?;
        }
        Ok(())
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        let allow_weak = reader_allows_weak(reader);
        loop {
            let (entry, name) = reader.peek_entry()?;
            if entry.is_end() {
                return Ok(());
            }
            let Some(name) = name else {
                reader.context().debug().log_error(format_args!(
                    "unnamed entry of type {entry:?} in a node of `{}`, skipping it",
                    self.ty,
                ));
                skip_entry(reader)?;
                continue;
            };
            let Some(field) = self.field(&name) else {
                reader.context().debug().log_warning(format_args!(
                    "Lost serialization data for entry {name:?} of type {entry:?}: no member \
                     with that name could be found in type `{}`",
                    self.ty,
                ));
                skip_entry(reader)?;
                continue;
            };

            let serializer = serializer::for_type(field.type_info(), allow_weak)?;
            let member = serializer.read_value_weak(reader)?;
            if field.get_mut(value).set(member).is_err() {
                reader.context().debug().log_error(format_args!(
                    "member `{}` of `{}` rejected the value read for it",
                    field.name(),
                    self.ty,
                ));
            }
        }
    }
}

// -----------------------------------------------------------------------------
// EmptyTypeFormatter

/// Writes nothing and reads nothing; values keep their default.
///
/// Used for types the policy refuses to serialize and for types no
/// formatter can handle.
pub struct EmptyTypeFormatter {
    ty: &'static TypeInfo,
}

impl EmptyTypeFormatter {
    #[inline]
    pub fn new(ty: &'static TypeInfo) -> Self {
        Self { ty }
    }
}

impl Formatter for EmptyTypeFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn serialize(&self, _value: &dyn Reflect, _writer: &mut dyn DataWriter) -> SerialResult<()> {
        Ok(())
    }

    fn deserialize(&self, _value: &mut dyn Reflect, _reader: &mut dyn DataReader) -> SerialResult<()> {
        Ok(())
    }
}
