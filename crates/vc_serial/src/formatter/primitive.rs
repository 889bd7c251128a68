use crate::Reflect;
use crate::error::SerialResult;
use crate::formatter::{Formatter, reader_allows_weak, writer_allows_weak};
use crate::info::{TypeInfo, TypeKind};
use crate::serializer;
use crate::stream::{DataReader, DataWriter};

/// Formats a type that is written as a single entry: primitives, enums,
/// reference slots and the dynamic slot.
///
/// Used when such a value is boxed inside a typed node. The value is the
/// one unnamed entry of the node.
pub struct PrimitiveFormatter {
    ty: &'static TypeInfo,
}

impl PrimitiveFormatter {
    pub fn new(ty: &'static TypeInfo) -> Self {
        assert!(Self::can_format(ty), "`{ty}` is not written as a single entry");
        Self { ty }
    }

    /// Returns `true` if values of `ty` are written as a single entry.
    pub fn can_format(ty: &TypeInfo) -> bool {
        matches!(
            ty.kind(),
            TypeKind::Primitive(_) | TypeKind::Enum(_) | TypeKind::Reference(_) | TypeKind::Dynamic
        )
    }
}

impl Formatter for PrimitiveFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        let serializer = serializer::for_type(self.ty, writer_allows_weak(writer))?;
        serializer.write_value_weak(None, value, writer)
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        let (entry, _) = reader.peek_entry()?;
        if entry.is_end() {
            reader.context().debug().log_warning(format_args!(
                "node of `{}` holds no value, using the default",
                self.ty,
            ));
            return Ok(());
        }
        let serializer = serializer::for_type(self.ty, reader_allows_weak(reader))?;
        let read = serializer.read_value_weak(reader)?;
        if value.set(read).is_err() {
            reader.context().debug().log_error(format_args!(
                "serializer of `{}` produced a value of another type",
                self.ty,
            ));
        }
        Ok(())
    }
}
