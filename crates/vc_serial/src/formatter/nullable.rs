use vc_os::sync::Arc;

use crate::Reflect;
use crate::error::SerialResult;
use crate::formatter::{Formatter, FormatterRegistration, FormatterTarget};
use crate::formatter::{reader_allows_weak, writer_allows_weak};
use crate::impls::OPTION_DEFINITION;
use crate::info::{NullableInfo, TypeInfo, TypeKind};
use crate::serializer;
use crate::stream::{DataReader, DataWriter, EntryType};

/// Formats `Option<T>` of a value type as its value, or a null entry.
pub struct NullableFormatter {
    ty: &'static TypeInfo,
    info: &'static NullableInfo,
}

impl NullableFormatter {
    /// # Panics
    ///
    /// Panics if `ty` is not a nullable value type.
    pub fn new(ty: &'static TypeInfo) -> Self {
        let TypeKind::Nullable(info) = ty.kind() else {
            panic!("`{ty}` is not a nullable type");
        };
        Self { ty, info }
    }
}

impl Formatter for NullableFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        match self.info.get(value) {
            Some(inner) => {
                let serializer = serializer::for_type(self.info.inner(), writer_allows_weak(writer))?;
                serializer.write_value_weak(None, inner, writer)
            }
            None => writer.write_null(None),
        }
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        match reader.peek_entry()?.0 {
            EntryType::Null => {
                reader.read_null()?;
            }
            entry if entry.is_end() => {}
            _ => {
                let serializer = serializer::for_type(self.info.inner(), reader_allows_weak(reader))?;
                let inner = serializer.read_value_weak(reader)?;
                if !self.info.set(value, inner) {
                    reader.context().debug().log_error(format_args!(
                        "`{}` rejected a value read as `{}`",
                        self.ty,
                        self.info.inner(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn create(ty: &'static TypeInfo) -> Option<Arc<dyn Formatter>> {
    Some(Arc::new(NullableFormatter::new(ty)))
}

fn is_nullable(ty: &'static TypeInfo) -> bool {
    matches!(ty.kind(), TypeKind::Nullable(_))
}

pub(crate) static NULLABLE_FORMATTER: FormatterRegistration = FormatterRegistration {
    name: "vc_serial::NullableFormatter",
    priority: 0,
    target: FormatterTarget::GenericDefinition(OPTION_DEFINITION),
    create,
    weak_fallback: None,
    can_format: Some(is_nullable),
};
