use alloc::boxed::Box;

use vc_os::sync::Arc;

use crate::Reflect;
use crate::context::SerializationPolicy;
use crate::error::SerialResult;
use crate::formatter::{Formatter, FormatterLocator, LocatorRegistration, LocatorStep};
use crate::info::{TypeInfo, TypeKind, Typed};
use crate::stream::{DataReader, DataWriter, EntryType, skip_entry};
use crate::value::TypeRef;

/// Formats a [`TypeRef`] as the binder name of the type, or null.
pub struct TypeRefFormatter;

impl Formatter for TypeRefFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        TypeRef::type_info()
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        match value.downcast_ref::<TypeRef>().and_then(TypeRef::get) {
            Some(ty) => {
                let context = writer.context();
                let name = context.binder().bind_to_name(ty, context.debug());
                writer.write_string(None, &name)
            }
            None => writer.write_null(None),
        }
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        let ty = match reader.peek_entry()?.0 {
            EntryType::String => {
                let Some(name) = reader.read_string()? else {
                    return Ok(());
                };
                let context = reader.context();
                context.binder().bind_to_type(&name, context.debug())
            }
            EntryType::Null => {
                reader.read_null()?;
                None
            }
            entry if entry.is_end() => return Ok(()),
            entry => {
                reader.context().debug().log_warning(format_args!(
                    "expected a type name but found an entry of type {entry:?}, skipping it",
                ));
                skip_entry(reader)?;
                return Ok(());
            }
        };
        if let Some(value) = value.downcast_mut::<TypeRef>() {
            *value = TypeRef(ty);
        }
        Ok(())
    }
}

/// Locates the [`TypeRefFormatter`].
pub struct TypeRefFormatterLocator;

impl FormatterLocator for TypeRefFormatterLocator {
    fn try_get_formatter(
        &self,
        ty: &'static TypeInfo,
        step: LocatorStep,
        _policy: &Arc<SerializationPolicy>,
        _allow_weak_fallback: bool,
    ) -> SerialResult<Option<Arc<dyn Formatter>>> {
        match (step, ty.kind()) {
            (LocatorStep::AfterRegisteredFormatters, TypeKind::TypeRef) => Ok(Some(Arc::new(TypeRefFormatter))),
            _ => Ok(None),
        }
    }
}

pub(crate) static TYPE_REF_LOCATOR: LocatorRegistration = LocatorRegistration {
    name: "vc_serial::TypeRefFormatterLocator",
    priority: -70,
    create: || Box::new(TypeRefFormatterLocator),
};
