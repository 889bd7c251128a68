use alloc::boxed::Box;

use vc_os::sync::Arc;

use crate::Reflect;
use crate::context::SerializationPolicy;
use crate::error::SerialResult;
use crate::formatter::array::{enter_array, has_next};
use crate::formatter::{Formatter, FormatterLocator, LocatorRegistration, LocatorStep};
use crate::formatter::{reader_allows_weak, writer_allows_weak};
use crate::info::{CollectionInfo, TypeInfo, TypeKind};
use crate::serializer;
use crate::stream::{DataReader, DataWriter};

/// Formats a generic collection (`VecDeque`, sets) as an array of its items.
pub struct CollectionFormatter {
    ty: &'static TypeInfo,
    info: &'static CollectionInfo,
}

impl CollectionFormatter {
    /// # Panics
    ///
    /// Panics if `ty` is not a collection type.
    pub fn new(ty: &'static TypeInfo) -> Self {
        let TypeKind::Collection(info) = ty.kind() else {
            panic!("`{ty}` is not a collection type");
        };
        Self { ty, info }
    }
}

impl Formatter for CollectionFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        let serializer = serializer::for_type(self.info.item(), writer_allows_weak(writer))?;
        writer.begin_array_node(self.info.len(value) as u64)?;
        for item in self.info.iter(value) {
            serializer.write_value_weak(None, item, writer)?;
        }
        writer.end_array_node()
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        if enter_array(reader, self.ty)?.is_none() {
            return Ok(());
        }
        let serializer = serializer::for_type(self.info.item(), reader_allows_weak(reader))?;
        while has_next(reader)? {
            let item = serializer.read_value_weak(reader)?;
            if self.info.insert(value, item).is_err() {
                reader.context().debug().log_error(format_args!(
                    "collection `{}` rejected an item read as `{}`",
                    self.ty,
                    self.info.item(),
                ));
            }
        }
        reader.exit_array()?;
        Ok(())
    }
}

/// Locates the [`CollectionFormatter`] of collection types.
pub struct CollectionFormatterLocator;

impl FormatterLocator for CollectionFormatterLocator {
    fn try_get_formatter(
        &self,
        ty: &'static TypeInfo,
        step: LocatorStep,
        _policy: &Arc<SerializationPolicy>,
        _allow_weak_fallback: bool,
    ) -> SerialResult<Option<Arc<dyn Formatter>>> {
        match (step, ty.kind()) {
            (LocatorStep::AfterRegisteredFormatters, TypeKind::Collection(_)) => {
                Ok(Some(Arc::new(CollectionFormatter::new(ty))))
            }
            _ => Ok(None),
        }
    }
}

pub(crate) static COLLECTION_LOCATOR: LocatorRegistration = LocatorRegistration {
    name: "vc_serial::CollectionFormatterLocator",
    priority: -100,
    create: || Box::new(CollectionFormatterLocator),
};
