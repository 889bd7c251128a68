use alloc::boxed::Box;

use vc_os::sync::Arc;

use crate::Reflect;
use crate::error::SerialResult;
use crate::formatter::array::{enter_array, has_next};
use crate::formatter::{Formatter, FormatterRegistration, FormatterTarget};
use crate::formatter::{reader_allows_weak, writer_allows_weak};
use crate::impls::{BTREE_MAP_DEFINITION, HASH_MAP_DEFINITION};
use crate::info::{MapInfo, TypeInfo, TypeKind};
use crate::serializer;
use crate::stream::{DataReader, DataWriter, EntryType, skip_entry};

const KEY: &str = "key";
const VALUE: &str = "value";

/// Formats a map as an array of `{ key, value }` struct nodes.
pub struct DictionaryFormatter {
    ty: &'static TypeInfo,
    info: &'static MapInfo,
}

impl DictionaryFormatter {
    /// # Panics
    ///
    /// Panics if `ty` is not a map type.
    pub fn new(ty: &'static TypeInfo) -> Self {
        let TypeKind::Map(info) = ty.kind() else {
            panic!("`{ty}` is not a map type");
        };
        Self { ty, info }
    }

    fn read_pair(
        &self,
        reader: &mut dyn DataReader,
        allow_weak: bool,
    ) -> SerialResult<(Option<Box<dyn Reflect>>, Option<Box<dyn Reflect>>)> {
        let key_serializer = serializer::for_type(self.info.key(), allow_weak)?;
        let value_serializer = serializer::for_type(self.info.value(), allow_weak)?;
        let (mut key, mut value) = (None, None);
        loop {
            let (entry, name) = reader.peek_entry()?;
            if entry.is_end() {
                return Ok((key, value));
            }
            match name.as_deref() {
                Some(KEY) => key = Some(key_serializer.read_value_weak(reader)?),
                Some(VALUE) => value = Some(value_serializer.read_value_weak(reader)?),
                _ => {
                    reader.context().debug().log_warning(format_args!(
                        "unexpected entry {name:?} in an entry of `{}`, skipping it",
                        self.ty,
                    ));
                    skip_entry(reader)?;
                }
            }
        }
    }
}

impl Formatter for DictionaryFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        let allow_weak = writer_allows_weak(writer);
        let key_serializer = serializer::for_type(self.info.key(), allow_weak)?;
        let value_serializer = serializer::for_type(self.info.value(), allow_weak)?;
        writer.begin_array_node(self.info.len(value) as u64)?;
        for (key, value) in self.info.iter(value) {
            writer.begin_struct_node(None, None)?;
            key_serializer.write_value_weak(Some(KEY), key, writer)?;
            value_serializer.write_value_weak(Some(VALUE), value, writer)?;
            writer.end_node(None)?;
        }
        writer.end_array_node()
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        if enter_array(reader, self.ty)?.is_none() {
            return Ok(());
        }
        let allow_weak = reader_allows_weak(reader);
        while has_next(reader)? {
            let (entry, name) = reader.peek_entry()?;
            if entry != EntryType::StartOfNode {
                reader.context().debug().log_warning(format_args!(
                    "expected an entry node of `{}` but found {name:?} of type {entry:?}, \
                     skipping it",
                    self.ty,
                ));
                skip_entry(reader)?;
                continue;
            }
            if reader.enter_node()?.is_none() {
                continue;
            }
            let pair = self.read_pair(reader, allow_weak)?;
            reader.exit_node()?;

            match pair {
                (Some(key), Some(item)) => {
                    if !self.info.insert(value, key, item) {
                        reader.context().debug().log_error(format_args!(
                            "map `{}` rejected a read entry",
                            self.ty,
                        ));
                    }
                }
                _ => reader.context().debug().log_warning(format_args!(
                    "entry of `{}` without both key and value, the entry is lost",
                    self.ty,
                )),
            }
        }
        reader.exit_array()?;
        Ok(())
    }
}

fn create(ty: &'static TypeInfo) -> Option<Arc<dyn Formatter>> {
    Some(Arc::new(DictionaryFormatter::new(ty)))
}

fn is_map(ty: &'static TypeInfo) -> bool {
    matches!(ty.kind(), TypeKind::Map(_))
}

pub(crate) static HASH_MAP_FORMATTER: FormatterRegistration = FormatterRegistration {
    name: "vc_serial::DictionaryFormatter",
    priority: 0,
    target: FormatterTarget::GenericDefinition(HASH_MAP_DEFINITION),
    create,
    weak_fallback: None,
    can_format: Some(is_map),
};

pub(crate) static BTREE_MAP_FORMATTER: FormatterRegistration = FormatterRegistration {
    name: "vc_serial::DictionaryFormatter",
    priority: 0,
    target: FormatterTarget::GenericDefinition(BTREE_MAP_DEFINITION),
    create,
    weak_fallback: None,
    can_format: Some(is_map),
};
