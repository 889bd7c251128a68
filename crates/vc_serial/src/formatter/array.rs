use alloc::boxed::Box;
use alloc::vec::Vec;
use core::marker::PhantomData;

use vc_os::sync::Arc;

use crate::context::SerializationPolicy;
use crate::error::{AbortError, SerialResult};
use crate::formatter::{Formatter, FormatterLocator, LocatorRegistration, LocatorStep};
use crate::formatter::{reader_allows_weak, writer_allows_weak};
use crate::info::{ListInfo, TypeInfo, TypeKind, Typed};
use crate::serializer::{self, Serializer};
use crate::stream::{DataReader, DataWriter, EntryType, PrimitiveArray, skip_entry};
use crate::{Reflect, Serial};

/// Upper bound of the capacity reserved from a length read from a stream.
const MAX_PREALLOCATION: usize = 4096;

// -----------------------------------------------------------------------------
// Helpers

/// Enters the array of the current node, `None` after a logged mismatch.
pub(crate) fn enter_array(reader: &mut dyn DataReader, ty: &TypeInfo) -> SerialResult<Option<usize>> {
    let (entry, name) = reader.peek_entry()?;
    if entry != EntryType::StartOfArray {
        reader.context().debug().log_warning(format_args!(
            "expected an array for `{ty}` but found entry {name:?} of type {entry:?}",
        ));
        skip_entry(reader)?;
        return Ok(None);
    }
    Ok(reader
        .enter_array()?
        .map(|length| usize::try_from(length).unwrap_or(usize::MAX).min(MAX_PREALLOCATION)))
}

/// Returns `true` while the current array has elements left.
#[inline]
pub(crate) fn has_next(reader: &mut dyn DataReader) -> SerialResult<bool> {
    Ok(!reader.peek_entry()?.0.is_end())
}

fn log_wrong_type(ty: &TypeInfo, value: &dyn Reflect, debug: &crate::context::DebugContext) {
    debug.log_error(format_args!(
        "formatter of `{ty}` was given a value of type `{}`",
        value.reflect_type_info(),
    ));
}

// -----------------------------------------------------------------------------
// ArrayFormatter

/// Formats `Vec<T>` as an array of `T` entries or nodes.
pub struct ArrayFormatter<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T: Serial> ArrayFormatter<T> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T: Serial> Default for ArrayFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serial> Formatter for ArrayFormatter<T>
where
    Vec<T>: Typed,
{
    fn serialized_type(&self) -> &'static TypeInfo {
        <Vec<T>>::type_info()
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        let Some(items) = value.downcast_ref::<Vec<T>>() else {
            log_wrong_type(self.serialized_type(), value, writer.context().debug());
            return Ok(());
        };
        let serializer = serializer::get::<T>();
        writer.begin_array_node(items.len() as u64)?;
        for item in items {
            serializer.write_value(None, item, writer)?;
        }
        writer.end_array_node()
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        let Some(items) = value.downcast_mut::<Vec<T>>() else {
            log_wrong_type(self.serialized_type(), value, reader.context().debug());
            return Ok(());
        };
        let Some(capacity) = enter_array(reader, <Vec<T>>::type_info())? else {
            return Ok(());
        };
        let serializer = serializer::get::<T>();
        items.clear();
        items.reserve(capacity);
        while has_next(reader)? {
            items.push(serializer.read_value(reader)?);
        }
        reader.exit_array()?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// PrimitiveArrayFormatter

/// Formats `Vec<T>` of a primitive element type as one primitive array entry.
///
/// Element-wise arrays are accepted when reading.
pub struct PrimitiveArrayFormatter<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T: Serial> PrimitiveArrayFormatter<T> {
    /// # Panics
    ///
    /// Panics if `T` cannot be stored in a primitive array.
    pub fn new() -> Self {
        assert!(
            T::type_info().primitive_kind().is_some_and(|kind| kind.is_array_element()),
            "`{}` is not a primitive array element type",
            T::type_path(),
        );
        Self {
            marker: PhantomData,
        }
    }
}

impl<T: Serial> Default for PrimitiveArrayFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serial> Formatter for PrimitiveArrayFormatter<T>
where
    Vec<T>: Typed,
{
    fn serialized_type(&self) -> &'static TypeInfo {
        <Vec<T>>::type_info()
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        match PrimitiveArray::from_vec(value) {
            Some(array) => writer.write_primitive_array(None, &array),
            None => {
                log_wrong_type(self.serialized_type(), value, writer.context().debug());
                Ok(())
            }
        }
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        let ty = self.serialized_type();
        let Some(items) = value.downcast_mut::<Vec<T>>() else {
            log_wrong_type(ty, value, reader.context().debug());
            return Ok(());
        };
        let (entry, _) = reader.peek_entry()?;
        if entry != EntryType::PrimitiveArray {
            return ArrayFormatter::<T>::new().deserialize(items, reader);
        }
        let Some(array) = reader.read_primitive_array()? else {
            return Ok(());
        };
        let kind = array.element_kind();
        match array.into_vec::<T>() {
            Some(read) => *items = read,
            None => reader.context().debug().log_warning(format_args!(
                "primitive array of {kind:?} elements cannot be read as `{ty}`, the value is lost",
            )),
        }
        Ok(())
    }
}

/// Returns the compiled formatter of `Vec<T>`.
pub fn array_formatter<T: Serial>() -> Arc<dyn Formatter>
where
    Vec<T>: Typed,
{
    match T::type_info().primitive_kind() {
        Some(kind) if kind.is_array_element() => Arc::new(PrimitiveArrayFormatter::<T>::new()),
        _ => Arc::new(ArrayFormatter::<T>::new()),
    }
}

// -----------------------------------------------------------------------------
// WeakArrayFormatter

/// Formats any list type through its [`ListInfo`], element by element.
///
/// The weak fallback of lists without a compiled formatter.
pub struct WeakArrayFormatter {
    ty: &'static TypeInfo,
    info: &'static ListInfo,
}

impl WeakArrayFormatter {
    /// # Panics
    ///
    /// Panics if `ty` is not a list type.
    pub fn new(ty: &'static TypeInfo) -> Self {
        let TypeKind::List(info) = ty.kind() else {
            panic!("`{ty}` is not a list type");
        };
        Self { ty, info }
    }
}

impl Formatter for WeakArrayFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        let serializer = serializer::for_type(self.info.item(), writer_allows_weak(writer))?;
        let length = self.info.len(value);
        writer.begin_array_node(length as u64)?;
        for item in (0..length).filter_map(|index| self.info.get(value, index)) {
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
            if self.info.push(value, item).is_err() {
                reader.context().debug().log_error(format_args!(
                    "list `{}` rejected an element read as `{}`",
                    self.ty,
                    self.info.item(),
                ));
            }
        }
        reader.exit_array()?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// ArrayFormatterLocator

/// Locates formatters of list types: the compiled formatter of the list if
/// there is one, the [`WeakArrayFormatter`] otherwise.
pub struct ArrayFormatterLocator;

impl FormatterLocator for ArrayFormatterLocator {
    fn try_get_formatter(
        &self,
        ty: &'static TypeInfo,
        step: LocatorStep,
        _policy: &Arc<SerializationPolicy>,
        allow_weak_fallback: bool,
    ) -> SerialResult<Option<Arc<dyn Formatter>>> {
        let TypeKind::List(info) = ty.kind() else {
            return Ok(None);
        };
        if step != LocatorStep::AfterRegisteredFormatters {
            return Ok(None);
        }
        match info.typed_formatter() {
            Some(formatter) => Ok(Some(formatter)),
            None if allow_weak_fallback => Ok(Some(Arc::new(WeakArrayFormatter::new(ty)))),
            None => Err(AbortError::MissingCompiledFormatter {
                type_path: ty.type_path().into(),
                generics: ty.describe_generics(),
            }
            .into()),
        }
    }
}

pub(crate) static ARRAY_LOCATOR: LocatorRegistration = LocatorRegistration {
    name: "vc_serial::ArrayFormatterLocator",
    priority: -80,
    create: || Box::new(ArrayFormatterLocator),
};
