use alloc::boxed::Box;
use alloc::string::String;
use core::marker::PhantomData;

use crate::error::SerialResult;
use crate::info::{PrimitiveKind, TypeInfo, Typed};
use crate::serializer::{ErasedSerializer, Serializer, write_weak};
use crate::stream::{DataReader, DataWriter, EntryType};
use crate::value::{Guid, PrimitiveValue};
use crate::{Reflect, Serial};

// -----------------------------------------------------------------------------
// PrimitiveType

/// A primitive written as exactly one entry.
///
/// Implemented for `bool`, `char`, every integer and float width, `String`
/// and [`Guid`].
pub trait PrimitiveType: Serial {
    const KIND: PrimitiveKind;

    /// Reads the entry, `Ok(None)` if it does not hold a `Self`.
    fn read_entry(reader: &mut dyn DataReader) -> SerialResult<Option<Self>>;

    fn write_entry(&self, name: Option<&str>, writer: &mut dyn DataWriter) -> SerialResult<()>;
}

macro_rules! impl_primitive_type {
    ($( $ty:ty => $kind:ident, $read:ident, $write:ident; )*) => {
        $(
            impl PrimitiveType for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$kind;

                #[inline]
                fn read_entry(reader: &mut dyn DataReader) -> SerialResult<Option<Self>> {
                    reader.$read()
                }

                #[inline]
                fn write_entry(&self, name: Option<&str>, writer: &mut dyn DataWriter) -> SerialResult<()> {
                    writer.$write(name, *self)
                }
            }
        )*
    };
}

impl_primitive_type! {
    bool => Bool, read_bool, write_bool;
    char => Char, read_char, write_char;
    i8 => I8, read_i8, write_i8;
    i16 => I16, read_i16, write_i16;
    i32 => I32, read_i32, write_i32;
    i64 => I64, read_i64, write_i64;
    isize => Isize, read_isize, write_isize;
    u8 => U8, read_u8, write_u8;
    u16 => U16, read_u16, write_u16;
    u32 => U32, read_u32, write_u32;
    u64 => U64, read_u64, write_u64;
    usize => Usize, read_usize, write_usize;
    f32 => F32, read_f32, write_f32;
    f64 => F64, read_f64, write_f64;
    Guid => Guid, read_guid, write_guid;
}

impl PrimitiveType for String {
    const KIND: PrimitiveKind = PrimitiveKind::String;

    #[inline]
    fn read_entry(reader: &mut dyn DataReader) -> SerialResult<Option<Self>> {
        reader.read_string()
    }

    #[inline]
    fn write_entry(&self, name: Option<&str>, writer: &mut dyn DataWriter) -> SerialResult<()> {
        writer.write_string(name, self)
    }
}

// -----------------------------------------------------------------------------
// PrimitiveSerializer

/// Reads and writes a primitive as a single entry.
pub struct PrimitiveSerializer<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T: PrimitiveType> PrimitiveSerializer<T> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T: PrimitiveType> Default for PrimitiveSerializer<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PrimitiveType> ErasedSerializer for PrimitiveSerializer<T> {
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

impl<T: PrimitiveType> Serializer<T> for PrimitiveSerializer<T> {
    #[inline]
    fn write_value(&self, name: Option<&str>, value: &T, writer: &mut dyn DataWriter) -> SerialResult<()> {
        value.write_entry(name, writer)
    }

    fn read_value(&self, reader: &mut dyn DataReader) -> SerialResult<T> {
        let (entry, name) = reader.peek_entry()?;
        match T::read_entry(reader)? {
            Some(value) => Ok(value),
            None => {
                log_lost_entry(reader, T::type_info(), entry, name.as_deref());
                Ok(T::default())
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// Reads a primitive of `kind`, substituting its default on a mismatch.
pub(crate) fn read_primitive_weak(
    kind: PrimitiveKind,
    reader: &mut dyn DataReader,
) -> SerialResult<PrimitiveValue> {
    let (entry, name) = reader.peek_entry()?;
    match PrimitiveValue::read(kind, reader)? {
        Some(value) => Ok(value),
        None => {
            log_lost_entry(reader, kind.type_info(), entry, name.as_deref());
            Ok(PrimitiveValue::default_of(kind))
        }
    }
}

/// Reports an entry that could not be read as `expected`.
pub(crate) fn log_lost_entry(
    reader: &dyn DataReader,
    expected: &TypeInfo,
    entry: EntryType,
    name: Option<&str>,
) {
    reader.context().debug().log_warning(format_args!(
        "failed to read entry {:?} of type {entry:?} as `{expected}`, the value is lost",
        name.unwrap_or("<unnamed>"),
    ));
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::PrimitiveSerializer;
    use crate::context::{DeserializationContext, SerializationContext};
    use crate::serializer::Serializer;
    use crate::stream::{DataWriter, Token, TokenReader, TokenWriter};
    use alloc::vec::Vec;

    #[test]
    fn reads_neighbouring_numeric_entries() {
        let mut writer = TokenWriter::new(SerializationContext::default());
        writer.write_f64(Some("a"), 3.0).unwrap();
        writer.write_i64(Some("b"), 300).unwrap();
        let tokens: Vec<Token> = writer.into_tokens();

        let mut reader = TokenReader::new(&tokens, DeserializationContext::default());
        assert_eq!(PrimitiveSerializer::<i32>::new().read_value(&mut reader).unwrap(), 3);
        // Overflow falls back to the default and consumes the entry.
        assert_eq!(PrimitiveSerializer::<u8>::new().read_value(&mut reader).unwrap(), 0);
        assert!(reader.is_exhausted());
    }
}
