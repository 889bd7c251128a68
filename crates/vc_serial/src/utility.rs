//! Top-level entry points.
//!
//! Every top-level write checks that the writer's node stack is empty
//! afterwards and fails with [`ProtocolError::Unbalanced`] otherwise.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::context::{DeserializationContext, SerializationContext};
use crate::error::{ProtocolError, SerialResult};
use crate::info::TypeInfo;
use crate::serializer;
use crate::stream::{BinaryDataReader, BinaryDataWriter, DataReader, DataWriter, Token};
use crate::stream::{TokenReader, TokenWriter};
use crate::{Reflect, Serial};

fn check_balanced(writer: &dyn DataWriter) -> SerialResult<()> {
    match writer.nodes().depth() {
        0 => Ok(()),
        depth => Err(ProtocolError::Unbalanced(depth).into()),
    }
}

/// Writes `value` as one unnamed entry or node through its compiled serializer.
pub fn serialize_value<T: Serial>(value: &T, writer: &mut dyn DataWriter) -> SerialResult<()> {
    serializer::get::<T>().write_value(None, value, writer)?;
    check_balanced(writer)
}

/// Reads one value of type `T`.
pub fn deserialize_value<T: Serial>(reader: &mut dyn DataReader) -> SerialResult<T> {
    serializer::get::<T>().read_value(reader)
}

/// Writes a value known only by its runtime type.
///
/// Without a compiled serializer the reflection driven fallback is used if
/// the writer's configuration allows weak fallbacks.
pub fn serialize_value_weak(value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
    let allow_weak = writer.context().config().allow_weak_fallback();
    serializer::for_type(value.reflect_type_info(), allow_weak)?.write_value_weak(None, value, writer)?;
    check_balanced(writer)
}

/// Reads one value of the runtime type `ty`.
pub fn deserialize_value_weak(
    ty: &'static TypeInfo,
    reader: &mut dyn DataReader,
) -> SerialResult<Box<dyn Reflect>> {
    let allow_weak = reader.context().config().allow_weak_fallback();
    serializer::for_type(ty, allow_weak)?.read_value_weak(reader)
}

/// Writes `value` into a token stream.
///
/// # Example
///
/// ```
/// use vc_serial::context::{DeserializationContext, SerializationContext};
/// use vc_serial::utility::{from_tokens, to_tokens};
///
/// let tokens = to_tokens(&vec![1_u8, 2, 3], SerializationContext::default()).unwrap();
/// let value: Vec<u8> = from_tokens(&tokens, DeserializationContext::default()).unwrap();
/// assert_eq!(value, [1, 2, 3]);
/// ```
pub fn to_tokens<T: Serial>(value: &T, context: SerializationContext) -> SerialResult<Vec<Token>> {
    let mut writer = TokenWriter::new(context);
    serialize_value(value, &mut writer)?;
    Ok(writer.into_tokens())
}

/// Reads a value of type `T` from a token stream.
pub fn from_tokens<T: Serial>(tokens: &[Token], context: DeserializationContext) -> SerialResult<T> {
    let mut reader = TokenReader::new(tokens, context);
    deserialize_value(&mut reader)
}

/// Writes `value` with the binary encoding.
pub fn to_bytes<T: Serial>(value: &T, context: SerializationContext) -> SerialResult<Vec<u8>> {
    let mut writer = BinaryDataWriter::new(Vec::new(), context);
    serialize_value(value, &mut writer)?;
    writer.finish()
}

/// Reads a value of type `T` from the binary encoding.
pub fn from_bytes<T: Serial>(bytes: &[u8], context: DeserializationContext) -> SerialResult<T> {
    let mut reader = BinaryDataReader::new(bytes, context);
    deserialize_value(&mut reader)
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::time::Duration;

    use super::*;
    use crate::info::Typed;

    #[test]
    fn containers_round_trip_through_both_encodings() {
        let mut value = BTreeMap::new();
        value.insert(String::from("a"), vec![Some(1_i32), None]);
        value.insert(String::from("b"), Vec::new());

        let tokens = to_tokens(&value, SerializationContext::default()).unwrap();
        let read: BTreeMap<String, Vec<Option<i32>>> =
            from_tokens(&tokens, DeserializationContext::default()).unwrap();
        assert_eq!(read, value);

        let bytes = to_bytes(&value, SerializationContext::default()).unwrap();
        let read: BTreeMap<String, Vec<Option<i32>>> =
            from_bytes(&bytes, DeserializationContext::default()).unwrap();
        assert_eq!(read, value);
    }

    #[test]
    fn weak_entry_points_use_the_runtime_type() {
        let value = Duration::new(3, 500);
        let mut writer = TokenWriter::new(SerializationContext::default());
        serialize_value_weak(&value, &mut writer).unwrap();
        let tokens = writer.into_tokens();

        let mut reader = TokenReader::new(&tokens, DeserializationContext::default());
        let read = deserialize_value_weak(Duration::type_info(), &mut reader).unwrap();
        assert_eq!(read.take::<Duration>().ok(), Some(value));
        assert!(reader.is_exhausted());
    }

    #[test]
    fn unbalanced_writes_are_rejected() {
        let mut writer = TokenWriter::new(SerializationContext::default());
        writer.begin_struct_node(Some("open"), None).unwrap();
        let error = serialize_value(&1_u8, &mut writer).unwrap_err();
        assert!(matches!(
            error,
            crate::SerialError::Protocol(ProtocolError::Unbalanced(1))
        ));
    }
}
