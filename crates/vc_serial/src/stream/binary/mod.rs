//! A compact little-endian byte encoding.
//!
//! Every entry starts with a tag byte. The high bit of the tag marks a
//! named entry, whose name follows as a length-prefixed UTF-8 string.
//! Type names are written once per session and referred to by a small id
//! afterwards.

mod reader;
mod writer;

pub use reader::BinaryDataReader;
pub use writer::BinaryDataWriter;

use crate::error::ProtocolError;
use crate::stream::EntryType;

/// Marks an entry that is followed by its name.
const NAMED: u8 = 0x80;

/// The node carries no type.
const TYPE_ABSENT: u8 = 0;
/// A type seen for the first time: id, then name.
const TYPE_NEW: u8 = 1;
/// A type seen before: id only.
const TYPE_KNOWN: u8 = 2;

macro_rules! define_tags {
    ($( $tag:ident = $value:literal => $entry:ident, )*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        enum Tag {
            $( $tag = $value, )*
        }

        impl Tag {
            fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
                match byte & !NAMED {
                    $( $value => Ok(Self::$tag), )*
                    _ => Err(ProtocolError::InvalidTag(byte)),
                }
            }

            fn entry_type(self) -> EntryType {
                match self {
                    $( Self::$tag => EntryType::$entry, )*
                }
            }
        }
    };
}

define_tags! {
    StartOfReferenceNode = 0x01 => StartOfNode,
    StartOfStructNode = 0x02 => StartOfNode,
    EndOfNode = 0x03 => EndOfNode,
    StartOfArray = 0x04 => StartOfArray,
    EndOfArray = 0x05 => EndOfArray,
    PrimitiveArray = 0x06 => PrimitiveArray,
    Null = 0x07 => Null,
    Boolean = 0x08 => Boolean,
    Int8 = 0x09 => Integer,
    Int16 = 0x0A => Integer,
    Int32 = 0x0B => Integer,
    Int64 = 0x0C => Integer,
    UInt8 = 0x0D => Integer,
    UInt16 = 0x0E => Integer,
    UInt32 = 0x0F => Integer,
    UInt64 = 0x10 => Integer,
    Float32 = 0x11 => FloatingPoint,
    Float64 = 0x12 => FloatingPoint,
    Char = 0x13 => String,
    String = 0x14 => String,
    Guid = 0x15 => Guid,
    InternalReference = 0x16 => InternalReference,
    ExternalReferenceByIndex = 0x17 => ExternalReferenceByIndex,
    ExternalReferenceByGuid = 0x18 => ExternalReferenceByGuid,
    ExternalReferenceByString = 0x19 => ExternalReferenceByString,
    EndOfStream = 0x1A => EndOfStream,
}

/// Element codes of primitive arrays, in [`PrimitiveArray`](crate::stream::PrimitiveArray) order.
mod element {
    pub const BOOL: u8 = 0;
    pub const CHAR: u8 = 1;
    pub const I8: u8 = 2;
    pub const I16: u8 = 3;
    pub const I32: u8 = 4;
    pub const I64: u8 = 5;
    pub const U8: u8 = 6;
    pub const U16: u8 = 7;
    pub const U32: u8 = 8;
    pub const U64: u8 = 9;
    pub const F32: u8 = 10;
    pub const F64: u8 = 11;
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{BinaryDataReader, BinaryDataWriter};
    use crate::context::{DeserializationContext, SerializationContext};
    use crate::error::{ProtocolError, SerialError};
    use crate::stream::{DataReader, DataWriter, DeclaredType, EntryType, PrimitiveArray};
    use crate::value::Guid;

    fn write(f: impl FnOnce(&mut BinaryDataWriter<Vec<u8>>)) -> Vec<u8> {
        let mut writer = BinaryDataWriter::new(Vec::new(), SerializationContext::default());
        f(&mut writer);
        writer.finish().unwrap()
    }

    fn reader(bytes: &[u8]) -> BinaryDataReader<&[u8]> {
        BinaryDataReader::new(bytes, DeserializationContext::default())
    }

    #[test]
    fn entries_read_back() {
        let guid = Guid::from_u128(0x1234);
        let bytes = write(|w| {
            w.begin_reference_node(Some("root"), Some(<u32 as crate::info::Typed>::type_info()), 0)
                .unwrap();
            w.write_i32(Some("a"), -5).unwrap();
            w.write_string(Some("b"), "text").unwrap();
            w.write_char(None, 'x').unwrap();
            w.write_guid(None, guid).unwrap();
            w.write_f32(None, 0.5).unwrap();
            w.write_null(Some("n")).unwrap();
            w.end_node(Some("root")).unwrap();
        });

        let mut r = reader(&bytes);
        let node = r.enter_node().unwrap().unwrap();
        assert_eq!(node.name.as_deref(), Some("root"));
        assert_eq!(node.id, 0);
        assert!(matches!(node.declared, DeclaredType::Resolved(info) if info.is::<u32>()));

        assert_eq!(r.peek_entry().unwrap(), (EntryType::Integer, Some(String::from("a"))));
        assert_eq!(r.read_i32().unwrap(), Some(-5));
        assert_eq!(r.read_string().unwrap().as_deref(), Some("text"));
        assert_eq!(r.read_char().unwrap(), Some('x'));
        assert_eq!(r.read_guid().unwrap(), Some(guid));
        assert_eq!(r.read_f64().unwrap(), Some(0.5));
        assert!(r.read_null().unwrap());
        assert!(r.exit_node().unwrap());
        assert_eq!(r.peek_entry().unwrap().0, EntryType::EndOfStream);
    }

    #[test]
    fn type_names_are_written_once() {
        let info = <String as crate::info::Typed>::type_info();
        let bytes = write(|w| {
            for _ in 0..3 {
                w.begin_struct_node(None, Some(info)).unwrap();
                w.end_node(None).unwrap();
            }
        });
        let path = info.type_path().as_bytes();
        let occurrences = bytes.windows(path.len()).filter(|w| *w == path).count();
        assert_eq!(occurrences, 1);

        let mut r = reader(&bytes);
        for _ in 0..3 {
            let node = r.enter_node().unwrap().unwrap();
            assert_eq!(node.declared, DeclaredType::Resolved(info));
            assert!(r.exit_node().unwrap());
        }
    }

    #[test]
    fn primitive_arrays_read_back() {
        let arrays = vec![
            PrimitiveArray::Bool(vec![true, false]),
            PrimitiveArray::Char(vec!['a', 'ß']),
            PrimitiveArray::I16(vec![-1, 2]),
            PrimitiveArray::F64(vec![1.25]),
            PrimitiveArray::U64(vec![]),
        ];
        let bytes = write(|w| {
            for array in &arrays {
                w.write_primitive_array(None, array).unwrap();
            }
        });
        let mut r = reader(&bytes);
        for array in arrays {
            assert_eq!(r.read_primitive_array().unwrap(), Some(array));
        }
    }

    #[test]
    fn skipping_keeps_array_balance() {
        let bytes = write(|w| {
            w.begin_array_node(2).unwrap();
            w.write_u8(None, 1).unwrap();
            w.begin_struct_node(None, None).unwrap();
            w.write_bool(Some("flag"), true).unwrap();
            w.end_node(None).unwrap();
            w.end_array_node().unwrap();
            w.write_u16(Some("after"), 9).unwrap();
        });
        let mut r = reader(&bytes);
        r.skip_entry().unwrap();
        assert_eq!(r.nodes().depth(), 0);
        assert_eq!(r.read_u16().unwrap(), Some(9));
    }

    #[test]
    fn invalid_tag_is_a_protocol_error() {
        let mut r = reader(&[0x7F]);
        assert!(matches!(
            r.peek_entry(),
            Err(SerialError::Protocol(ProtocolError::InvalidTag(0x7F)))
        ));
    }
}
