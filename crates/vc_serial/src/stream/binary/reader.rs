use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use std::io::{ErrorKind, Read};

use vc_utils::hash::HashMap;

use super::{NAMED, TYPE_ABSENT, TYPE_KNOWN, TYPE_NEW, Tag, element};
use crate::context::DeserializationContext;
use crate::error::{ProtocolError, SerialResult};
use crate::stream::reader::{float_to_i64, float_to_u64};
use crate::stream::{DataReader, DeclaredType, EntryType, NodeInfo, NodeStack, PrimitiveArray};
use crate::stream::{skip_entry, skip_to_end_of_array, skip_to_end_of_node};
use crate::value::Guid;

// Caps the preallocation for counts read from untrusted input.
const MAX_PREALLOCATION: usize = 4096;

#[derive(Debug, Clone)]
struct Header {
    tag: Tag,
    name: Option<String>,
}

#[derive(Clone, Copy)]
enum Number {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Number {
    fn to_i64(self) -> Option<i64> {
        match self {
            Self::Signed(v) => Some(v),
            Self::Unsigned(v) => i64::try_from(v).ok(),
            Self::Float(v) => float_to_i64(v),
        }
    }

    fn to_u64(self) -> Option<u64> {
        match self {
            Self::Signed(v) => u64::try_from(v).ok(),
            Self::Unsigned(v) => Some(v),
            Self::Float(v) => float_to_u64(v),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Self::Signed(v) => v as f64,
            Self::Unsigned(v) => v as f64,
            Self::Float(v) => v,
        }
    }
}

// -----------------------------------------------------------------------------
// BinaryDataReader

/// Reads entries in the binary encoding from an [`io::Read`](std::io::Read) source.
///
/// The end of the input is reported as [`EntryType::EndOfStream`], with or
/// without an explicit terminator.
#[derive(Debug)]
pub struct BinaryDataReader<R: Read> {
    source: R,
    peeked: Option<Header>,
    nodes: NodeStack,
    context: DeserializationContext,
    types: HashMap<i32, DeclaredType>,
}

impl<R: Read> BinaryDataReader<R> {
    pub fn new(source: R, context: DeserializationContext) -> Self {
        Self {
            source,
            peeked: None,
            nodes: NodeStack::new(),
            context,
            types: HashMap::default(),
        }
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.source
    }

    fn read_bytes<const N: usize>(&mut self) -> SerialResult<[u8; N]> {
        let mut bytes = [0; N];
        self.source.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_str(&mut self) -> SerialResult<String> {
        let len = u32::from_le_bytes(self.read_bytes()?) as usize;
        let mut bytes = Vec::with_capacity(len.min(MAX_PREALLOCATION));
        (&mut self.source).take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(std::io::Error::from(ErrorKind::UnexpectedEof).into());
        }
        String::from_utf8(bytes).map_err(|e| ProtocolError::Malformed(format!("invalid utf-8 string: {e}")).into())
    }

    fn header(&mut self) -> SerialResult<&Header> {
        if self.peeked.is_none() {
            let mut byte = [0_u8];
            let header = match self.source.read_exact(&mut byte) {
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => Header {
                    tag: Tag::EndOfStream,
                    name: None,
                },
                Err(e) => return Err(e.into()),
                Ok(()) => {
                    let tag = Tag::from_byte(byte[0])?;
                    let name = if byte[0] & NAMED != 0 {
                        Some(self.read_str()?)
                    } else {
                        None
                    };
                    Header { tag, name }
                }
            };
            self.peeked = Some(header);
        }
        match &self.peeked {
            Some(header) => Ok(header),
            None => unreachable!("header is peeked above"),
        }
    }

    #[inline]
    fn tag(&mut self) -> SerialResult<Tag> {
        Ok(self.header()?.tag)
    }

    // Drops the peeked header; its payload is read by the caller.
    // The end of stream marker is sticky.
    fn take_header(&mut self) {
        if self.peeked.as_ref().is_some_and(|h| h.tag != Tag::EndOfStream) {
            self.peeked = None;
        }
    }

    fn read_declared_type(&mut self) -> SerialResult<DeclaredType> {
        let [flag] = self.read_bytes()?;
        match flag {
            TYPE_ABSENT => Ok(DeclaredType::Absent),
            TYPE_NEW => {
                let id = i32::from_le_bytes(self.read_bytes()?);
                let name = self.read_str()?;
                let declared = match self.context.binder().bind_to_type(&name, self.context.debug()) {
                    Some(info) => DeclaredType::Resolved(info),
                    None => DeclaredType::Unresolved(name.into_boxed_str()),
                };
                self.types.insert(id, declared.clone());
                Ok(declared)
            }
            TYPE_KNOWN => {
                let id = i32::from_le_bytes(self.read_bytes()?);
                match self.types.get(&id) {
                    Some(declared) => Ok(declared.clone()),
                    None => Err(ProtocolError::Malformed(format!("unknown type id {id}")).into()),
                }
            }
            other => Err(ProtocolError::Malformed(format!("invalid type flag {other}")).into()),
        }
    }

    fn read_array_payload(&mut self) -> SerialResult<PrimitiveArray> {
        macro_rules! decode {
            ($reader:expr, $variant:ident, $count:ident, $from_bytes:expr) => {{
                let mut items = Vec::with_capacity(($count as usize).min(MAX_PREALLOCATION));
                for _ in 0..$count {
                    items.push($from_bytes($reader.read_bytes()?)?);
                }
                PrimitiveArray::$variant(items)
            }};
        }
        fn ok<T>(value: T) -> SerialResult<T> {
            Ok(value)
        }

        let [code] = self.read_bytes()?;
        let count = u64::from_le_bytes(self.read_bytes()?);
        Ok(match code {
            element::BOOL => decode!(self, Bool, count, |[b]: [u8; 1]| ok(b != 0)),
            element::CHAR => decode!(self, Char, count, |bytes| -> SerialResult<char> {
                char::from_u32(u32::from_le_bytes(bytes))
                    .ok_or_else(|| ProtocolError::Malformed(String::from("invalid char in array")).into())
            }),
            element::I8 => decode!(self, I8, count, |b| ok(i8::from_le_bytes(b))),
            element::I16 => decode!(self, I16, count, |b| ok(i16::from_le_bytes(b))),
            element::I32 => decode!(self, I32, count, |b| ok(i32::from_le_bytes(b))),
            element::I64 => decode!(self, I64, count, |b| ok(i64::from_le_bytes(b))),
            element::U8 => decode!(self, U8, count, |b| ok(u8::from_le_bytes(b))),
            element::U16 => decode!(self, U16, count, |b| ok(u16::from_le_bytes(b))),
            element::U32 => decode!(self, U32, count, |b| ok(u32::from_le_bytes(b))),
            element::U64 => decode!(self, U64, count, |b| ok(u64::from_le_bytes(b))),
            element::F32 => decode!(self, F32, count, |b| ok(f32::from_le_bytes(b))),
            element::F64 => decode!(self, F64, count, |b| ok(f64::from_le_bytes(b))),
            other => {
                return Err(ProtocolError::Malformed(format!("invalid array element code {other}")).into());
            }
        })
    }

    // Reads the payload of the peeked entry, which must be a leaf.
    fn skip_payload(&mut self, tag: Tag) -> SerialResult<()> {
        match tag {
            Tag::StartOfReferenceNode => {
                self.read_declared_type()?;
                self.read_bytes::<4>()?;
            }
            Tag::StartOfStructNode => {
                self.read_declared_type()?;
            }
            Tag::StartOfArray | Tag::Int64 | Tag::UInt64 | Tag::Float64 => {
                self.read_bytes::<8>()?;
            }
            Tag::PrimitiveArray => {
                self.read_array_payload()?;
            }
            Tag::Boolean | Tag::Int8 | Tag::UInt8 => {
                self.read_bytes::<1>()?;
            }
            Tag::Int16 | Tag::UInt16 => {
                self.read_bytes::<2>()?;
            }
            Tag::Int32
            | Tag::UInt32
            | Tag::Float32
            | Tag::Char
            | Tag::InternalReference
            | Tag::ExternalReferenceByIndex => {
                self.read_bytes::<4>()?;
            }
            Tag::Guid | Tag::ExternalReferenceByGuid => {
                self.read_bytes::<16>()?;
            }
            Tag::String | Tag::ExternalReferenceByString => {
                self.read_str()?;
            }
            Tag::EndOfNode | Tag::EndOfArray | Tag::Null | Tag::EndOfStream => {}
        }
        Ok(())
    }

    fn read_number(&mut self) -> SerialResult<Option<Number>> {
        let tag = self.tag()?;
        let number = match tag {
            Tag::Int8 | Tag::Int16 | Tag::Int32 | Tag::Int64 => {
                self.take_header();
                Number::Signed(match tag {
                    Tag::Int8 => i8::from_le_bytes(self.read_bytes()?) as i64,
                    Tag::Int16 => i16::from_le_bytes(self.read_bytes()?) as i64,
                    Tag::Int32 => i32::from_le_bytes(self.read_bytes()?) as i64,
                    _ => i64::from_le_bytes(self.read_bytes()?),
                })
            }
            Tag::UInt8 | Tag::UInt16 | Tag::UInt32 | Tag::UInt64 => {
                self.take_header();
                Number::Unsigned(match tag {
                    Tag::UInt8 => u8::from_le_bytes(self.read_bytes()?) as u64,
                    Tag::UInt16 => u16::from_le_bytes(self.read_bytes()?) as u64,
                    Tag::UInt32 => u32::from_le_bytes(self.read_bytes()?) as u64,
                    _ => u64::from_le_bytes(self.read_bytes()?),
                })
            }
            Tag::Float32 => {
                self.take_header();
                Number::Float(f32::from_le_bytes(self.read_bytes()?) as f64)
            }
            Tag::Float64 => {
                self.take_header();
                Number::Float(f64::from_le_bytes(self.read_bytes()?))
            }
            _ => return self.mismatch(),
        };
        Ok(Some(number))
    }

    // A failed read consumes the entry unless it is an end marker.
    fn mismatch<T>(&mut self) -> SerialResult<Option<T>> {
        if !self.tag()?.entry_type().is_end() {
            skip_entry(self)?;
        }
        Ok(None)
    }
}

impl<R: Read> DataReader for BinaryDataReader<R> {
    #[inline]
    fn context(&self) -> &DeserializationContext {
        &self.context
    }

    #[inline]
    fn context_mut(&mut self) -> &mut DeserializationContext {
        &mut self.context
    }

    #[inline]
    fn nodes(&self) -> &NodeStack {
        &self.nodes
    }

    fn peek_entry(&mut self) -> SerialResult<(EntryType, Option<String>)> {
        let header = self.header()?;
        Ok((header.tag.entry_type(), header.name.clone()))
    }

    fn consume_entry(&mut self) -> SerialResult<()> {
        let tag = self.tag()?;
        self.take_header();
        self.skip_payload(tag)
    }

    fn enter_node(&mut self) -> SerialResult<Option<NodeInfo>> {
        let tag = self.tag()?;
        if !matches!(tag, Tag::StartOfReferenceNode | Tag::StartOfStructNode) {
            return self.mismatch();
        }
        let name = self.header()?.name.clone();
        self.take_header();
        let declared = self.read_declared_type()?;
        let id = match tag {
            Tag::StartOfReferenceNode => i32::from_le_bytes(self.read_bytes()?),
            _ => -1,
        };
        self.nodes.push_node(name.as_deref(), id, declared);
        Ok(Some(self.nodes.current().clone()))
    }

    fn exit_node(&mut self) -> SerialResult<bool> {
        skip_to_end_of_node(self)?;
        if self.tag()? != Tag::EndOfNode {
            return Ok(false);
        }
        self.take_header();
        let name = self.nodes.current().name.clone();
        self.nodes.pop_node(name.as_deref())?;
        Ok(true)
    }

    fn enter_array(&mut self) -> SerialResult<Option<u64>> {
        if self.tag()? != Tag::StartOfArray {
            return self.mismatch();
        }
        self.take_header();
        let length = u64::from_le_bytes(self.read_bytes()?);
        self.nodes.push_array();
        Ok(Some(length))
    }

    fn exit_array(&mut self) -> SerialResult<bool> {
        skip_to_end_of_array(self)?;
        if self.tag()? != Tag::EndOfArray {
            return Ok(false);
        }
        self.take_header();
        self.nodes.pop_array()?;
        Ok(true)
    }

    fn read_primitive_array(&mut self) -> SerialResult<Option<PrimitiveArray>> {
        if self.tag()? != Tag::PrimitiveArray {
            return self.mismatch();
        }
        self.take_header();
        self.read_array_payload().map(Some)
    }

    fn read_null(&mut self) -> SerialResult<bool> {
        if self.tag()? == Tag::Null {
            self.take_header();
            return Ok(true);
        }
        self.mismatch::<()>()?;
        Ok(false)
    }

    fn read_internal_reference(&mut self) -> SerialResult<Option<i32>> {
        if self.tag()? != Tag::InternalReference {
            return self.mismatch();
        }
        self.take_header();
        Ok(Some(i32::from_le_bytes(self.read_bytes()?)))
    }

    fn read_external_reference_by_index(&mut self) -> SerialResult<Option<i32>> {
        if self.tag()? != Tag::ExternalReferenceByIndex {
            return self.mismatch();
        }
        self.take_header();
        Ok(Some(i32::from_le_bytes(self.read_bytes()?)))
    }

    fn read_external_reference_by_guid(&mut self) -> SerialResult<Option<Guid>> {
        if self.tag()? != Tag::ExternalReferenceByGuid {
            return self.mismatch();
        }
        self.take_header();
        Ok(Some(Guid::from_bytes(self.read_bytes()?)))
    }

    fn read_external_reference_by_string(&mut self) -> SerialResult<Option<String>> {
        if self.tag()? != Tag::ExternalReferenceByString {
            return self.mismatch();
        }
        self.take_header();
        self.read_str().map(Some)
    }

    fn read_bool(&mut self) -> SerialResult<Option<bool>> {
        if self.tag()? != Tag::Boolean {
            return self.mismatch();
        }
        self.take_header();
        let [byte] = self.read_bytes()?;
        Ok(Some(byte != 0))
    }

    fn read_char(&mut self) -> SerialResult<Option<char>> {
        match self.tag()? {
            Tag::Char => {
                self.take_header();
                Ok(char::from_u32(u32::from_le_bytes(self.read_bytes()?)))
            }
            Tag::String => {
                self.take_header();
                let value = self.read_str()?;
                let mut chars = value.chars();
                Ok(match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                })
            }
            _ => self.mismatch(),
        }
    }

    fn read_i64(&mut self) -> SerialResult<Option<i64>> {
        Ok(self.read_number()?.and_then(Number::to_i64))
    }

    fn read_u64(&mut self) -> SerialResult<Option<u64>> {
        Ok(self.read_number()?.and_then(Number::to_u64))
    }

    fn read_f64(&mut self) -> SerialResult<Option<f64>> {
        Ok(self.read_number()?.map(Number::to_f64))
    }

    fn read_string(&mut self) -> SerialResult<Option<String>> {
        match self.tag()? {
            Tag::String => {
                self.take_header();
                self.read_str().map(Some)
            }
            Tag::Char => {
                self.take_header();
                let c = char::from_u32(u32::from_le_bytes(self.read_bytes()?));
                Ok(c.map(String::from))
            }
            _ => self.mismatch(),
        }
    }

    fn read_guid(&mut self) -> SerialResult<Option<Guid>> {
        if self.tag()? != Tag::Guid {
            return self.mismatch();
        }
        self.take_header();
        Ok(Some(Guid::from_bytes(self.read_bytes()?)))
    }

    #[inline]
    fn skip_entry(&mut self) -> SerialResult<()> {
        skip_entry(self)
    }

    fn prepare_new_session(&mut self) {
        self.nodes.clear();
        self.context.prepare_new_session();
        self.types.clear();
    }
}
