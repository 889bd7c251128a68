use alloc::vec::Vec;
use std::io::Write;

use vc_utils::TypeIdMap;

use super::{NAMED, TYPE_ABSENT, TYPE_KNOWN, TYPE_NEW, Tag, element};
use crate::context::SerializationContext;
use crate::error::{ProtocolError, SerialResult};
use crate::info::TypeInfo;
use crate::stream::{DataWriter, DeclaredType, NodeStack, PrimitiveArray};
use crate::value::Guid;

// -----------------------------------------------------------------------------
// BinaryDataWriter

/// Writes entries in the binary encoding to an [`io::Write`](std::io::Write) sink.
///
/// Call [`finish`](Self::finish) to terminate the stream.
#[derive(Debug)]
pub struct BinaryDataWriter<W: Write> {
    sink: W,
    nodes: NodeStack,
    context: SerializationContext,
    type_ids: TypeIdMap<i32>,
    buffer: Vec<u8>,
}

impl<W: Write> BinaryDataWriter<W> {
    pub fn new(sink: W, context: SerializationContext) -> Self {
        Self {
            sink,
            nodes: NodeStack::new(),
            context,
            type_ids: TypeIdMap::new(),
            buffer: Vec::new(),
        }
    }

    /// Writes the end of stream marker, flushes and returns the sink.
    pub fn finish(mut self) -> SerialResult<W> {
        self.sink.write_all(&[Tag::EndOfStream as u8])?;
        self.sink.flush()?;
        Ok(self.sink)
    }

    /// Returns the sink without terminating the stream.
    #[inline]
    pub fn into_inner(self) -> W {
        self.sink
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    // The entry is assembled in `buffer` and written with one call.
    fn flush_entry(&mut self) -> SerialResult<()> {
        self.sink.write_all(&self.buffer)?;
        self.buffer.clear();
        Ok(())
    }

    fn put_tag(&mut self, tag: Tag, name: Option<&str>) -> SerialResult<()> {
        match name {
            Some(name) => {
                self.buffer.push(tag as u8 | NAMED);
                self.put_str(name)
            }
            None => {
                self.buffer.push(tag as u8);
                Ok(())
            }
        }
    }

    fn put_str(&mut self, value: &str) -> SerialResult<()> {
        let len = u32::try_from(value.len())
            .map_err(|_| ProtocolError::Malformed(alloc::format!("string of {} bytes is too long", value.len())))?;
        self.buffer.extend_from_slice(&len.to_le_bytes());
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn put_type(&mut self, ty: Option<&'static TypeInfo>) -> SerialResult<()> {
        let Some(ty) = ty else {
            self.buffer.push(TYPE_ABSENT);
            return Ok(());
        };
        if let Some(&id) = self.type_ids.get(&ty.type_id()) {
            self.buffer.push(TYPE_KNOWN);
            self.buffer.extend_from_slice(&id.to_le_bytes());
            return Ok(());
        }
        let id = self.type_ids.len() as i32;
        self.type_ids.insert(ty.type_id(), id);
        let name = self.context.binder().bind_to_name(ty, self.context.debug());
        self.buffer.push(TYPE_NEW);
        self.buffer.extend_from_slice(&id.to_le_bytes());
        self.put_str(&name)
    }

    fn scalar(&mut self, tag: Tag, name: Option<&str>, bytes: &[u8]) -> SerialResult<()> {
        self.put_tag(tag, name)?;
        self.buffer.extend_from_slice(bytes);
        self.flush_entry()
    }
}

fn encode_array(array: &PrimitiveArray, out: &mut Vec<u8>) {
    macro_rules! encode {
        ($code:expr, $items:ident, $to_bytes:expr) => {{
            out.push($code);
            out.extend_from_slice(&($items.len() as u64).to_le_bytes());
            for item in $items {
                out.extend_from_slice(&$to_bytes(*item));
            }
        }};
    }
    match array {
        PrimitiveArray::Bool(items) => encode!(element::BOOL, items, |v: bool| [v as u8]),
        PrimitiveArray::Char(items) => encode!(element::CHAR, items, |v: char| (v as u32).to_le_bytes()),
        PrimitiveArray::I8(items) => encode!(element::I8, items, i8::to_le_bytes),
        PrimitiveArray::I16(items) => encode!(element::I16, items, i16::to_le_bytes),
        PrimitiveArray::I32(items) => encode!(element::I32, items, i32::to_le_bytes),
        PrimitiveArray::I64(items) => encode!(element::I64, items, i64::to_le_bytes),
        PrimitiveArray::U8(items) => encode!(element::U8, items, u8::to_le_bytes),
        PrimitiveArray::U16(items) => encode!(element::U16, items, u16::to_le_bytes),
        PrimitiveArray::U32(items) => encode!(element::U32, items, u32::to_le_bytes),
        PrimitiveArray::U64(items) => encode!(element::U64, items, u64::to_le_bytes),
        PrimitiveArray::F32(items) => encode!(element::F32, items, f32::to_le_bytes),
        PrimitiveArray::F64(items) => encode!(element::F64, items, f64::to_le_bytes),
    }
}

impl<W: Write> DataWriter for BinaryDataWriter<W> {
    #[inline]
    fn context(&self) -> &SerializationContext {
        &self.context
    }

    #[inline]
    fn context_mut(&mut self) -> &mut SerializationContext {
        &mut self.context
    }

    #[inline]
    fn nodes(&self) -> &NodeStack {
        &self.nodes
    }

    fn begin_reference_node(
        &mut self,
        name: Option<&str>,
        ty: Option<&'static TypeInfo>,
        id: i32,
    ) -> SerialResult<()> {
        self.put_tag(Tag::StartOfReferenceNode, name)?;
        self.put_type(ty)?;
        self.buffer.extend_from_slice(&id.to_le_bytes());
        self.flush_entry()?;
        self.nodes.push_node(name, id, DeclaredType::from_info(ty));
        Ok(())
    }

    fn begin_struct_node(&mut self, name: Option<&str>, ty: Option<&'static TypeInfo>) -> SerialResult<()> {
        self.put_tag(Tag::StartOfStructNode, name)?;
        self.put_type(ty)?;
        self.flush_entry()?;
        self.nodes.push_node(name, -1, DeclaredType::from_info(ty));
        Ok(())
    }

    fn end_node(&mut self, name: Option<&str>) -> SerialResult<()> {
        self.nodes.pop_node(name)?;
        self.scalar(Tag::EndOfNode, None, &[])
    }

    fn begin_array_node(&mut self, length: u64) -> SerialResult<()> {
        self.scalar(Tag::StartOfArray, None, &length.to_le_bytes())?;
        self.nodes.push_array();
        Ok(())
    }

    fn end_array_node(&mut self) -> SerialResult<()> {
        self.nodes.pop_array()?;
        self.scalar(Tag::EndOfArray, None, &[])
    }

    fn write_primitive_array(&mut self, name: Option<&str>, array: &PrimitiveArray) -> SerialResult<()> {
        self.put_tag(Tag::PrimitiveArray, name)?;
        encode_array(array, &mut self.buffer);
        self.flush_entry()
    }

    fn write_null(&mut self, name: Option<&str>) -> SerialResult<()> {
        self.scalar(Tag::Null, name, &[])
    }

    fn write_internal_reference(&mut self, name: Option<&str>, id: i32) -> SerialResult<()> {
        self.scalar(Tag::InternalReference, name, &id.to_le_bytes())
    }

    fn write_external_reference_by_index(&mut self, name: Option<&str>, index: i32) -> SerialResult<()> {
        self.scalar(Tag::ExternalReferenceByIndex, name, &index.to_le_bytes())
    }

    fn write_external_reference_by_guid(&mut self, name: Option<&str>, guid: Guid) -> SerialResult<()> {
        self.scalar(Tag::ExternalReferenceByGuid, name, guid.as_bytes())
    }

    fn write_external_reference_by_string(&mut self, name: Option<&str>, key: &str) -> SerialResult<()> {
        self.put_tag(Tag::ExternalReferenceByString, name)?;
        self.put_str(key)?;
        self.flush_entry()
    }

    fn write_bool(&mut self, name: Option<&str>, value: bool) -> SerialResult<()> {
        self.scalar(Tag::Boolean, name, &[value as u8])
    }

    fn write_char(&mut self, name: Option<&str>, value: char) -> SerialResult<()> {
        self.scalar(Tag::Char, name, &(value as u32).to_le_bytes())
    }

    fn write_i8(&mut self, name: Option<&str>, value: i8) -> SerialResult<()> {
        self.scalar(Tag::Int8, name, &value.to_le_bytes())
    }

    fn write_i16(&mut self, name: Option<&str>, value: i16) -> SerialResult<()> {
        self.scalar(Tag::Int16, name, &value.to_le_bytes())
    }

    fn write_i32(&mut self, name: Option<&str>, value: i32) -> SerialResult<()> {
        self.scalar(Tag::Int32, name, &value.to_le_bytes())
    }

    fn write_i64(&mut self, name: Option<&str>, value: i64) -> SerialResult<()> {
        self.scalar(Tag::Int64, name, &value.to_le_bytes())
    }

    fn write_u8(&mut self, name: Option<&str>, value: u8) -> SerialResult<()> {
        self.scalar(Tag::UInt8, name, &value.to_le_bytes())
    }

    fn write_u16(&mut self, name: Option<&str>, value: u16) -> SerialResult<()> {
        self.scalar(Tag::UInt16, name, &value.to_le_bytes())
    }

    fn write_u32(&mut self, name: Option<&str>, value: u32) -> SerialResult<()> {
        self.scalar(Tag::UInt32, name, &value.to_le_bytes())
    }

    fn write_u64(&mut self, name: Option<&str>, value: u64) -> SerialResult<()> {
        self.scalar(Tag::UInt64, name, &value.to_le_bytes())
    }

    fn write_f32(&mut self, name: Option<&str>, value: f32) -> SerialResult<()> {
        self.scalar(Tag::Float32, name, &value.to_le_bytes())
    }

    fn write_f64(&mut self, name: Option<&str>, value: f64) -> SerialResult<()> {
        self.scalar(Tag::Float64, name, &value.to_le_bytes())
    }

    fn write_string(&mut self, name: Option<&str>, value: &str) -> SerialResult<()> {
        self.put_tag(Tag::String, name)?;
        self.put_str(value)?;
        self.flush_entry()
    }

    fn write_guid(&mut self, name: Option<&str>, value: Guid) -> SerialResult<()> {
        self.scalar(Tag::Guid, name, value.as_bytes())
    }

    fn prepare_new_session(&mut self) {
        self.nodes.clear();
        self.context.prepare_new_session();
        self.type_ids.clear();
        self.buffer.clear();
    }
}
