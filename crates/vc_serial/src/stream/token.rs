use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use vc_utils::hash::HashMap;

use crate::context::{DeserializationContext, SerializationContext};
use crate::error::SerialResult;
use crate::info::TypeInfo;
use crate::stream::reader::{float_to_i64, float_to_u64};
use crate::stream::{DataReader, DataWriter, DeclaredType, EntryType, NodeInfo, NodeStack};
use crate::stream::{PrimitiveArray, skip_entry, skip_to_end_of_array, skip_to_end_of_node};
use crate::value::Guid;

// -----------------------------------------------------------------------------
// Token

/// An integer entry, keeping the sign of the written value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegerValue {
    Signed(i64),
    Unsigned(u64),
}

impl IntegerValue {
    pub fn to_i64(self) -> Option<i64> {
        match self {
            Self::Signed(v) => Some(v),
            Self::Unsigned(v) => i64::try_from(v).ok(),
        }
    }

    pub fn to_u64(self) -> Option<u64> {
        match self {
            Self::Signed(v) => u64::try_from(v).ok(),
            Self::Unsigned(v) => Some(v),
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Self::Signed(v) => v as f64,
            Self::Unsigned(v) => v as f64,
        }
    }
}

/// One entry of the token encoding.
///
/// A token stream can itself be persisted with any `serde` format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Token {
    StartOfNode {
        name: Option<String>,
        type_name: Option<String>,
        id: i32,
    },
    EndOfNode,
    StartOfArray {
        length: u64,
    },
    EndOfArray,
    PrimitiveArray {
        name: Option<String>,
        array: PrimitiveArray,
    },
    Null {
        name: Option<String>,
    },
    Boolean {
        name: Option<String>,
        value: bool,
    },
    Integer {
        name: Option<String>,
        value: IntegerValue,
    },
    FloatingPoint {
        name: Option<String>,
        value: f64,
    },
    String {
        name: Option<String>,
        value: String,
    },
    Guid {
        name: Option<String>,
        value: Guid,
    },
    InternalReference {
        name: Option<String>,
        id: i32,
    },
    ExternalReferenceByIndex {
        name: Option<String>,
        index: i32,
    },
    ExternalReferenceByGuid {
        name: Option<String>,
        guid: Guid,
    },
    ExternalReferenceByString {
        name: Option<String>,
        key: String,
    },
}

impl Token {
    pub fn entry_type(&self) -> EntryType {
        match self {
            Self::StartOfNode { .. } => EntryType::StartOfNode,
            Self::EndOfNode => EntryType::EndOfNode,
            Self::StartOfArray { .. } => EntryType::StartOfArray,
            Self::EndOfArray => EntryType::EndOfArray,
            Self::PrimitiveArray { .. } => EntryType::PrimitiveArray,
            Self::Null { .. } => EntryType::Null,
            Self::Boolean { .. } => EntryType::Boolean,
            Self::Integer { .. } => EntryType::Integer,
            Self::FloatingPoint { .. } => EntryType::FloatingPoint,
            Self::String { .. } => EntryType::String,
            Self::Guid { .. } => EntryType::Guid,
            Self::InternalReference { .. } => EntryType::InternalReference,
            Self::ExternalReferenceByIndex { .. } => EntryType::ExternalReferenceByIndex,
            Self::ExternalReferenceByGuid { .. } => EntryType::ExternalReferenceByGuid,
            Self::ExternalReferenceByString { .. } => EntryType::ExternalReferenceByString,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::EndOfNode | Self::StartOfArray { .. } | Self::EndOfArray => None,
            Self::StartOfNode { name, .. }
            | Self::PrimitiveArray { name, .. }
            | Self::Null { name }
            | Self::Boolean { name, .. }
            | Self::Integer { name, .. }
            | Self::FloatingPoint { name, .. }
            | Self::String { name, .. }
            | Self::Guid { name, .. }
            | Self::InternalReference { name, .. }
            | Self::ExternalReferenceByIndex { name, .. }
            | Self::ExternalReferenceByGuid { name, .. }
            | Self::ExternalReferenceByString { name, .. } => name.as_deref(),
        }
    }
}

#[inline]
fn owned(name: Option<&str>) -> Option<String> {
    name.map(String::from)
}

// -----------------------------------------------------------------------------
// TokenWriter

/// Writes entries into an in-memory token list.
#[derive(Debug, Default)]
pub struct TokenWriter {
    tokens: Vec<Token>,
    nodes: NodeStack,
    context: SerializationContext,
}

impl TokenWriter {
    pub fn new(context: SerializationContext) -> Self {
        Self {
            tokens: Vec::new(),
            nodes: NodeStack::new(),
            context,
        }
    }

    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[inline]
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    fn type_name(&self, ty: Option<&'static TypeInfo>) -> Option<String> {
        ty.map(|ty| self.context.binder().bind_to_name(ty, self.context.debug()))
    }

    fn begin_node(&mut self, name: Option<&str>, ty: Option<&'static TypeInfo>, id: i32) {
        let type_name = self.type_name(ty);
        self.tokens.push(Token::StartOfNode {
            name: owned(name),
            type_name,
            id,
        });
        self.nodes.push_node(name, id, DeclaredType::from_info(ty));
    }
}

impl DataWriter for TokenWriter {
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
        self.begin_node(name, ty, id);
        Ok(())
    }

    fn begin_struct_node(&mut self, name: Option<&str>, ty: Option<&'static TypeInfo>) -> SerialResult<()> {
        self.begin_node(name, ty, -1);
        Ok(())
    }

    fn end_node(&mut self, name: Option<&str>) -> SerialResult<()> {
        self.nodes.pop_node(name)?;
        self.tokens.push(Token::EndOfNode);
        Ok(())
    }

    fn begin_array_node(&mut self, length: u64) -> SerialResult<()> {
        self.tokens.push(Token::StartOfArray { length });
        self.nodes.push_array();
        Ok(())
    }

    fn end_array_node(&mut self) -> SerialResult<()> {
        self.nodes.pop_array()?;
        self.tokens.push(Token::EndOfArray);
        Ok(())
    }

    fn write_primitive_array(&mut self, name: Option<&str>, array: &PrimitiveArray) -> SerialResult<()> {
        self.tokens.push(Token::PrimitiveArray {
            name: owned(name),
            array: array.clone(),
        });
        Ok(())
    }

    fn write_null(&mut self, name: Option<&str>) -> SerialResult<()> {
        self.tokens.push(Token::Null { name: owned(name) });
        Ok(())
    }

    fn write_internal_reference(&mut self, name: Option<&str>, id: i32) -> SerialResult<()> {
        self.tokens.push(Token::InternalReference {
            name: owned(name),
            id,
        });
        Ok(())
    }

    fn write_external_reference_by_index(&mut self, name: Option<&str>, index: i32) -> SerialResult<()> {
        self.tokens.push(Token::ExternalReferenceByIndex {
            name: owned(name),
            index,
        });
        Ok(())
    }

    fn write_external_reference_by_guid(&mut self, name: Option<&str>, guid: Guid) -> SerialResult<()> {
        self.tokens.push(Token::ExternalReferenceByGuid {
            name: owned(name),
            guid,
        });
        Ok(())
    }

    fn write_external_reference_by_string(&mut self, name: Option<&str>, key: &str) -> SerialResult<()> {
        self.tokens.push(Token::ExternalReferenceByString {
            name: owned(name),
            key: String::from(key),
        });
        Ok(())
    }

    fn write_bool(&mut self, name: Option<&str>, value: bool) -> SerialResult<()> {
        self.tokens.push(Token::Boolean {
            name: owned(name),
            value,
        });
        Ok(())
    }

    fn write_char(&mut self, name: Option<&str>, value: char) -> SerialResult<()> {
        self.tokens.push(Token::String {
            name: owned(name),
            value: String::from(value),
        });
        Ok(())
    }

    fn write_i8(&mut self, name: Option<&str>, value: i8) -> SerialResult<()> {
        self.write_i64(name, value as i64)
    }

    fn write_i16(&mut self, name: Option<&str>, value: i16) -> SerialResult<()> {
        self.write_i64(name, value as i64)
    }

    fn write_i32(&mut self, name: Option<&str>, value: i32) -> SerialResult<()> {
        self.write_i64(name, value as i64)
    }

    fn write_i64(&mut self, name: Option<&str>, value: i64) -> SerialResult<()> {
        self.tokens.push(Token::Integer {
            name: owned(name),
            value: IntegerValue::Signed(value),
        });
        Ok(())
    }

    fn write_u8(&mut self, name: Option<&str>, value: u8) -> SerialResult<()> {
        self.write_u64(name, value as u64)
    }

    fn write_u16(&mut self, name: Option<&str>, value: u16) -> SerialResult<()> {
        self.write_u64(name, value as u64)
    }

    fn write_u32(&mut self, name: Option<&str>, value: u32) -> SerialResult<()> {
        self.write_u64(name, value as u64)
    }

    fn write_u64(&mut self, name: Option<&str>, value: u64) -> SerialResult<()> {
        self.tokens.push(Token::Integer {
            name: owned(name),
            value: IntegerValue::Unsigned(value),
        });
        Ok(())
    }

    fn write_f32(&mut self, name: Option<&str>, value: f32) -> SerialResult<()> {
        self.write_f64(name, value as f64)
    }

    fn write_f64(&mut self, name: Option<&str>, value: f64) -> SerialResult<()> {
        self.tokens.push(Token::FloatingPoint {
            name: owned(name),
            value,
        });
        Ok(())
    }

    fn write_string(&mut self, name: Option<&str>, value: &str) -> SerialResult<()> {
        self.tokens.push(Token::String {
            name: owned(name),
            value: String::from(value),
        });
        Ok(())
    }

    fn write_guid(&mut self, name: Option<&str>, value: Guid) -> SerialResult<()> {
        self.tokens.push(Token::Guid {
            name: owned(name),
            value,
        });
        Ok(())
    }

    fn prepare_new_session(&mut self) {
        self.nodes.clear();
        self.context.prepare_new_session();
    }
}

// -----------------------------------------------------------------------------
// TokenReader

/// Reads entries from a token list.
#[derive(Debug)]
pub struct TokenReader<'a> {
    tokens: &'a [Token],
    position: usize,
    nodes: NodeStack,
    context: DeserializationContext,
    bound_types: HashMap<String, DeclaredType>,
}

impl<'a> TokenReader<'a> {
    pub fn new(tokens: &'a [Token], context: DeserializationContext) -> Self {
        Self {
            tokens,
            position: 0,
            nodes: NodeStack::new(),
            context,
            bound_types: HashMap::default(),
        }
    }

    /// Returns `true` once every token has been consumed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.tokens.len()
    }

    #[inline]
    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    #[inline]
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    // Each name is bound once per session, so an unknown name warns once.
    fn bind_type(&mut self, type_name: Option<&str>) -> DeclaredType {
        let Some(type_name) = type_name else {
            return DeclaredType::Absent;
        };
        if let Some(declared) = self.bound_types.get(type_name) {
            return declared.clone();
        }
        let declared = match self.context.binder().bind_to_type(type_name, self.context.debug()) {
            Some(info) => DeclaredType::Resolved(info),
            None => DeclaredType::Unresolved(type_name.into()),
        };
        self.bound_types.insert(String::from(type_name), declared.clone());
        declared
    }

    // A failed read consumes the entry unless it is an end marker.
    fn mismatch<T>(&mut self) -> SerialResult<Option<T>> {
        if !self.peek_entry()?.0.is_end() {
            skip_entry(self)?;
        }
        Ok(None)
    }
}

impl DataReader for TokenReader<'_> {
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
        Ok(match self.current() {
            Some(token) => (token.entry_type(), owned(token.name())),
            None => (EntryType::EndOfStream, None),
        })
    }

    fn consume_entry(&mut self) -> SerialResult<()> {
        self.advance();
        Ok(())
    }

    fn enter_node(&mut self) -> SerialResult<Option<NodeInfo>> {
        let Some(Token::StartOfNode { name, type_name, id }) = self.current() else {
            return self.mismatch();
        };
        let declared = self.bind_type(type_name.as_deref());
        self.advance();
        self.nodes.push_node(name.as_deref(), *id, declared);
        Ok(Some(self.nodes.current().clone()))
    }

    fn exit_node(&mut self) -> SerialResult<bool> {
        skip_to_end_of_node(self)?;
        if self.peek_entry()?.0 != EntryType::EndOfNode {
            return Ok(false);
        }
        self.advance();
        let name = self.nodes.current().name.clone();
        self.nodes.pop_node(name.as_deref())?;
        Ok(true)
    }

    fn enter_array(&mut self) -> SerialResult<Option<u64>> {
        let Some(&Token::StartOfArray { length }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        self.nodes.push_array();
        Ok(Some(length))
    }

    fn exit_array(&mut self) -> SerialResult<bool> {
        skip_to_end_of_array(self)?;
        if self.peek_entry()?.0 != EntryType::EndOfArray {
            return Ok(false);
        }
        self.advance();
        self.nodes.pop_array()?;
        Ok(true)
    }

    fn read_primitive_array(&mut self) -> SerialResult<Option<PrimitiveArray>> {
        let Some(Token::PrimitiveArray { array, .. }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        Ok(Some(array.clone()))
    }

    fn read_null(&mut self) -> SerialResult<bool> {
        if let Some(Token::Null { .. }) = self.current() {
            self.advance();
            return Ok(true);
        }
        self.mismatch::<()>()?;
        Ok(false)
    }

    fn read_internal_reference(&mut self) -> SerialResult<Option<i32>> {
        let Some(&Token::InternalReference { id, .. }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        Ok(Some(id))
    }

    fn read_external_reference_by_index(&mut self) -> SerialResult<Option<i32>> {
        let Some(&Token::ExternalReferenceByIndex { index, .. }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        Ok(Some(index))
    }

    fn read_external_reference_by_guid(&mut self) -> SerialResult<Option<Guid>> {
        let Some(&Token::ExternalReferenceByGuid { guid, .. }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        Ok(Some(guid))
    }

    fn read_external_reference_by_string(&mut self) -> SerialResult<Option<String>> {
        let Some(Token::ExternalReferenceByString { key, .. }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        Ok(Some(key.clone()))
    }

    fn read_bool(&mut self) -> SerialResult<Option<bool>> {
        let Some(&Token::Boolean { value, .. }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        Ok(Some(value))
    }

    fn read_char(&mut self) -> SerialResult<Option<char>> {
        let Some(Token::String { value, .. }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        let mut chars = value.chars();
        Ok(match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        })
    }

    fn read_i64(&mut self) -> SerialResult<Option<i64>> {
        let value = match self.current() {
            Some(&Token::Integer { value, .. }) => value.to_i64(),
            Some(&Token::FloatingPoint { value, .. }) => float_to_i64(value),
            _ => return self.mismatch(),
        };
        self.advance();
        Ok(value)
    }

    fn read_u64(&mut self) -> SerialResult<Option<u64>> {
        let value = match self.current() {
            Some(&Token::Integer { value, .. }) => value.to_u64(),
            Some(&Token::FloatingPoint { value, .. }) => float_to_u64(value),
            _ => return self.mismatch(),
        };
        self.advance();
        Ok(value)
    }

    fn read_f64(&mut self) -> SerialResult<Option<f64>> {
        let value = match self.current() {
            Some(&Token::FloatingPoint { value, .. }) => value,
            Some(&Token::Integer { value, .. }) => value.to_f64(),
            _ => return self.mismatch(),
        };
        self.advance();
        Ok(Some(value))
    }

    fn read_string(&mut self) -> SerialResult<Option<String>> {
        let Some(Token::String { value, .. }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        Ok(Some(value.clone()))
    }

    fn read_guid(&mut self) -> SerialResult<Option<Guid>> {
        let Some(&Token::Guid { value, .. }) = self.current() else {
            return self.mismatch();
        };
        self.advance();
        Ok(Some(value))
    }

    #[inline]
    fn skip_entry(&mut self) -> SerialResult<()> {
        skip_entry(self)
    }

    fn prepare_new_session(&mut self) {
        self.nodes.clear();
        self.context.prepare_new_session();
        self.bound_types.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::{IntegerValue, Token, TokenReader, TokenWriter};
    use crate::context::DeserializationContext;
    use crate::error::{ProtocolError, SerialError};
    use crate::stream::{DataReader, DataWriter, EntryType};

    fn int(name: &str, value: i64) -> Token {
        Token::Integer {
            name: Some(name.into()),
            value: IntegerValue::Signed(value),
        }
    }

    #[test]
    fn end_node_checks_the_name() {
        let mut writer = TokenWriter::default();
        writer.begin_struct_node(Some("a"), None).unwrap();
        let error = writer.end_node(Some("b")).unwrap_err();
        assert!(matches!(
            error,
            SerialError::Protocol(ProtocolError::NodeNameMismatch { .. })
        ));
        writer.end_node(Some("a")).unwrap();
        assert_eq!(writer.tokens().last(), Some(&Token::EndOfNode));
    }

    #[test]
    fn failed_read_consumes_the_entry() {
        let tokens = vec![
            Token::String {
                name: Some("x".into()),
                value: "text".into(),
            },
            int("y", 2),
        ];
        let mut reader = TokenReader::new(&tokens, DeserializationContext::default());
        assert_eq!(reader.read_i32().unwrap(), None);
        assert_eq!(reader.peek_entry().unwrap(), (EntryType::Integer, Some("y".into())));
        assert_eq!(reader.read_i32().unwrap(), Some(2));
        assert!(reader.is_exhausted());
        assert_eq!(reader.peek_entry().unwrap().0, EntryType::EndOfStream);
    }

    #[test]
    fn failed_read_keeps_end_markers() {
        let tokens = vec![Token::EndOfArray];
        let mut reader = TokenReader::new(&tokens, DeserializationContext::default());
        assert_eq!(reader.read_bool().unwrap(), None);
        assert_eq!(reader.peek_entry().unwrap().0, EntryType::EndOfArray);
    }

    #[test]
    fn numbers_cross_convert() {
        let tokens = vec![
            Token::FloatingPoint {
                name: None,
                value: 4.0,
            },
            int("big", 300),
            int("f", 3),
        ];
        let mut reader = TokenReader::new(&tokens, DeserializationContext::default());
        assert_eq!(reader.read_i16().unwrap(), Some(4));
        // Overflow is consumed and reported as a failed read.
        assert_eq!(reader.read_u8().unwrap(), None);
        assert_eq!(reader.read_f32().unwrap(), Some(3.0));
    }

    #[test]
    fn exit_node_skips_remaining_members() {
        let tokens = vec![
            Token::StartOfNode {
                name: Some("n".into()),
                type_name: None,
                id: -1,
            },
            int("a", 1),
            Token::StartOfArray { length: 1 },
            int("b", 2),
            Token::EndOfArray,
            Token::EndOfNode,
            int("after", 3),
        ];
        let mut reader = TokenReader::new(&tokens, DeserializationContext::default());
        let node = reader.enter_node().unwrap().unwrap();
        assert_eq!(node.name.as_deref(), Some("n"));
        assert!(reader.exit_node().unwrap());
        assert_eq!(reader.nodes().depth(), 0);
        assert_eq!(reader.read_i64().unwrap(), Some(3));
    }
}
