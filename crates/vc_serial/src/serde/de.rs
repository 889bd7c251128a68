use alloc::format;
use alloc::string::{String, ToString};

use serde::de::value::{SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeSeed, Visitor};

use super::{BridgeError, KEY};
use crate::stream::{DataReader, EntryType, PrimitiveArray};

// -----------------------------------------------------------------------------
// EntryDeserializer

/// A [`serde::Deserializer`] reading one value from entries.
///
/// Values are always handed to visitors owned, so any `DeserializeOwned`
/// type can be read.
pub struct EntryDeserializer<'r> {
    reader: &'r mut dyn DataReader,
    inline: bool,
}

impl<'r> EntryDeserializer<'r> {
    /// Reads from inside the node the caller has already entered.
    pub fn new(reader: &'r mut dyn DataReader) -> Self {
        Self {
            reader,
            inline: true,
        }
    }

    /// Reads the single entry at the current position.
    pub fn entry(reader: &'r mut dyn DataReader) -> Self {
        Self {
            reader,
            inline: false,
        }
    }

    fn peek(&mut self) -> Result<(EntryType, Option<String>), BridgeError> {
        Ok(self.reader.peek_entry()?)
    }
}

fn mismatch(expected: &str, found: EntryType) -> BridgeError {
    BridgeError::Custom(format!("expected {expected}, found {found:?} entry"))
}

fn visit_array<'de, V: Visitor<'de>>(
    reader: &mut dyn DataReader,
    visitor: V,
) -> Result<V::Value, BridgeError> {
    if reader.enter_array()?.is_none() {
        let (entry, _) = reader.peek_entry()?;
        return Err(mismatch("an array", entry));
    }
    let value = visitor.visit_seq(ElementAccess { reader: &mut *reader })?;
    reader.exit_array()?;
    Ok(value)
}

/// Reads the members of an entered node, either an array of key/value
/// pairs or named entries.
fn visit_members<'de, V: Visitor<'de>>(
    reader: &mut dyn DataReader,
    visitor: V,
) -> Result<V::Value, BridgeError> {
    let (entry, _) = reader.peek_entry()?;
    if entry != EntryType::StartOfArray {
        return visitor.visit_map(MemberAccess { reader });
    }
    reader.enter_array()?;
    let value = visitor.visit_map(PairAccess { reader: &mut *reader })?;
    reader.exit_array()?;
    Ok(value)
}

fn visit_node<'de, V: Visitor<'de>>(
    reader: &mut dyn DataReader,
    visitor: V,
    contents: fn(&mut dyn DataReader, V) -> Result<V::Value, BridgeError>,
) -> Result<V::Value, BridgeError> {
    if reader.enter_node()?.is_none() {
        let (entry, _) = reader.peek_entry()?;
        return Err(mismatch("a node", entry));
    }
    let value = contents(&mut *reader, visitor)?;
    reader.exit_node()?;
    Ok(value)
}

macro_rules! visit_primitive_array {
    ($array:expr, $visitor:expr, [$( $variant:ident ),*]) => {
        match $array {
            $(
                PrimitiveArray::$variant(items) => {
                    let mut seq = SeqDeserializer::<_, BridgeError>::new(items.into_iter());
                    let value = $visitor.visit_seq(&mut seq)?;
                    seq.end()?;
                    Ok(value)
                }
            )*
        }
    };
}

fn visit_primitive_array<'de, V: Visitor<'de>>(
    reader: &mut dyn DataReader,
    visitor: V,
    bytes: bool,
) -> Result<V::Value, BridgeError> {
    let Some(array) = reader.read_primitive_array()? else {
        return Err(BridgeError::Custom("unreadable primitive array".to_string()));
    };
    match array {
        PrimitiveArray::U8(items) if bytes => visitor.visit_byte_buf(items),
        array => visit_primitive_array!(
            array,
            visitor,
            [Bool, Char, I8, I16, I32, I64, U8, U16, U32, U64, F32, F64]
        ),
    }
}

macro_rules! deserialize_scalars {
    ($( $method:ident => $read:ident, $visit:ident, $expected:literal; )*) => {
        $(
            fn $method<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value, BridgeError> {
                match self.reader.$read()? {
                    Some(value) => visitor.$visit(value),
                    None => Err(BridgeError::Custom(format!("expected {}", $expected))),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for EntryDeserializer<'_> {
    type Error = BridgeError;

    fn deserialize_any<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value, BridgeError> {
        let (entry, name) = self.peek()?;
        if self.inline {
            if entry == EntryType::StartOfArray {
                return visit_array(self.reader, visitor);
            }
            if name.is_some() || entry.is_end() {
                return visitor.visit_map(MemberAccess {
                    reader: self.reader,
                });
            }
        }
        match entry {
            EntryType::Null => {
                self.reader.read_null()?;
                visitor.visit_unit()
            }
            EntryType::Boolean => self.deserialize_bool(visitor),
            // Integers beyond `i64::MAX` need a typed `u64` read.
            EntryType::Integer => self.deserialize_i64(visitor),
            EntryType::FloatingPoint => self.deserialize_f64(visitor),
            EntryType::String => self.deserialize_string(visitor),
            EntryType::Guid => match self.reader.read_guid()? {
                Some(guid) => visitor.visit_string(guid.to_string()),
                None => Err(mismatch("a guid", entry)),
            },
            EntryType::StartOfNode => visit_node(self.reader, visitor, |reader, visitor| {
                let (entry, _) = reader.peek_entry()?;
                if entry == EntryType::StartOfArray {
                    visit_array(reader, visitor)
                } else {
                    visitor.visit_map(MemberAccess { reader })
                }
            }),
            EntryType::StartOfArray => visit_array(self.reader, visitor),
            EntryType::PrimitiveArray => visit_primitive_array(self.reader, visitor, false),
            other => Err(mismatch("a value", other)),
        }
    }

    deserialize_scalars! {
        deserialize_bool => read_bool, visit_bool, "a boolean";
        deserialize_i8 => read_i8, visit_i8, "an i8";
        deserialize_i16 => read_i16, visit_i16, "an i16";
        deserialize_i32 => read_i32, visit_i32, "an i32";
        deserialize_i64 => read_i64, visit_i64, "an i64";
        deserialize_u8 => read_u8, visit_u8, "a u8";
        deserialize_u16 => read_u16, visit_u16, "a u16";
        deserialize_u32 => read_u32, visit_u32, "a u32";
        deserialize_u64 => read_u64, visit_u64, "a u64";
        deserialize_f32 => read_f32, visit_f32, "an f32";
        deserialize_f64 => read_f64, visit_f64, "an f64";
        deserialize_char => read_char, visit_char, "a char";
        deserialize_string => read_string, visit_string, "a string";
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BridgeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BridgeError> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value, BridgeError> {
        match self.peek()?.0 {
            EntryType::PrimitiveArray => visit_primitive_array(self.reader, visitor, true),
            _ => self.deserialize_seq(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value, BridgeError> {
        let (entry, _) = self.peek()?;
        if entry == EntryType::Null {
            self.reader.read_null()?;
            visitor.visit_none()
        } else if entry.is_end() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value, BridgeError> {
        if self.reader.read_null()? {
            visitor.visit_unit()
        } else {
            Err(BridgeError::Custom("expected a null entry".to_string()))
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BridgeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BridgeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value, BridgeError> {
        match self.peek()?.0 {
            EntryType::StartOfArray => visit_array(self.reader, visitor),
            EntryType::PrimitiveArray => visit_primitive_array(self.reader, visitor, false),
            EntryType::StartOfNode if !self.inline => visit_node(self.reader, visitor, visit_array),
            other => Err(mismatch("a sequence", other)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, BridgeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, BridgeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(mut self, visitor: V) -> Result<V::Value, BridgeError> {
        if self.inline {
            return visit_members(self.reader, visitor);
        }
        match self.peek()?.0 {
            EntryType::StartOfNode => visit_node(self.reader, visitor, visit_members),
            other => Err(mismatch("a map node", other)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BridgeError> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        mut self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BridgeError> {
        let (entry, name) = self.peek()?;
        match entry {
            EntryType::String => match self.reader.read_string()? {
                Some(variant) => visitor.visit_enum(StringDeserializer::<BridgeError>::new(variant)),
                None => Err(mismatch("a variant name", entry)),
            },
            _ if self.inline && name.is_some() => visitor.visit_enum(VariantAccess {
                reader: self.reader,
            }),
            EntryType::StartOfNode => visit_node(self.reader, visitor, |reader, visitor| {
                visitor.visit_enum(VariantAccess { reader })
            }),
            other => Err(mismatch("an enum", other)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BridgeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        mut self,
        visitor: V,
    ) -> Result<V::Value, BridgeError> {
        self.reader.skip_entry()?;
        visitor.visit_unit()
    }
}

// -----------------------------------------------------------------------------
// Accessors

/// The elements of an entered array.
struct ElementAccess<'a> {
    reader: &'a mut dyn DataReader,
}

impl<'de> de::SeqAccess<'de> for ElementAccess<'_> {
    type Error = BridgeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, BridgeError> {
        let (entry, _) = self.reader.peek_entry()?;
        if entry.is_end() {
            return Ok(None);
        }
        seed.deserialize(EntryDeserializer::entry(&mut *self.reader))
            .map(Some)
    }
}

/// The named entries of an entered node.
struct MemberAccess<'a> {
    reader: &'a mut dyn DataReader,
}

impl<'de> de::MapAccess<'de> for MemberAccess<'_> {
    type Error = BridgeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, BridgeError> {
        loop {
            let (entry, name) = self.reader.peek_entry()?;
            if entry.is_end() {
                return Ok(None);
            }
            match name {
                Some(name) => {
                    return seed
                        .deserialize(StringDeserializer::<BridgeError>::new(name))
                        .map(Some);
                }
                None => self.reader.skip_entry()?,
            }
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, BridgeError> {
        seed.deserialize(EntryDeserializer::entry(&mut *self.reader))
    }
}

/// An entered array of `{ key, value }` nodes.
struct PairAccess<'a> {
    reader: &'a mut dyn DataReader,
}

impl<'de> de::MapAccess<'de> for PairAccess<'_> {
    type Error = BridgeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, BridgeError> {
        let (entry, _) = self.reader.peek_entry()?;
        if entry.is_end() {
            return Ok(None);
        }
        if self.reader.enter_node()?.is_none() {
            return Err(mismatch("a key/value node", entry));
        }
        let (entry, name) = self.reader.peek_entry()?;
        if name.as_deref() != Some(KEY) {
            return Err(mismatch("a `key` entry", entry));
        }
        seed.deserialize(EntryDeserializer::entry(&mut *self.reader))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, BridgeError> {
        let value = seed.deserialize(EntryDeserializer::entry(&mut *self.reader))?;
        self.reader.exit_node()?;
        Ok(value)
    }
}

/// A node holding one entry named by an enum variant.
struct VariantAccess<'a> {
    reader: &'a mut dyn DataReader,
}

impl<'de> de::EnumAccess<'de> for VariantAccess<'_> {
    type Error = BridgeError;
    type Variant = Self;

    fn variant_seed<T: DeserializeSeed<'de>>(
        mut self,
        seed: T,
    ) -> Result<(T::Value, Self), BridgeError> {
        let (entry, name) = self.reader.peek_entry()?;
        let Some(name) = name else {
            return Err(mismatch("a named variant entry", entry));
        };
        let variant = seed.deserialize(StringDeserializer::<BridgeError>::new(name))?;
        Ok((variant, self))
    }
}

impl<'de> de::VariantAccess<'de> for VariantAccess<'_> {
    type Error = BridgeError;

    fn unit_variant(mut self) -> Result<(), BridgeError> {
        self.reader.skip_entry()?;
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, BridgeError> {
        seed.deserialize(EntryDeserializer::entry(self.reader))
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, BridgeError> {
        de::Deserializer::deserialize_seq(EntryDeserializer::entry(self.reader), visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BridgeError> {
        de::Deserializer::deserialize_map(EntryDeserializer::entry(self.reader), visitor)
    }
}
