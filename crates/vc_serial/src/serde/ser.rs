use alloc::vec::Vec;

use serde::ser::{self, Serialize};

use super::{BridgeError, KEY, VALUE};
use crate::stream::{DataWriter, PrimitiveArray};

// -----------------------------------------------------------------------------
// EntrySerializer

/// A [`serde::Serializer`] writing one value as entries.
pub struct EntrySerializer<'w> {
    writer: &'w mut dyn DataWriter,
    name: Option<&'static str>,
    inline: bool,
}

impl<'w> EntrySerializer<'w> {
    /// Writes into the node the caller has already opened.
    pub fn new(writer: &'w mut dyn DataWriter) -> Self {
        Self {
            writer,
            name: None,
            inline: true,
        }
    }

    /// Writes one entry named `name`.
    pub fn named(writer: &'w mut dyn DataWriter, name: Option<&'static str>) -> Self {
        Self {
            writer,
            name,
            inline: false,
        }
    }

    fn open(self) -> Result<Compound<'w>, BridgeError> {
        let mut closes = Vec::new();
        if !self.inline {
            self.writer.begin_struct_node(self.name, None)?;
            closes.push(Close::Node(self.name));
        }
        Ok(Compound {
            writer: self.writer,
            closes,
        })
    }

    fn open_array(self, len: usize) -> Result<Compound<'w>, BridgeError> {
        let mut compound = self.open()?;
        compound.writer.begin_array_node(len as u64)?;
        compound.closes.push(Close::Array);
        Ok(compound)
    }

    fn open_variant(self, variant: &'static str) -> Result<Compound<'w>, BridgeError> {
        let mut compound = self.open()?;
        compound.writer.begin_struct_node(Some(variant), None)?;
        compound.closes.push(Close::Node(Some(variant)));
        Ok(compound)
    }
}

macro_rules! serialize_scalars {
    ($( $method:ident($ty:ty) => $write:ident, )*) => {
        $(
            fn $method(self, v: $ty) -> Result<(), BridgeError> {
                self.writer.$write(self.name, v)?;
                Ok(())
            }
        )*
    };
}

impl<'w> ser::Serializer for EntrySerializer<'w> {
    type Ok = ();
    type Error = BridgeError;
    type SerializeSeq = Compound<'w>;
    type SerializeTuple = Compound<'w>;
    type SerializeTupleStruct = Compound<'w>;
    type SerializeTupleVariant = Compound<'w>;
    type SerializeMap = Compound<'w>;
    type SerializeStruct = Compound<'w>;
    type SerializeStructVariant = Compound<'w>;

    serialize_scalars! {
        serialize_bool(bool) => write_bool,
        serialize_i8(i8) => write_i8,
        serialize_i16(i16) => write_i16,
        serialize_i32(i32) => write_i32,
        serialize_i64(i64) => write_i64,
        serialize_u8(u8) => write_u8,
        serialize_u16(u16) => write_u16,
        serialize_u32(u32) => write_u32,
        serialize_u64(u64) => write_u64,
        serialize_f32(f32) => write_f32,
        serialize_f64(f64) => write_f64,
        serialize_char(char) => write_char,
        serialize_str(&str) => write_string,
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<(), BridgeError> {
        let array = PrimitiveArray::U8(v.to_vec());
        self.writer.write_primitive_array(self.name, &array)?;
        Ok(())
    }

    fn serialize_none(self) -> Result<(), BridgeError> {
        self.writer.write_null(self.name)?;
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), BridgeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), BridgeError> {
        self.serialize_none()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), BridgeError> {
        self.serialize_none()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<(), BridgeError> {
        self.writer.write_string(self.name, variant)?;
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), BridgeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), BridgeError> {
        let mut compound = self.open()?;
        value.serialize(EntrySerializer::named(&mut *compound.writer, Some(variant)))?;
        compound.close()
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Compound<'w>, BridgeError> {
        // The length only sizes buffers on the reading side.
        self.open_array(len.unwrap_or(0))
    }

    fn serialize_tuple(self, len: usize) -> Result<Compound<'w>, BridgeError> {
        self.open_array(len)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Compound<'w>, BridgeError> {
        self.open_array(len)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Compound<'w>, BridgeError> {
        let mut compound = self.open_variant(variant)?;
        compound.writer.begin_array_node(len as u64)?;
        compound.closes.push(Close::Array);
        Ok(compound)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Compound<'w>, BridgeError> {
        self.open_array(len.unwrap_or(0))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound<'w>, BridgeError> {
        self.open()
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'w>, BridgeError> {
        self.open_variant(variant)
    }
}

// -----------------------------------------------------------------------------
// Compound

enum Close {
    Array,
    Node(Option<&'static str>),
}

/// The state of a sequence, map or struct being written.
pub struct Compound<'w> {
    writer: &'w mut dyn DataWriter,
    closes: Vec<Close>,
}

impl Compound<'_> {
    fn element<T: ?Sized + Serialize>(
        &mut self,
        name: Option<&'static str>,
        value: &T,
    ) -> Result<(), BridgeError> {
        value.serialize(EntrySerializer::named(&mut *self.writer, name))
    }

    fn close(mut self) -> Result<(), BridgeError> {
        while let Some(close) = self.closes.pop() {
            match close {
                Close::Array => self.writer.end_array_node()?,
                Close::Node(name) => self.writer.end_node(name)?,
            }
        }
        Ok(())
    }
}

impl ser::SerializeSeq for Compound<'_> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeError> {
        self.element(None, value)
    }

    fn end(self) -> Result<(), BridgeError> {
        self.close()
    }
}

impl ser::SerializeTuple for Compound<'_> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeError> {
        self.element(None, value)
    }

    fn end(self) -> Result<(), BridgeError> {
        self.close()
    }
}

impl ser::SerializeTupleStruct for Compound<'_> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeError> {
        self.element(None, value)
    }

    fn end(self) -> Result<(), BridgeError> {
        self.close()
    }
}

impl ser::SerializeTupleVariant for Compound<'_> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeError> {
        self.element(None, value)
    }

    fn end(self) -> Result<(), BridgeError> {
        self.close()
    }
}

impl ser::SerializeMap for Compound<'_> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), BridgeError> {
        self.writer.begin_struct_node(None, None)?;
        self.element(Some(KEY), key)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), BridgeError> {
        self.element(Some(VALUE), value)?;
        self.writer.end_node(None)?;
        Ok(())
    }

    fn end(self) -> Result<(), BridgeError> {
        self.close()
    }
}

impl ser::SerializeStruct for Compound<'_> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), BridgeError> {
        self.element(Some(key), value)
    }

    fn end(self) -> Result<(), BridgeError> {
        self.close()
    }
}

impl ser::SerializeStructVariant for Compound<'_> {
    type Ok = ();
    type Error = BridgeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), BridgeError> {
        self.element(Some(key), value)
    }

    fn end(self) -> Result<(), BridgeError> {
        self.close()
    }
}
