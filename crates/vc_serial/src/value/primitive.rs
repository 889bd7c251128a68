use alloc::boxed::Box;
use alloc::string::String;

use crate::Reflect;
use crate::error::SerialResult;
use crate::info::{PrimitiveKind, TypeInfo};
use crate::stream::{DataReader, DataWriter};
use crate::value::Guid;

macro_rules! define_primitive_value {
    ($( $variant:ident($ty:ty) => $read:ident; )*) => {
        /// A boxed primitive of any [`PrimitiveKind`].
        #[derive(Clone, Debug, PartialEq)]
        pub enum PrimitiveValue {
            $( $variant($ty), )*
        }

        impl PrimitiveValue {
            /// The kind of the stored primitive.
            pub fn kind(&self) -> PrimitiveKind {
                match self {
                    $( Self::$variant(_) => PrimitiveKind::$variant, )*
                }
            }

            /// The default value of a primitive kind.
            pub fn default_of(kind: PrimitiveKind) -> Self {
                match kind {
                    $( PrimitiveKind::$variant => Self::$variant(<$ty>::default()), )*
                }
            }

            /// Moves the primitive into a reflected box.
            pub fn into_reflect(self) -> Box<dyn Reflect> {
                match self {
                    $( Self::$variant(value) => Box::new(value), )*
                }
            }

            /// Copies a reflected primitive, `None` if `value` is not a primitive.
            pub fn from_reflect(value: &dyn Reflect) -> Option<Self> {
                match value.reflect_type_info().primitive_kind()? {
                    $( PrimitiveKind::$variant => value.downcast_ref::<$ty>().cloned().map(Self::$variant), )*
                }
            }

            /// Reads a primitive of `kind`, `Ok(None)` if the entry did not match.
            pub fn read(kind: PrimitiveKind, reader: &mut dyn DataReader) -> SerialResult<Option<Self>> {
                Ok(match kind {
                    $( PrimitiveKind::$variant => reader.$read()?.map(Self::$variant), )*
                })
            }
        }
    };
}

define_primitive_value! {
    Bool(bool) => read_bool;
    Char(char) => read_char;
    I8(i8) => read_i8;
    I16(i16) => read_i16;
    I32(i32) => read_i32;
    I64(i64) => read_i64;
    Isize(isize) => read_isize;
    U8(u8) => read_u8;
    U16(u16) => read_u16;
    U32(u32) => read_u32;
    U64(u64) => read_u64;
    Usize(usize) => read_usize;
    F32(f32) => read_f32;
    F64(f64) => read_f64;
    String(String) => read_string;
    Guid(Guid) => read_guid;
}

impl PrimitiveValue {
    /// Writes the primitive as a single entry.
    pub fn write(&self, name: Option<&str>, writer: &mut dyn DataWriter) -> SerialResult<()> {
        match *self {
            Self::Bool(value) => writer.write_bool(name, value),
            Self::Char(value) => writer.write_char(name, value),
            Self::I8(value) => writer.write_i8(name, value),
            Self::I16(value) => writer.write_i16(name, value),
            Self::I32(value) => writer.write_i32(name, value),
            Self::I64(value) => writer.write_i64(name, value),
            Self::Isize(value) => writer.write_isize(name, value),
            Self::U8(value) => writer.write_u8(name, value),
            Self::U16(value) => writer.write_u16(name, value),
            Self::U32(value) => writer.write_u32(name, value),
            Self::U64(value) => writer.write_u64(name, value),
            Self::Usize(value) => writer.write_usize(name, value),
            Self::F32(value) => writer.write_f32(name, value),
            Self::F64(value) => writer.write_f64(name, value),
            Self::String(ref value) => writer.write_string(name, value),
            Self::Guid(value) => writer.write_guid(name, value),
        }
    }

    /// The type info of the stored primitive.
    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        self.kind().type_info()
    }
}

macro_rules! impl_from_primitive {
    ($( $variant:ident($ty:ty), )*) => {
        $(
            impl From<$ty> for PrimitiveValue {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    Bool(bool), Char(char), I8(i8), I16(i16), I32(i32), I64(i64), Isize(isize),
    U8(u8), U16(u16), U32(u32), U64(u64), Usize(usize), F32(f32), F64(f64),
    String(String), Guid(Guid),
}

impl From<&str> for PrimitiveValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}
