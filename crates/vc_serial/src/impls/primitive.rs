use alloc::string::String;

use vc_os::sync::Arc;

use crate::Serial;
use crate::info::{NonGenericTypeInfoCell, PrimitiveKind, TypeInfo, TypeKind, TypePath, Typed};
use crate::registry::GetTypeMeta;
use crate::serializer::{PrimitiveSerializer, Serializer};
use crate::value::Guid;

macro_rules! impl_primitive {
    ($( $ty:ty => $kind:ident, $path:literal, $name:literal; )*) => {
        $(
            impl TypePath for $ty {
                #[inline]
                fn type_path() -> &'static str {
                    $path
                }

                #[inline]
                fn type_name() -> &'static str {
                    $name
                }
            }

            impl Typed for $ty {
                fn type_info() -> &'static TypeInfo {
                    static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                    CELL.get_or_init(|| {
                        TypeInfo::new::<Self>(TypeKind::Primitive(PrimitiveKind::$kind))
                            .with_default::<Self>()
                            .with_serializer::<Self>()
                    })
                }
            }

            impl Serial for $ty {
                fn create_serializer() -> Arc<dyn Serializer<Self>> {
                    Arc::new(PrimitiveSerializer::<Self>::new())
                }
            }

            impl GetTypeMeta for $ty {}
        )*
    };
}

impl_primitive! {
    bool => Bool, "bool", "bool";
    char => Char, "char", "char";
    i8 => I8, "i8", "i8";
    i16 => I16, "i16", "i16";
    i32 => I32, "i32", "i32";
    i64 => I64, "i64", "i64";
    isize => Isize, "isize", "isize";
    u8 => U8, "u8", "u8";
    u16 => U16, "u16", "u16";
    u32 => U32, "u32", "u32";
    u64 => U64, "u64", "u64";
    usize => Usize, "usize", "usize";
    f32 => F32, "f32", "f32";
    f64 => F64, "f64", "f64";
    String => String, "alloc::string::String", "String";
    Guid => Guid, "uuid::Uuid", "Uuid";
}

#[cfg(test)]
mod tests {
    use vc_os::sync::Arc;

    use crate::info::{PrimitiveKind, Typed};
    use crate::serializer;
    use crate::value::Guid;

    #[test]
    fn primitive_infos() {
        assert_eq!(i32::type_info().primitive_kind(), Some(PrimitiveKind::I32));
        assert_eq!(Guid::type_info().type_path(), "uuid::Uuid");
        assert!(f64::type_info().has_default());
        assert!(!u8::type_info().is_abstract());
    }

    #[test]
    fn compiled_serializer_is_the_typed_one() {
        let erased = u16::type_info().compiled_serializer().unwrap();
        let typed = serializer::for_type(u16::type_info(), false).unwrap();
        assert!(Arc::ptr_eq(&erased, &typed));
        assert_eq!(erased.serialized_type(), u16::type_info());
    }
}
