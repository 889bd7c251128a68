use core::time::Duration;

use vc_os::sync::Arc;

use crate::info::{InterfaceInfo, NonGenericTypeInfoCell, TypeInfo, TypeKind, TypePath, Typed};
use crate::registry::GetTypeMeta;
use crate::serializer::{DynamicSerializer, Serializer};
use crate::value::{AnyValue, TypeRef};
use crate::{Reflect, Serial};

macro_rules! impl_type_path {
    ($ty:ty, $path:literal, $name:literal) => {
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
    };
}

// -----------------------------------------------------------------------------
// dyn Reflect

impl_type_path!(dyn Reflect, "vc_serial::Reflect", "Reflect");

/// The root interface: every type is assignable to it.
impl Typed for dyn Reflect {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::new::<Self>(TypeKind::Interface(InterfaceInfo::root())))
    }
}

impl GetTypeMeta for dyn Reflect {}

// -----------------------------------------------------------------------------
// AnyValue

impl_type_path!(AnyValue, "vc_serial::value::AnyValue", "AnyValue");

impl Typed for AnyValue {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Self>(TypeKind::Dynamic)
                .with_default::<Self>()
                .with_serializer::<Self>()
        })
    }
}

impl Serial for AnyValue {
    fn create_serializer() -> Arc<dyn Serializer<Self>> {
        Arc::new(DynamicSerializer)
    }
}

impl GetTypeMeta for AnyValue {}

// -----------------------------------------------------------------------------
// TypeRef

impl_type_path!(TypeRef, "vc_serial::value::TypeRef", "TypeRef");

impl Typed for TypeRef {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Self>(TypeKind::TypeRef)
                .with_default::<Self>()
                .with_serializer::<Self>()
        })
    }
}

impl Serial for TypeRef {}

impl GetTypeMeta for TypeRef {}

// -----------------------------------------------------------------------------
// Duration

impl_type_path!(Duration, "core::time::Duration", "Duration");

/// Written by the registered `DurationFormatter`.
impl Typed for Duration {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Self>(TypeKind::Opaque)
                .with_serializable(true)
                .with_default::<Self>()
                .with_serializer::<Self>()
        })
    }
}

impl Serial for Duration {}

impl GetTypeMeta for Duration {}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use crate::Reflect;
    use crate::info::Typed;
    use crate::value::AnyValue;

    #[test]
    fn everything_is_assignable_to_the_root_interface() {
        let root = <dyn Reflect>::type_info();
        assert!(root.is_abstract());
        assert!(i32::type_info().is_assignable_to(root));
        assert!(Duration::type_info().is_assignable_to(AnyValue::type_info()));
        assert!(!root.is_assignable_to(i32::type_info()));
    }
}
