use vc_os::sync::Arc;

use crate::impls::{OPTION_DEFINITION, concat, impl_generic_type_path};
use crate::info::{GenericTypeInfoCell, GenericTypePathCell, NullableInfo, ReferenceInfo};
use crate::info::{TypeInfo, TypeKind, TypePath, Typed};
use crate::registry::GetTypeMeta;
use crate::serializer::{ReferenceSerializer, Serializer};
use crate::value::Obj;
use crate::{Reflect, Serial};

impl_generic_type_path!(Option<T>, "core::option", "Option");

impl<T: TypePath + ?Sized> TypePath for Obj<T> {
    fn type_path() -> &'static str {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        CELL.get_or_insert::<Self>(|| concat(&["vc_serial::value::Obj<", T::type_path(), ">"]))
    }

    fn type_name() -> &'static str {
        static CELL: GenericTypePathCell = GenericTypePathCell::new();
        CELL.get_or_insert::<Self>(|| concat(&["Obj<", T::type_name(), ">"]))
    }

    fn module_path() -> Option<&'static str> {
        Some("vc_serial::value")
    }
}

// -----------------------------------------------------------------------------
// Nullable values

impl<T: Serial> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = NullableInfo::new::<T>(
                |nullable| {
                    let value = nullable.downcast_ref::<Self>()?.as_ref()?;
                    Some(value as &dyn Reflect)
                },
                |nullable, value| match (nullable.downcast_mut::<Self>(), value.take::<T>()) {
                    (Some(slot), Ok(value)) => {
                        *slot = Some(value);
                        true
                    }
                    _ => false,
                },
            );
            TypeInfo::new::<Self>(TypeKind::Nullable(info))
                .with_generics(&[T::type_info])
                .with_generic_definition(OPTION_DEFINITION)
                .with_default::<Self>()
                .with_serializer::<Self>()
        })
    }
}

impl<T: Serial> Serial for Option<T> {}

impl<T: Serial> GetTypeMeta for Option<T> {}

// -----------------------------------------------------------------------------
// Reference slots

impl<T: Typed + ?Sized> Typed for Option<Obj<T>> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = ReferenceInfo::new::<T>(
                |slot| {
                    let obj = slot.downcast_ref::<Self>()?.as_ref()?;
                    Some(obj.object().clone())
                },
                |slot, object| {
                    let Some(slot) = slot.downcast_mut::<Self>() else {
                        return false;
                    };
                    match object {
                        None => {
                            *slot = None;
                            true
                        }
                        Some(object) => match Obj::from_object(object) {
                            Some(obj) => {
                                *slot = Some(obj);
                                true
                            }
                            None => false,
                        },
                    }
                },
            );
            TypeInfo::new::<Self>(TypeKind::Reference(info))
                .with_generics(&[T::type_info])
                .with_default::<Self>()
                .with_serializer::<Self>()
        })
    }
}

impl<T: Typed + ?Sized> Serial for Option<Obj<T>> {
    fn create_serializer() -> Arc<dyn Serializer<Self>> {
        Arc::new(ReferenceSerializer::<T>::new())
    }
}

impl<T: Typed + ?Sized> GetTypeMeta for Option<Obj<T>> {}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use crate::info::{TypeKind, TypePath, Typed};
    use crate::value::{Obj, ObjectRef};

    #[test]
    fn nullable_and_reference_kinds() {
        assert!(matches!(<Option<u8>>::type_info().kind(), TypeKind::Nullable(_)));
        assert_eq!(<Option<u8>>::type_path(), "core::option::Option<u8>");

        let TypeKind::Reference(info) = <Option<Obj<i32>>>::type_info().kind() else {
            panic!("`Option<Obj<_>>` is a reference slot");
        };
        assert_eq!(info.target(), i32::type_info());

        let mut slot: Option<Obj<i32>> = None;
        assert!(!info.set(&mut slot, Some(ObjectRef::from_value(1_u8))));
        assert!(slot.is_none());

        let object = ObjectRef::from_value(5_i32);
        assert!(info.set(&mut slot, Some(object.clone())));
        assert!(info.get(&slot).is_some_and(|o| o.ptr_eq(&object)));
        assert_eq!(*slot.as_ref().unwrap().borrow(), 5);
    }

    #[test]
    fn nullable_set_checks_the_type() {
        let TypeKind::Nullable(info) = <Option<u16>>::type_info().kind() else {
            panic!("`Option<u16>` is nullable");
        };
        let mut value: Option<u16> = None;
        assert!(!info.set(&mut value, Box::new(1_u32)));
        assert!(info.set(&mut value, Box::new(2_u16)));
        assert_eq!(value, Some(2));
    }
}
