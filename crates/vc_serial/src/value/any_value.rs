use alloc::boxed::Box;
use core::fmt;

use crate::Reflect;
use crate::info::{TypeInfo, Typed};
use crate::value::{Obj, ObjectRef, PrimitiveValue};

/// The fully dynamic `object` slot.
///
/// Written with its runtime type in the stream whenever it holds anything
/// but null, so it can be read back without static knowledge of the value.
#[derive(Default)]
pub enum AnyValue {
    #[default]
    Null,
    /// A boxed primitive.
    Primitive(PrimitiveValue),
    /// A boxed value without identity.
    Value(Box<dyn Reflect>),
    /// A shared object with identity.
    Object(ObjectRef),
}

impl AnyValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The runtime type of the held value, `None` for null.
    pub fn value_type_info(&self) -> Option<&'static TypeInfo> {
        match self {
            Self::Null => None,
            Self::Primitive(value) => Some(value.type_info()),
            Self::Value(value) => Some(value.reflect_type_info()),
            Self::Object(object) => Some(object.type_info()),
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Self::Primitive(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns a typed view of the held object.
    pub fn as_obj<T: Typed + ?Sized>(&self) -> Option<Obj<T>> {
        self.as_object().and_then(ObjectRef::downcast)
    }

    /// Downcasts a held boxed value.
    pub fn downcast_value_ref<T: Typed>(&self) -> Option<&T> {
        match self {
            Self::Value(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Boxes any value: primitives become [`AnyValue::Primitive`], everything
    /// else [`AnyValue::Value`].
    pub fn from_value(value: Box<dyn Reflect>) -> Self {
        match PrimitiveValue::from_reflect(&*value) {
            Some(primitive) => Self::Primitive(primitive),
            None => Self::Value(value),
        }
    }
}

impl From<PrimitiveValue> for AnyValue {
    #[inline]
    fn from(value: PrimitiveValue) -> Self {
        Self::Primitive(value)
    }
}

impl From<ObjectRef> for AnyValue {
    #[inline]
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl<T: Typed + ?Sized> From<Obj<T>> for AnyValue {
    #[inline]
    fn from(value: Obj<T>) -> Self {
        Self::Object(value.into_object())
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Primitive(value) => f.debug_tuple("Primitive").field(value).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Object(object) => f.debug_tuple("Object").field(object).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;

    use super::AnyValue;
    use crate::info::Typed;
    use crate::value::{Obj, PrimitiveValue};

    #[test]
    fn held_and_slot_types_differ() {
        assert_eq!(AnyValue::type_info().type_path(), "vc_serial::value::AnyValue");
        assert!(AnyValue::Null.value_type_info().is_none());

        let primitive = AnyValue::from(PrimitiveValue::I32(4));
        assert_eq!(primitive.value_type_info(), Some(i32::type_info()));

        let boxed = AnyValue::from_value(Box::new(String::from("text")));
        assert_eq!(boxed.value_type_info(), Some(String::type_info()));
    }

    #[test]
    fn typed_objects_convert_into_the_slot() {
        let shared = Obj::new(String::from("shared"));
        let slot = AnyValue::from(shared.clone());
        assert_eq!(slot.value_type_info(), Some(String::type_info()));
        assert!(slot.as_obj::<String>().is_some_and(|obj| obj.ptr_eq(&shared)));
    }
}
