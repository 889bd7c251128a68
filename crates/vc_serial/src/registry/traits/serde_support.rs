use alloc::boxed::Box;

use serde::de::DeserializeOwned;
use serde::{Deserializer, Serialize, Serializer};

use crate::Reflect;
use crate::info::Typed;
use crate::registry::FromType;

/// Marks a type as externally serializable through its `serde`
/// implementations.
///
/// The serde formatter locator picks this up and drives the type through
/// the [serde bridge](crate::serde), so any `Serialize + Deserialize` type can
/// live inside an object graph without a derived formatter.
///
/// # Panics
///
/// The stored functions are type specific: serializing a value of another
/// type panics.
///
/// # Example
///
/// ```
/// use vc_serial::registry::{FromType, TypeTraitSerde};
///
/// let serde_trait: TypeTraitSerde = FromType::<u32>::from_type();
///
/// let json = serde_trait.serialize(&7_u32, serde_json::value::Serializer).unwrap();
/// assert_eq!(json, serde_json::json!(7));
///
/// let value = serde_trait.deserialize(serde_json::json!(9)).unwrap();
/// assert_eq!(value.take::<u32>().ok(), Some(9));
/// ```
#[derive(Clone, Copy)]
pub struct TypeTraitSerde {
    serialize: fn(&dyn Reflect) -> &dyn erased_serde::Serialize,
    deserialize: fn(
        &mut dyn erased_serde::Deserializer,
    ) -> Result<Box<dyn Reflect>, erased_serde::Error>,
}

impl<T: Serialize + DeserializeOwned + Typed> FromType<T> for TypeTraitSerde {
    fn from_type() -> Self {
        Self {
            serialize: |value| match value.downcast_ref::<T>() {
                Some(val) => val as &dyn erased_serde::Serialize,
                None => panic!(
                    "serde type mismatched, expected `{}` but the value is `{}`",
                    T::type_path(),
                    value.reflect_type_info(),
                ),
            },
            deserialize: |deserializer| Ok(Box::new(T::deserialize(deserializer)?)),
        }
    }
}

impl TypeTraitSerde {
    /// Calls the `Serialize` implementation of the value's type.
    #[inline]
    pub fn serialize<S: Serializer>(&self, value: &dyn Reflect, serializer: S) -> Result<S::Ok, S::Error> {
        (self.serialize)(value).serialize(serializer)
    }

    /// Calls the `Deserialize` implementation of the stored type.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        &self,
        deserializer: D,
    ) -> Result<Box<dyn Reflect>, D::Error> {
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        (self.deserialize)(&mut erased).map_err(<D::Error as serde::de::Error>::custom)
    }
}
