use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use vc_os::sync::Arc;

use crate::info::{TypeInfo, Typed};
use crate::serializer::{ComplexTypeSerializer, Serializer};

// -----------------------------------------------------------------------------
// Reflect

/// Object-safe view over any [`Typed`] value.
///
/// Implemented for every sized `Typed` type; formatters and the weak
/// serializers only ever see values through `&dyn Reflect`.
pub trait Reflect: Any {
    /// Returns the [`TypeInfo`] of the underlying type.
    fn reflect_type_info(&self) -> &'static TypeInfo;

    /// Replaces `self` with `value` if it has the same type,
    /// handing `value` back otherwise.
    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>;
}

impl<T: Typed> Reflect for T {
    #[inline]
    fn reflect_type_info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    fn set(&mut self, value: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        *self = value.take::<T>()?;
        Ok(())
    }
}

impl dyn Reflect {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline(always)]
    pub fn is<T: Any>(&self) -> bool {
        Any::type_id(self) == TypeId::of::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        <dyn Any>::downcast_ref(self)
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        <dyn Any>::downcast_mut(self)
    }

    /// Downcasts the box, handing it back unchanged on a type mismatch.
    pub fn downcast<T: Any>(self: Box<dyn Reflect>) -> Result<Box<T>, Box<dyn Reflect>> {
        if self.is::<T>() {
            Ok(<Box<dyn Any>>::downcast::<T>(self)
                .unwrap_or_else(|_| unreachable!("type is already checked")))
        } else {
            Err(self)
        }
    }

    /// Moves the value out of the box if it is a `T`.
    #[inline]
    pub fn take<T: Any>(self: Box<dyn Reflect>) -> Result<T, Box<dyn Reflect>> {
        self.downcast::<T>().map(|value| *value)
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reflect({})", self.reflect_type_info().type_path())
    }
}

// -----------------------------------------------------------------------------
// Serial

/// A type that can be serialized through a statically typed [`Serializer`].
///
/// Derived with `#[derive(Serial)]`. Types that are not structs override
/// `create_serializer` to pick their dedicated serializer; everything else is
/// handled by the [`ComplexTypeSerializer`].
pub trait Serial: Typed + Default {
    #[doc(hidden)]
    fn create_serializer() -> Arc<dyn Serializer<Self>> {
        Arc::new(ComplexTypeSerializer::<Self>::new())
    }
}
