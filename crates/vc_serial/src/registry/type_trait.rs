use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

// -----------------------------------------------------------------------------
// TypeTrait

/// A capability of a registered type, stored in its [`TypeMeta`].
///
/// Implemented for every `Clone + Send + Sync` type. A trait table holds at
/// most one value of each `TypeTrait` type.
///
/// [`TypeMeta`]: crate::registry::TypeMeta
pub trait TypeTrait: Any + Send + Sync {
    /// Clones the boxed value, used to clone a whole trait table.
    fn clone_type_trait(&self) -> Box<dyn TypeTrait>;
}

impl<T: Any + Clone + Send + Sync> TypeTrait for T {
    #[inline]
    fn clone_type_trait(&self) -> Box<dyn TypeTrait> {
        Box::new(self.clone())
    }
}

impl dyn TypeTrait {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline(always)]
    pub fn is<T: TypeTrait>(&self) -> bool {
        Any::type_id(self) == TypeId::of::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: TypeTrait>(&self) -> Option<&T> {
        <dyn Any>::downcast_ref(self)
    }

    #[inline]
    pub fn downcast_mut<T: TypeTrait>(&mut self) -> Option<&mut T> {
        <dyn Any>::downcast_mut(self)
    }

    /// Downcasts the box, handing it back unchanged on a type mismatch.
    pub fn downcast<T: TypeTrait>(self: Box<dyn TypeTrait>) -> Result<Box<T>, Box<dyn TypeTrait>> {
        if self.is::<T>() {
            Ok(<Box<dyn Any>>::downcast::<T>(self)
                .unwrap_or_else(|_| unreachable!("type is already checked")))
        } else {
            Err(self)
        }
    }
}

impl fmt::Debug for dyn TypeTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeTrait")
    }
}

#[cfg(test)]
mod tests {
    use super::TypeTrait;
    use alloc::boxed::Box;

    #[derive(Clone, PartialEq, Debug)]
    struct Marker(u32);

    #[test]
    fn downcast_and_clone() {
        let boxed: Box<dyn TypeTrait> = Box::new(Marker(3));
        assert!(boxed.is::<Marker>());
        assert_eq!(boxed.downcast_ref::<Marker>(), Some(&Marker(3)));
        assert!(boxed.downcast_ref::<u32>().is_none());

        let cloned = boxed.clone_type_trait();
        assert_eq!(cloned.downcast::<Marker>().ok().map(|m| *m), Some(Marker(3)));
    }
}
