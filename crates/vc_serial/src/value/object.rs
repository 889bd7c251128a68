use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use core::marker::PhantomData;

use crate::Reflect;
use crate::info::{TypeInfo, Typed};

// -----------------------------------------------------------------------------
// ObjectRef

struct ObjectCell {
    type_info: &'static TypeInfo,
    value: RefCell<Option<Box<dyn Reflect>>>,
}

/// A shared object with identity.
///
/// Cloning an `ObjectRef` clones the handle, not the object; two handles
/// are the same object iff [`ptr_eq`](Self::ptr_eq) holds. The object's
/// runtime type is fixed at creation.
///
/// During deserialization an object is created empty and filled once its
/// members have been read, so handles to it can be stored (for cycles)
/// before its contents exist.
#[derive(Clone)]
pub struct ObjectRef(Rc<ObjectCell>);

impl ObjectRef {
    /// Wraps `value` in a new shared object.
    pub fn new(value: Box<dyn Reflect>) -> Self {
        Self(Rc::new(ObjectCell {
            type_info: value.reflect_type_info(),
            value: RefCell::new(Some(value)),
        }))
    }

    /// Wraps a typed value in a new shared object.
    pub fn from_value<T: Typed>(value: T) -> Self {
        Self::new(Box::new(value))
    }

    /// Creates an object of type `type_info` whose value is filled later.
    pub(crate) fn placeholder(type_info: &'static TypeInfo) -> Self {
        Self(Rc::new(ObjectCell {
            type_info,
            value: RefCell::new(None),
        }))
    }

    /// Stores the value of a placeholder.
    pub(crate) fn fill(&self, value: Box<dyn Reflect>) {
        debug_assert_eq!(value.reflect_type_info(), self.0.type_info);
        *self.0.value.borrow_mut() = Some(value);
    }

    /// The runtime type of the object.
    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        self.0.type_info
    }

    /// The address identifying this object.
    #[inline]
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Returns `true` if both handles refer to the same object.
    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `false` while the object is still being deserialized.
    pub fn is_filled(&self) -> bool {
        self.0.value.try_borrow().is_ok_and(|value| value.is_some())
    }

    /// Borrows the value, `None` if it is unfilled or mutably borrowed.
    pub fn borrow(&self) -> Option<Ref<'_, dyn Reflect>> {
        let cell = self.0.value.try_borrow().ok()?;
        Ref::filter_map(cell, |value| value.as_deref()).ok()
    }

    /// Mutably borrows the value, `None` if it is unfilled or already borrowed.
    pub fn borrow_mut(&self) -> Option<RefMut<'_, dyn Reflect>> {
        let cell = self.0.value.try_borrow_mut().ok()?;
        RefMut::filter_map(cell, |value| value.as_deref_mut()).ok()
    }

    /// Returns a typed view if the object's type is assignable to `T`.
    pub fn downcast<T: Typed + ?Sized>(&self) -> Option<Obj<T>> {
        Obj::from_object(self.clone())
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({} @ {:#x})", self.type_info().type_path(), self.address())
    }
}

// -----------------------------------------------------------------------------
// Obj

/// A typed handle to a shared object whose runtime type is assignable to `T`.
///
/// `T` is either the concrete type of the object or an interface marker
/// (see [`impl_interface!`](crate::impl_interface)). Reference fields are
/// written as `Option<Obj<T>>`, `None` being null.
pub struct Obj<T: ?Sized> {
    object: ObjectRef,
    marker: PhantomData<fn() -> *const T>,
}

impl<T: Typed> Obj<T> {
    /// Moves `value` into a new shared object.
    pub fn new(value: T) -> Self {
        Self {
            object: ObjectRef::from_value(value),
            marker: PhantomData,
        }
    }

    /// Borrows the value.
    ///
    /// # Panics
    ///
    /// Panics if the object is mutably borrowed or still being deserialized.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.try_borrow().unwrap_or_else(|| {
            panic!("object of type `{}` is mutably borrowed or unfilled", T::type_path())
        })
    }

    /// Mutably borrows the value.
    ///
    /// # Panics
    ///
    /// Panics if the object is already borrowed or still being deserialized.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.try_borrow_mut().unwrap_or_else(|| {
            panic!("object of type `{}` is already borrowed or unfilled", T::type_path())
        })
    }

    pub fn try_borrow(&self) -> Option<Ref<'_, T>> {
        let value = self.object.borrow()?;
        Ref::filter_map(value, |value| value.downcast_ref::<T>()).ok()
    }

    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, T>> {
        let value = self.object.borrow_mut()?;
        RefMut::filter_map(value, |value| value.downcast_mut::<T>()).ok()
    }
}

impl<T: Typed + ?Sized> Obj<T> {
    /// Creates a typed view, `None` if the object's type is not assignable to `T`.
    pub fn from_object(object: ObjectRef) -> Option<Self> {
        if object.type_info().is_assignable_to(T::type_info()) {
            Some(Self {
                object,
                marker: PhantomData,
            })
        } else {
            None
        }
    }

    #[inline]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    #[inline]
    pub fn into_object(self) -> ObjectRef {
        self.object
    }

    /// The runtime type of the object.
    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        self.object.type_info()
    }

    /// Views the same object as `U`, `None` if its type is not assignable to `U`.
    pub fn cast<U: Typed + ?Sized>(&self) -> Option<Obj<U>> {
        Obj::from_object(self.object.clone())
    }

    /// Returns `true` if both handles refer to the same object.
    #[inline]
    pub fn ptr_eq<U: ?Sized>(&self, other: &Obj<U>) -> bool {
        self.object.ptr_eq(&other.object)
    }
}

impl<T: ?Sized> Clone for Obj<T> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Obj<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Obj({} @ {:#x})", self.object.type_info().type_path(), self.object.address())
    }
}

impl<T: ?Sized> From<Obj<T>> for ObjectRef {
    #[inline]
    fn from(value: Obj<T>) -> Self {
        value.object
    }
}
