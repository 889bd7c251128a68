use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use serde::{Deserialize, Serialize};

use crate::info::PrimitiveKind;

// -----------------------------------------------------------------------------
// PrimitiveArray

macro_rules! define_primitive_array {
    ($( $variant:ident($ty:ty), )*) => {
        /// A bulk array of primitive elements, written as one entry.
        ///
        /// `isize` and `usize` elements travel as `I64` and `U64`.
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        pub enum PrimitiveArray {
            $( $variant(Vec<$ty>), )*
        }

        impl PrimitiveArray {
            /// The element kind of the array.
            pub fn element_kind(&self) -> PrimitiveKind {
                match self {
                    $( Self::$variant(_) => PrimitiveKind::$variant, )*
                }
            }

            pub fn len(&self) -> usize {
                match self {
                    $( Self::$variant(items) => items.len(), )*
                }
            }

            /// Copies a primitive slice, `None` if `T` is not an array element type.
            pub fn from_slice<T: Any + Copy>(items: &[T]) -> Option<Self> {
                Self::from_vec(&items.to_vec())
            }

            /// Copies a `Vec` of elements, `None` if `items` is not a `Vec`
            /// of an array element type.
            pub fn from_vec(items: &dyn Any) -> Option<Self> {
                let any = items;
                $(
                    if let Some(items) = any.downcast_ref::<Vec<$ty>>() {
                        return Some(Self::$variant(items.clone()));
                    }
                )*
                if let Some(items) = any.downcast_ref::<Vec<isize>>() {
                    return Some(Self::I64(items.iter().map(|&v| v as i64).collect()));
                }
                if let Some(items) = any.downcast_ref::<Vec<usize>>() {
                    return Some(Self::U64(items.iter().map(|&v| v as u64).collect()));
                }
                None
            }

            fn into_any(self) -> Box<dyn Any> {
                match self {
                    $( Self::$variant(items) => Box::new(items), )*
                }
            }
        }
    };
}

define_primitive_array! {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl PrimitiveArray {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Moves the elements out as `Vec<T>`.
    ///
    /// Returns `None` if the element kind does not match `T`, or if a
    /// 64-bit element does not fit a platform-width `T`.
    pub fn into_vec<T: Any>(self) -> Option<Vec<T>> {
        let target = TypeId::of::<T>();
        let any = if target == TypeId::of::<isize>() {
            let Self::I64(items) = self else { return None };
            let items: Vec<isize> = items
                .into_iter()
                .map(|v| isize::try_from(v).ok())
                .collect::<Option<_>>()?;
            Box::new(items) as Box<dyn Any>
        } else if target == TypeId::of::<usize>() {
            let Self::U64(items) = self else { return None };
            let items: Vec<usize> = items
                .into_iter()
                .map(|v| usize::try_from(v).ok())
                .collect::<Option<_>>()?;
            Box::new(items) as Box<dyn Any>
        } else {
            self.into_any()
        };
        any.downcast::<Vec<T>>().ok().map(|items| *items)
    }
}

#[cfg(test)]
mod tests {
    use super::PrimitiveArray;
    use crate::info::PrimitiveKind;

    #[test]
    fn platform_width_elements_use_64_bits() {
        let array = PrimitiveArray::from_slice(&[1_usize, 2, 3]).unwrap();
        assert_eq!(array, PrimitiveArray::U64(vec![1, 2, 3]));
        assert_eq!(array.element_kind(), PrimitiveKind::U64);
        assert_eq!(array.into_vec::<usize>(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn mismatched_element_type_is_rejected() {
        let array = PrimitiveArray::from_slice(&[1.5_f32]).unwrap();
        assert_eq!(array.clone().into_vec::<f64>(), None);
        assert_eq!(array.into_vec::<f32>(), Some(vec![1.5]));
        assert!(PrimitiveArray::from_slice(&[()]).is_none());
    }
}
