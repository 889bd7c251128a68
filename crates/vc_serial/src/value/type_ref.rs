use core::fmt;

use crate::info::{TypeInfo, Typed};

/// A reflected type value, written by its binder name.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeRef(pub Option<&'static TypeInfo>);

impl TypeRef {
    /// The type value of `T`.
    #[inline]
    pub fn of<T: Typed + ?Sized>() -> Self {
        Self(Some(T::type_info()))
    }

    #[inline]
    pub fn get(&self) -> Option<&'static TypeInfo> {
        self.0
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(info) => write!(f, "TypeRef({})", info.type_path()),
            None => f.write_str("TypeRef(None)"),
        }
    }
}
