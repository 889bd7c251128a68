use crate::Reflect;
use crate::error::SerialResult;
use crate::formatter::SelfFormatted;
use crate::info::Typed;
use crate::registry::FromType;
use crate::stream::{DataReader, DataWriter};

/// Marks a type as formatting itself through [`SelfFormatted`].
///
/// The self formatter locator picks this up and wraps the type in a
/// [`SelfFormatterFormatter`](crate::formatter::SelfFormatterFormatter).
///
/// # Panics
///
/// The stored functions are type specific: passing a value of another type
/// panics.
#[derive(Clone, Copy)]
pub struct TypeTraitSelfFormatter {
    write: fn(&dyn Reflect, &mut dyn DataWriter) -> SerialResult<()>,
    read: fn(&mut dyn Reflect, &mut dyn DataReader) -> SerialResult<()>,
}

impl<T: SelfFormatted + Typed> FromType<T> for TypeTraitSelfFormatter {
    fn from_type() -> Self {
        Self {
            write: |value, writer| match value.downcast_ref::<T>() {
                Some(value) => value.serialize_self(writer),
                None => mismatched(T::type_path(), value),
            },
            read: |value, reader| {
                let value_type = value.reflect_type_info();
                match value.downcast_mut::<T>() {
                    Some(value) => value.deserialize_self(reader),
                    None => panic!(
                        "self formatter of `{}` used for value of type `{value_type}`",
                        T::type_path(),
                    ),
                }
            },
        }
    }
}

fn mismatched(type_path: &str, value: &dyn Reflect) -> ! {
    panic!(
        "self formatter of `{type_path}` used for value of type `{}`",
        value.reflect_type_info(),
    )
}

impl TypeTraitSelfFormatter {
    /// Writes the members of `value`.
    #[inline]
    pub fn write(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        (self.write)(value, writer)
    }

    /// Reads the members of `value` in place.
    #[inline]
    pub fn read(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        (self.read)(value, reader)
    }
}
