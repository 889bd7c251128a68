use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::Reflect;
use crate::info::{TypeInfo, Typed};

#[derive(Clone, Copy)]
struct Conversion {
    target: fn() -> &'static TypeInfo,
    convert: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, Box<dyn Reflect>>,
}

/// Conversions from the registered type into other types.
///
/// Consulted when a stored value's type does not fit the slot it is read
/// into. Registered with
/// [`TypeRegistry::register_conversion`](crate::registry::TypeRegistry::register_conversion).
///
/// # Example
///
/// ```
/// use vc_serial::info::Typed;
/// use vc_serial::registry::TypeTraitConvert;
///
/// let mut convert = TypeTraitConvert::default();
/// convert.add::<u8, u32>();
///
/// assert!(convert.can_convert_to(u32::type_info()));
/// let value = convert.convert(Box::new(7_u8), u32::type_info()).ok().unwrap();
/// assert_eq!(value.take::<u32>().ok(), Some(7));
/// ```
#[derive(Clone, Default)]
pub struct TypeTraitConvert {
    conversions: Vec<Conversion>,
}

impl TypeTraitConvert {
    /// Adds the conversion `S -> E` through `E: From<S>`.
    ///
    /// A previous conversion into `E` is replaced.
    pub fn add<S: Typed, E: Typed + From<S>>(&mut self) {
        let conversion = Conversion {
            target: E::type_info,
            convert: |value| {
                let value = value.take::<S>()?;
                Ok(Box::new(E::from(value)) as Box<dyn Reflect>)
            },
        };
        let target = E::type_info();
        match self.conversions.iter_mut().find(|c| (c.target)() == target) {
            Some(existing) => *existing = conversion,
            None => self.conversions.push(conversion),
        }
    }

    /// Returns `true` if a conversion yields a type assignable to `target`.
    pub fn can_convert_to(&self, target: &TypeInfo) -> bool {
        self.conversions
            .iter()
            .any(|c| (c.target)().is_assignable_to(target))
    }

    /// Returns the first conversion target assignable to `target`.
    pub fn target_for(&self, target: &TypeInfo) -> Option<&'static TypeInfo> {
        self.targets().find(|ty| ty.is_assignable_to(target))
    }

    /// Converts `value` into the first conversion target assignable to
    /// `target`, handing `value` back if there is none.
    pub fn convert(
        &self,
        value: Box<dyn Reflect>,
        target: &TypeInfo,
    ) -> Result<Box<dyn Reflect>, Box<dyn Reflect>> {
        match self
            .conversions
            .iter()
            .find(|c| (c.target)().is_assignable_to(target))
        {
            Some(conversion) => (conversion.convert)(value),
            None => Err(value),
        }
    }

    /// The target types of all conversions.
    pub fn targets(&self) -> impl Iterator<Item = &'static TypeInfo> + '_ {
        self.conversions.iter().map(|c| (c.target)())
    }
}
