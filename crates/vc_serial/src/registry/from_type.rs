use crate::info::Typed;

/// Creates a [`TypeTrait`] for a concrete type.
///
/// Used by `#[derive(Serial)]` to fill the trait table of the generated
/// [`TypeMeta`].
///
/// # Example
///
/// ```
/// use vc_serial::registry::{FromType, TypeMeta, TypeTraitSerde};
///
/// let mut meta = TypeMeta::of::<String>();
/// meta.insert_trait::<TypeTraitSerde>(FromType::<String>::from_type());
///
/// assert!(meta.has_trait::<TypeTraitSerde>());
/// ```
///
/// [`TypeTrait`]: crate::registry::TypeTrait
/// [`TypeMeta`]: crate::registry::TypeMeta
pub trait FromType<T: Typed> {
    fn from_type() -> Self;
}
