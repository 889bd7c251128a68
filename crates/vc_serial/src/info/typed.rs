use crate::info::{TypeInfo, TypePath};

// -----------------------------------------------------------------------------
// Typed

/// Static access to a type's [`TypeInfo`].
///
/// Usually implemented by `#[derive(Serial)]`. Manual implementations keep
/// the info in a [`NonGenericTypeInfoCell`] or, for generic types, a
/// [`GenericTypeInfoCell`]:
///
/// ```
/// use vc_serial::info::{NonGenericTypeInfoCell, TypeInfo, TypeKind, TypePath, Typed};
///
/// struct Marker;
///
/// impl TypePath for Marker {
///     fn type_path() -> &'static str { "demo::Marker" }
///     fn type_name() -> &'static str { "Marker" }
/// }
///
/// impl Typed for Marker {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
///         CELL.get_or_init(|| TypeInfo::new::<Self>(TypeKind::Opaque))
///     }
/// }
///
/// assert_eq!(Marker::type_info().type_path(), "demo::Marker");
/// ```
///
/// Type infos must not call `type_info` of other types while they are being
/// built; references to other types are stored as `fn() -> &'static TypeInfo`
/// so recursive types can describe themselves.
///
/// [`NonGenericTypeInfoCell`]: crate::info::NonGenericTypeInfoCell
/// [`GenericTypeInfoCell`]: crate::info::GenericTypeInfoCell
pub trait Typed: TypePath {
    /// Returns the compile-time info for the underlying type.
    fn type_info() -> &'static TypeInfo;
}
