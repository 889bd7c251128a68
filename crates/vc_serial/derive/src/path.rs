//! Paths into `vc_serial` used by the generated code.
//!
//! Kept in one place so a change of the `vc_serial` layout only touches
//! this module.

use proc_macro2::TokenStream;
use quote::quote;

// -----------------------------------------------------------------------------
// Crate Path

/// Get the correct access path to the `vc_serial` crate.
///
/// 1. For crates that depend on `vc_serial`, `::vc_serial` is returned.
/// 2. For crates that depend on `vc_graph`, `::vc_graph::serial` is returned.
/// 3. Otherwise `::vc_serial` is returned, which may be incorrect.
///
/// Reading the manifest is relatively expensive, so the path is obtained
/// once per expansion and passed around.
pub(crate) fn vc_serial() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_serial"))
}

// -----------------------------------------------------------------------------
// Items

#[inline(always)]
pub(crate) fn macro_exports_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::__macro_exports }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::__macro_exports::auto_register }
}

#[inline(always)]
pub(crate) fn reflect_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::Reflect }
}

#[inline(always)]
pub(crate) fn serial_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::Serial }
}

#[inline(always)]
pub(crate) fn serial_result_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::error::SerialResult }
}

#[inline(always)]
pub(crate) fn type_path_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::TypePath }
}

#[inline(always)]
pub(crate) fn typed_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::Typed }
}

#[inline(always)]
pub(crate) fn type_info_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::TypeInfo }
}

#[inline(always)]
pub(crate) fn type_kind_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::TypeKind }
}

#[inline(always)]
pub(crate) fn struct_info_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::StructInfo }
}

#[inline(always)]
pub(crate) fn field_info_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::FieldInfo }
}

#[inline(always)]
pub(crate) fn field_marker_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::FieldMarker }
}

#[inline(always)]
pub(crate) fn enum_info_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::EnumInfo }
}

#[inline(always)]
pub(crate) fn enum_variant_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::EnumVariant }
}

#[inline(always)]
pub(crate) fn non_generic_type_info_cell_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::NonGenericTypeInfoCell }
}

#[inline(always)]
pub(crate) fn generic_type_info_cell_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::GenericTypeInfoCell }
}

#[inline(always)]
pub(crate) fn generic_type_path_cell_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::info::GenericTypePathCell }
}

#[inline(always)]
pub(crate) fn concat_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::impls::concat }
}

#[inline(always)]
pub(crate) fn get_type_meta_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::registry::GetTypeMeta }
}

#[inline(always)]
pub(crate) fn type_meta_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::registry::TypeMeta }
}

#[inline(always)]
pub(crate) fn from_type_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::registry::FromType }
}

#[inline(always)]
pub(crate) fn type_trait_serde_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::registry::TypeTraitSerde }
}

#[inline(always)]
pub(crate) fn type_trait_self_formatter_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::registry::TypeTraitSelfFormatter }
}

#[inline(always)]
pub(crate) fn serializer_trait_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::serializer::Serializer }
}

#[inline(always)]
pub(crate) fn enum_serializer_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::serializer::EnumSerializer }
}

#[inline(always)]
pub(crate) fn formatter_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::formatter::Formatter }
}

#[inline(always)]
pub(crate) fn generated_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::formatter::generated }
}

#[inline(always)]
pub(crate) fn serialization_policy_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::context::SerializationPolicy }
}

#[inline(always)]
pub(crate) fn data_writer_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::stream::DataWriter }
}

#[inline(always)]
pub(crate) fn data_reader_(vc_serial_path: &syn::Path) -> TokenStream {
    quote! { #vc_serial_path::stream::DataReader }
}
