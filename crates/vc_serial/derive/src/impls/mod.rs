//! Code generation, one module per generated item.

// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod formatter;
mod kinds;
mod trait_get_type_meta;
mod trait_serial;
mod trait_type_path;
mod trait_typed;

// -----------------------------------------------------------------------------
// Internal API

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, WherePredicate, parse_quote};

use crate::derive_data::{SerialDerive, SerialMeta};

/// Generates every implementation of `#[derive(Serial)]`.
pub(crate) fn match_serial_impls(ast: DeriveInput) -> proc_macro::TokenStream {
    let derive = match SerialDerive::from_input(&ast) {
        Ok(derive) => derive,
        Err(err) => return err.into_compile_error().into(),
    };

    let (meta, kind, extra, serializer, formatter) = match &derive {
        SerialDerive::Struct(data) => (
            &data.meta,
            kinds::struct_kind(data),
            formatter::with_generated_formatter(data),
            TokenStream::new(),
            formatter::impl_struct_formatter(data),
        ),
        SerialDerive::Enum(data) => (
            &data.meta,
            kinds::enum_kind(data),
            TokenStream::new(),
            trait_serial::create_enum_serializer(&data.meta),
            TokenStream::new(),
        ),
        SerialDerive::Opaque(meta) => (
            meta,
            kinds::opaque_kind(meta),
            TokenStream::new(),
            TokenStream::new(),
            TokenStream::new(),
        ),
    };

    let type_path_impl = trait_type_path::impl_trait_type_path(meta);
    let typed_impl = trait_typed::impl_trait_typed(meta, kind, extra);
    let serial_impl = trait_serial::impl_trait_serial(meta, serializer);
    let get_type_meta_impl = trait_get_type_meta::impl_trait_get_type_meta(meta);
    let auto_register = auto_register::get_auto_register_impl(meta);

    quote! {
        const _: () = {
            #type_path_impl

            #typed_impl

            #serial_impl

            #get_type_meta_impl

            #formatter

            #auto_register
        };
    }
    .into()
}

/// Where predicates shared by every impl except `TypePath`.
///
/// Type traits requested by attributes need the derived type to implement
/// the matching user trait, which for generic types depends on the
/// parameters.
fn type_trait_predicates(meta: &SerialMeta) -> Vec<WherePredicate> {
    let vc_serial_path = meta.vc_serial_path();
    let self_ty = meta.self_ty();
    let mut predicates = Vec::new();
    if meta.attrs().serde.is_some() {
        predicates.push(parse_quote! {
            #self_ty: #vc_serial_path::__macro_exports::serde::Serialize
                + #vc_serial_path::__macro_exports::serde::de::DeserializeOwned
        });
    }
    if meta.attrs().self_formatted.is_some() {
        predicates.push(parse_quote! {
            #self_ty: #vc_serial_path::formatter::SelfFormatted
        });
    }
    predicates
}

/// Splits the generics for every impl except `TypePath`.
fn split_serial_generics(meta: &SerialMeta) -> (TokenStream, TokenStream, TokenStream) {
    let serial_ = crate::path::serial_(meta.vc_serial_path());
    meta.split_generics(&serial_, &type_trait_predicates(meta))
}
