//! The `TypeKind` expressions of the derived shapes.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};

use crate::derive_data::{FieldMarker, SerialEnum, SerialMeta, SerialStruct};

/// `TypeKind::Struct(..)` with one `FieldInfo` per declared member.
///
/// Skipped members are kept so indices match the declaration order; the
/// policy never selects them.
pub(crate) fn struct_kind(data: &SerialStruct) -> TokenStream {
    let vc_serial_path = data.meta.vc_serial_path();
    let type_kind_ = crate::path::type_kind_(vc_serial_path);
    let struct_info_ = crate::path::struct_info_(vc_serial_path);
    let field_info_ = crate::path::field_info_(vc_serial_path);
    let field_marker_ = crate::path::field_marker_(vc_serial_path);
    let typed_ = crate::path::typed_(vc_serial_path);
    let reflect_ = crate::path::reflect_(vc_serial_path);
    let generated_ = crate::path::generated_(vc_serial_path);
    let exports_ = crate::path::macro_exports_(vc_serial_path);

    let fields = data.fields.iter().map(|field| {
        let ty = field.ty;
        let name = &field.name;
        let member = &field.member;
        let public = field.public;
        let marker = match field.marker {
            FieldMarker::None => quote! { #field_marker_::None },
            FieldMarker::Serialize => quote! { #field_marker_::Serialize },
            FieldMarker::Skip => quote! { #field_marker_::Skip },
        };
        quote_spanned! { field.span() =>
            #field_info_::new::<#ty>(
                #name,
                |owner| match <dyn #reflect_>::downcast_ref::<Self>(owner) {
                    ::core::option::Option::Some(owner) => &owner.#member,
                    ::core::option::Option::None => {
                        #generated_::owner_mismatch(<Self as #typed_>::type_info())
                    }
                },
                |owner| match <dyn #reflect_>::downcast_mut::<Self>(owner) {
                    ::core::option::Option::Some(owner) => &mut owner.#member,
                    ::core::option::Option::None => {
                        #generated_::owner_mismatch(<Self as #typed_>::type_info())
                    }
                },
            )
            .with_public(#public)
            .with_marker(#marker)
        }
    });

    quote! {
        #type_kind_::Struct(#struct_info_::new(#exports_::Vec::from([#(#fields),*])))
    }
}

/// `TypeKind::Enum(..)` mapping variants to their discriminants.
pub(crate) fn enum_kind(data: &SerialEnum) -> TokenStream {
    let vc_serial_path = data.meta.vc_serial_path();
    let type_kind_ = crate::path::type_kind_(vc_serial_path);
    let enum_info_ = crate::path::enum_info_(vc_serial_path);
    let enum_variant_ = crate::path::enum_variant_(vc_serial_path);
    let reflect_ = crate::path::reflect_(vc_serial_path);
    let exports_ = crate::path::macro_exports_(vc_serial_path);

    let variants = &data.variants;
    let names = variants.iter().map(|variant| variant.to_string());

    quote! {
        #type_kind_::Enum(#enum_info_::new(
            &[#(#enum_variant_ { name: #names, value: Self::#variants as i64 }),*],
            |value| {
                <dyn #reflect_>::downcast_ref::<Self>(value).map(|value| match value {
                    #(Self::#variants => Self::#variants as i64,)*
                })
            },
            |value| {
                #(
                    if value == Self::#variants as i64 {
                        return ::core::option::Option::Some(
                            #exports_::Box::new(Self::#variants) as #exports_::Box<dyn #reflect_>
                        );
                    }
                )*
                ::core::option::Option::None
            },
        ))
    }
}

/// `TypeKind::Opaque`.
pub(crate) fn opaque_kind(meta: &SerialMeta) -> TokenStream {
    let type_kind_ = crate::path::type_kind_(meta.vc_serial_path());
    quote! { #type_kind_::Opaque }
}
