//! The specialized formatter of derived structs.
//!
//! Members are read and written through their statically typed serializers.
//! Which members take part is decided when the formatter is created for a
//! policy, see `vc_serial::formatter::generated::select_members`.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};

use crate::derive_data::{FieldMarker, SerialStruct};

const FORMATTER_IDENT: &str = "__SerialFormatter";

fn formatter_ident() -> syn::Ident {
    syn::Ident::new(FORMATTER_IDENT, proc_macro2::Span::call_site())
}

/// Whether a formatter is generated: at least one member may be selected.
pub(crate) fn has_generated_formatter(data: &SerialStruct) -> bool {
    data.fields.iter().any(|field| field.marker != FieldMarker::Skip)
}

/// `.with_generated_formatter(..)` for the `TypeInfo` builder chain.
pub(crate) fn with_generated_formatter(data: &SerialStruct) -> TokenStream {
    if !has_generated_formatter(data) {
        return TokenStream::new();
    }
    let meta = &data.meta;
    let vc_serial_path = meta.vc_serial_path();
    let formatter_ = crate::path::formatter_(vc_serial_path);
    let exports_ = crate::path::macro_exports_(vc_serial_path);
    let formatter_ident = formatter_ident();

    quote! {
        .with_generated_formatter(|policy| -> #exports_::Arc<dyn #formatter_> {
            #exports_::Arc::new(#formatter_ident::<Self>::new(policy))
        })
    }
}

/// Generate the formatter type and its `Formatter` implementation.
pub(crate) fn impl_struct_formatter(data: &SerialStruct) -> TokenStream {
    if !has_generated_formatter(data) {
        return TokenStream::new();
    }
    let meta = &data.meta;
    let vc_serial_path = meta.vc_serial_path();
    let formatter_ = crate::path::formatter_(vc_serial_path);
    let generated_ = crate::path::generated_(vc_serial_path);
    let typed_ = crate::path::typed_(vc_serial_path);
    let type_info_ = crate::path::type_info_(vc_serial_path);
    let reflect_ = crate::path::reflect_(vc_serial_path);
    let serial_result_ = crate::path::serial_result_(vc_serial_path);
    let policy_ = crate::path::serialization_policy_(vc_serial_path);
    let data_writer_ = crate::path::data_writer_(vc_serial_path);
    let data_reader_ = crate::path::data_reader_(vc_serial_path);
    let formatter_ident = formatter_ident();

    let member_len = data.fields.len();

    // Skipped members are never selected, so no code is generated for them.
    let active = data
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.marker != FieldMarker::Skip);

    let write_members = active.clone().map(|(index, field)| {
        let name = &field.name;
        let member = &field.member;
        quote_spanned! { field.span() =>
            if self.members[#index] {
                #generated_::write_member(#name, &__value.#member, writer)?;
            }
        }
    });

    let read_arms = active.map(|(index, field)| {
        let name = &field.name;
        let member = &field.member;
        quote_spanned! { field.span() =>
            #name if self.members[#index] => #generated_::read_member(&mut __value.#member, __reader),
        }
    });

    let self_ty = meta.self_ty();
    let (impl_generics, _, where_clause) = super::split_serial_generics(meta);

    quote! {
        struct #formatter_ident<__T> {
            members: [bool; #member_len],
            marker: ::core::marker::PhantomData<fn() -> __T>,
        }

        impl<__T: #typed_> #formatter_ident<__T> {
            fn new(policy: &#policy_) -> Self {
                Self {
                    members: #generated_::select_members(<__T as #typed_>::type_info(), policy),
                    marker: ::core::marker::PhantomData,
                }
            }
        }

        impl #impl_generics #formatter_ for #formatter_ident<#self_ty> #where_clause {
            fn serialized_type(&self) -> &'static #type_info_ {
                <#self_ty as #typed_>::type_info()
            }

            fn serialize(
                &self,
                value: &dyn #reflect_,
                writer: &mut dyn #data_writer_,
            ) -> #serial_result_<()> {
                let ::core::option::Option::Some(__value) = <dyn #reflect_>::downcast_ref::<#self_ty>(value) else {
                    return #generated_::write_mismatched(self.serialized_type(), value, writer);
                };
                #(#write_members)*
                ::core::result::Result::Ok(())
            }

            fn deserialize(
                &self,
                value: &mut dyn #reflect_,
                reader: &mut dyn #data_reader_,
            ) -> #serial_result_<()> {
                let ty = self.serialized_type();
                match <dyn #reflect_>::downcast_mut::<#self_ty>(value) {
                    ::core::option::Option::Some(__value) => {
                        #generated_::read_members(ty, reader, |__name, __reader| match __name {
                            #(#read_arms)*
                            _ => ::core::result::Result::Ok(false),
                        })
                    }
                    ::core::option::Option::None => #generated_::read_mismatched(ty, value, reader),
                }
            }
        }
    }
}
