use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::SerialMeta;

fn static_path_cell(meta: &SerialMeta, generator: TokenStream) -> TokenStream {
    let path_cell_ = crate::path::generic_type_path_cell_(meta.vc_serial_path());

    quote! {
        static CELL: #path_cell_ = #path_cell_::new();
        CELL.get_or_insert::<Self>(|| {
            #generator
        })
    }
}

/// Generate implementation codes for `TypePath`.
///
/// Generic types append their arguments, `my_crate::Foo<i32, alloc::string::String>`,
/// and cache the result per instantiation.
pub(crate) fn impl_trait_type_path(meta: &SerialMeta) -> TokenStream {
    let vc_serial_path = meta.vc_serial_path();
    let type_path_ = crate::path::type_path_(vc_serial_path);
    let concat_ = crate::path::concat_(vc_serial_path);

    let base_path = meta.type_path_base();
    let base_name = meta.type_name_base();

    let (type_path, type_name, inline_flag) = if meta.impl_with_generic() {
        let params: Vec<_> = meta.type_params().collect();
        (
            static_path_cell(
                meta,
                quote! {
                    let args = [#(<#params as #type_path_>::type_path()),*].join(", ");
                    #concat_(&[#base_path, "<", &args, ">"])
                },
            ),
            static_path_cell(
                meta,
                quote! {
                    let args = [#(<#params as #type_path_>::type_name()),*].join(", ");
                    #concat_(&[#base_name, "<", &args, ">"])
                },
            ),
            TokenStream::new(),
        )
    } else {
        (base_path, quote! { #base_name }, quote! { #[inline] })
    };

    let module_path = match meta.module_path() {
        Some(module_path) => quote! { ::core::option::Option::Some(#module_path) },
        None => quote! { ::core::option::Option::None },
    };

    let self_ty = meta.self_ty();
    let (impl_generics, _, where_clause) = meta.split_generics(&type_path_, &[]);

    quote! {
        impl #impl_generics #type_path_ for #self_ty #where_clause {
            #inline_flag
            fn type_path() -> &'static str {
                #type_path
            }

            #inline_flag
            fn type_name() -> &'static str {
                #type_name
            }

            #[inline]
            fn module_path() -> ::core::option::Option<&'static str> {
                #module_path
            }
        }
    }
}
