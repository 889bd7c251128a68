use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};

use crate::derive_data::SerialMeta;

/// Generate implementation codes for `Typed`.
///
/// `kind` is the `TypeKind` expression, `extra` is appended to the
/// `TypeInfo` builder chain.
pub(crate) fn impl_trait_typed(meta: &SerialMeta, kind: TokenStream, extra: TokenStream) -> TokenStream {
    let vc_serial_path = meta.vc_serial_path();
    let typed_ = crate::path::typed_(vc_serial_path);
    let type_info_ = crate::path::type_info_(vc_serial_path);

    let serializable = meta.attrs().not_serializable.is_none();

    let with_generics = if meta.impl_with_generic() {
        let params = meta.type_params();
        quote! {
            .with_generics(&[#(<#params as #typed_>::type_info),*])
        }
    } else {
        TokenStream::new()
    };

    let with_implements = if meta.attrs().implements.is_empty() {
        TokenStream::new()
    } else {
        let interfaces = &meta.attrs().implements;
        quote! {
            .with_implements(&[#(<#interfaces as #typed_>::type_info),*])
        }
    };

    let with_callbacks = match meta.attrs().callbacks {
        Some(span) => quote_spanned! { span =>
            .with_callbacks::<Self>()
        },
        None => TokenStream::new(),
    };

    let info = quote! {
        #type_info_::new::<Self>(#kind)
            .with_serializable(#serializable)
            #with_generics
            #with_implements
            .with_default::<Self>()
            .with_serializer::<Self>()
            #with_callbacks
            .with_type_meta::<Self>()
            #extra
    };

    let body = if meta.impl_with_generic() {
        let cell_ = crate::path::generic_type_info_cell_(vc_serial_path);
        quote! {
            static CELL: #cell_ = #cell_::new();
            CELL.get_or_insert::<Self>(|| {
                #info
            })
        }
    } else {
        let cell_ = crate::path::non_generic_type_info_cell_(vc_serial_path);
        quote! {
            static CELL: #cell_ = #cell_::new();
            CELL.get_or_init(|| {
                #info
            })
        }
    };

    let self_ty = meta.self_ty();
    let (impl_generics, _, where_clause) = super::split_serial_generics(meta);

    quote! {
        impl #impl_generics #typed_ for #self_ty #where_clause {
            fn type_info() -> &'static #type_info_ {
                #body
            }
        }
    }
}
