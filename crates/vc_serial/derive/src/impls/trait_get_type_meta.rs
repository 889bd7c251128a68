use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::Ident;

use crate::derive_data::SerialMeta;

/// Generate implementation code for `GetTypeMeta` trait.
///
/// Types without attribute requested type traits use the default methods.
pub(crate) fn impl_trait_get_type_meta(meta: &SerialMeta) -> TokenStream {
    let vc_serial_path = meta.vc_serial_path();
    let get_type_meta_ = crate::path::get_type_meta_(vc_serial_path);
    let type_meta_ = crate::path::type_meta_(vc_serial_path);
    let from_type_ = crate::path::from_type_(vc_serial_path);

    let outer_ = Ident::new("__outer", Span::call_site());

    let mut inserts = Vec::new();
    if let Some(span) = meta.attrs().serde {
        let type_trait_serde_ = crate::path::type_trait_serde_(vc_serial_path);
        inserts.push(quote_spanned! { span =>
            #type_meta_::insert_trait::<#type_trait_serde_>(&mut #outer_, #from_type_::<Self>::from_type());
        });
    }
    if let Some(span) = meta.attrs().self_formatted {
        let type_trait_self_formatter_ = crate::path::type_trait_self_formatter_(vc_serial_path);
        inserts.push(quote_spanned! { span =>
            #type_meta_::insert_trait::<#type_trait_self_formatter_>(&mut #outer_, #from_type_::<Self>::from_type());
        });
    }

    let self_ty = meta.self_ty();
    let (impl_generics, _, where_clause) = super::split_serial_generics(meta);

    if inserts.is_empty() {
        return quote! {
            impl #impl_generics #get_type_meta_ for #self_ty #where_clause {}
        };
    }

    quote! {
        impl #impl_generics #get_type_meta_ for #self_ty #where_clause {
            fn get_type_meta() -> #type_meta_ {
                let mut #outer_ = #type_meta_::of::<Self>();
                #(#inserts)*
                #outer_
            }
        }
    }
}
