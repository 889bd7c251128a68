use proc_macro2::TokenStream;
use quote::quote;

use crate::derive_data::SerialMeta;

/// Generate implementation codes for `Serial`.
///
/// `create_serializer` overrides the default serializer choice, it is empty
/// for structs and opaque types.
pub(crate) fn impl_trait_serial(meta: &SerialMeta, create_serializer: TokenStream) -> TokenStream {
    let serial_ = crate::path::serial_(meta.vc_serial_path());

    let self_ty = meta.self_ty();
    let (impl_generics, _, where_clause) = super::split_serial_generics(meta);

    quote! {
        impl #impl_generics #serial_ for #self_ty #where_clause {
            #create_serializer
        }
    }
}

/// Field-less enums are written as their discriminant.
pub(crate) fn create_enum_serializer(meta: &SerialMeta) -> TokenStream {
    let vc_serial_path = meta.vc_serial_path();
    let exports_ = crate::path::macro_exports_(vc_serial_path);
    let serializer_ = crate::path::serializer_trait_(vc_serial_path);
    let enum_serializer_ = crate::path::enum_serializer_(vc_serial_path);

    quote! {
        fn create_serializer() -> #exports_::Arc<dyn #serializer_<Self>> {
            #exports_::Arc::new(#enum_serializer_::<Self>::new())
        }
    }
}
