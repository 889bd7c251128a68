use proc_macro2::TokenStream;

use crate::derive_data::SerialMeta;

/// Generate `auto_register` implementation
///
/// Generic types are skipped: which instantiations exist is unknown here.
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(meta: &SerialMeta) -> TokenStream {
    if meta.impl_with_generic() {
        return TokenStream::new();
    }

    let auto_register_ = crate::path::auto_register_(meta.vc_serial_path());
    let ident = meta.ident();

    quote::quote! {
        #auto_register_::inventory::submit!{
            #auto_register_::__AutoRegisterFunc(
                <#ident as #auto_register_::__RegisterType>::__register
            )
        }
    }
}

/// Generate `auto_register` implementation
#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(_: &SerialMeta) -> TokenStream {
    TokenStream::new()
}
