use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{GenericParam, Generics, Ident, Path, WherePredicate, parse_quote};

use super::TypeAttributes;

/// Everything about the derived type that does not depend on its shape.
pub(crate) struct SerialMeta<'a> {
    vc_serial_path: Path,
    attrs: TypeAttributes,
    ident: &'a Ident,
    generics: &'a Generics,
}

impl<'a> SerialMeta<'a> {
    /// Fails on lifetime and const parameters: every serializable type is
    /// `'static` and type paths are built from type parameters only.
    pub fn new(attrs: TypeAttributes, ident: &'a Ident, generics: &'a Generics) -> syn::Result<Self> {
        for param in &generics.params {
            match param {
                GenericParam::Type(_) => {}
                GenericParam::Lifetime(lifetime) => {
                    return Err(syn::Error::new_spanned(
                        lifetime,
                        "`Serial` types cannot have lifetime parameters",
                    ));
                }
                GenericParam::Const(param) => {
                    return Err(syn::Error::new_spanned(
                        param,
                        "`Serial` types cannot have const parameters",
                    ));
                }
            }
        }
        Ok(Self {
            vc_serial_path: crate::path::vc_serial(),
            attrs,
            ident,
            generics,
        })
    }

    #[inline]
    pub fn vc_serial_path(&self) -> &Path {
        &self.vc_serial_path
    }

    #[inline]
    pub fn attrs(&self) -> &TypeAttributes {
        &self.attrs
    }

    #[inline]
    pub fn ident(&self) -> &'a Ident {
        self.ident
    }

    /// Whether the implementations are generic.
    #[inline]
    pub fn impl_with_generic(&self) -> bool {
        !self.generics.params.is_empty()
    }

    /// The type parameters, in declaration order.
    pub fn type_params(&self) -> impl Iterator<Item = &'a Ident> + 'a {
        self.generics.type_params().map(|param| &param.ident)
    }

    /// `Foo<T, U>` as used in `impl ... for #self_ty`.
    pub fn self_ty(&self) -> TokenStream {
        let ident = self.ident;
        let (_, ty_generics, _) = self.generics.split_for_impl();
        quote! { #ident #ty_generics }
    }

    /// Splits the generics for an impl block, bounding every type parameter
    /// by `bound` and adding the `extra` predicates.
    ///
    /// Non generic types get no where clause at all.
    pub fn split_generics(
        &self,
        bound: &TokenStream,
        extra: &[WherePredicate],
    ) -> (TokenStream, TokenStream, TokenStream) {
        let mut generics = self.generics.clone();
        let params: Vec<Ident> = self.type_params().cloned().collect();
        if !params.is_empty() {
            let where_clause = generics.make_where_clause();
            for param in params {
                let predicate: WherePredicate = parse_quote! { #param: #bound };
                where_clause.predicates.push(predicate);
            }
            where_clause.predicates.extend(extra.iter().cloned());
        }
        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
        (
            impl_generics.to_token_stream(),
            ty_generics.to_token_stream(),
            where_clause.to_token_stream(),
        )
    }

    /// The path expression of the type, without generic arguments.
    ///
    /// Either the custom `type_path` or `module_path!()` followed by the ident.
    pub fn type_path_base(&self) -> TokenStream {
        match &self.attrs.type_path {
            Some(lit) => lit.to_token_stream(),
            None => {
                let ident = self.ident.to_string();
                quote! { ::core::concat!(::core::module_path!(), "::", #ident) }
            }
        }
    }

    /// The short name of the type, without generic arguments.
    pub fn type_name_base(&self) -> String {
        match &self.attrs.type_path {
            Some(lit) => {
                let path = lit.value();
                match path.rfind("::") {
                    Some(index) => path[index + 2..].to_owned(),
                    None => path,
                }
            }
            None => self.ident.to_string(),
        }
    }

    /// The module path expression of the type, `None` for a custom path
    /// without module.
    pub fn module_path(&self) -> Option<TokenStream> {
        match &self.attrs.type_path {
            Some(lit) => {
                let path = lit.value();
                let index = path.rfind("::")?;
                let module = syn::LitStr::new(&path[..index], lit.span());
                Some(module.to_token_stream())
            }
            None => Some(quote! { ::core::module_path!() }),
        }
    }
}
