//! Parsing of `#[serial(...)]` attributes.

use proc_macro2::Span;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, LitStr, Token, Type};

use crate::SERIAL_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// TypeAttributes

/// Type level attributes.
///
/// Flags are stored as the span of the attribute that set them, so generated
/// code referring to user traits reports errors at the attribute.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    /// `type_path = "my_crate::Foo"`
    pub type_path: Option<LitStr>,
    /// `implements(dyn Animal, Base)`
    pub implements: Vec<Type>,
    /// `opaque`
    pub opaque: Option<Span>,
    /// `serde`
    pub serde: Option<Span>,
    /// `self_formatted`
    pub self_formatted: Option<Span>,
    /// `callbacks`
    pub callbacks: Option<Span>,
    /// `not_serializable`
    pub not_serializable: Option<Span>,
}

impl TypeAttributes {
    pub(crate) fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut res = Self::default();
        for attr in attrs {
            if attr.path().is_ident(SERIAL_ATTRIBUTE_NAME) {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("type_path") {
                        let lit: LitStr = meta.value()?.parse()?;
                        if lit.value().is_empty() {
                            return Err(syn::Error::new(lit.span(), "`type_path` cannot be empty"));
                        }
                        res.type_path = Some(lit);
                    } else if meta.path.is_ident("implements") {
                        let content;
                        syn::parenthesized!(content in meta.input);
                        let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                        res.implements.extend(types);
                    } else if meta.path.is_ident("opaque") {
                        res.opaque = Some(meta.path.span());
                    } else if meta.path.is_ident("serde") {
                        res.serde = Some(meta.path.span());
                    } else if meta.path.is_ident("self_formatted") {
                        res.self_formatted = Some(meta.path.span());
                    } else if meta.path.is_ident("callbacks") {
                        res.callbacks = Some(meta.path.span());
                    } else if meta.path.is_ident("not_serializable") {
                        res.not_serializable = Some(meta.path.span());
                    } else {
                        return Err(meta.error(
                            "unsupported type attribute, expected one of `type_path`, \
                             `implements`, `opaque`, `serde`, `self_formatted`, `callbacks`, \
                             `not_serializable`",
                        ));
                    }
                    Ok(())
                })?;
            }
        }
        Ok(res)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// The explicit serialization marker of a member.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum FieldMarker {
    #[default]
    None,
    Serialize,
    Skip,
}

/// Field level attributes.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    /// `serialize` or `skip`
    pub marker: FieldMarker,
    /// `rename = "name"`
    pub rename: Option<LitStr>,
}

impl FieldAttributes {
    pub(crate) fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut res = Self::default();
        for attr in attrs {
            if attr.path().is_ident(SERIAL_ATTRIBUTE_NAME) {
                attr.parse_nested_meta(|meta| {
                    let marker = if meta.path.is_ident("serialize") {
                        FieldMarker::Serialize
                    } else if meta.path.is_ident("skip") {
                        FieldMarker::Skip
                    } else if meta.path.is_ident("rename") {
                        let lit: LitStr = meta.value()?.parse()?;
                        if lit.value().is_empty() {
                            return Err(syn::Error::new(lit.span(), "`rename` cannot be empty"));
                        }
                        res.rename = Some(lit);
                        return Ok(());
                    } else {
                        return Err(meta.error(
                            "unsupported field attribute, expected one of `serialize`, `skip`, `rename`",
                        ));
                    };
                    if res.marker != FieldMarker::None && res.marker != marker {
                        return Err(meta.error("`serialize` and `skip` cannot be combined"));
                    }
                    res.marker = marker;
                    Ok(())
                })?;
            }
        }
        Ok(res)
    }
}
