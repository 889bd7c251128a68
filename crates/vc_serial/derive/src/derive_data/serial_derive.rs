use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Ident, Index, LitStr, Member, Type, Visibility};

use super::{FieldAttributes, FieldMarker, SerialMeta, TypeAttributes};

// -----------------------------------------------------------------------------
// SerialDerive

/// The parsed derive input, by shape.
pub(crate) enum SerialDerive<'a> {
    /// Named, tuple and unit structs.
    Struct(SerialStruct<'a>),
    /// Field-less enums.
    Enum(SerialEnum<'a>),
    /// Anything marked `#[serial(opaque)]`.
    Opaque(SerialMeta<'a>),
}

impl<'a> SerialDerive<'a> {
    pub(crate) fn from_input(input: &'a DeriveInput) -> syn::Result<Self> {
        let attrs = TypeAttributes::parse_attrs(&input.attrs)?;
        let opaque = attrs.opaque.is_some();
        let meta = SerialMeta::new(attrs, &input.ident, &input.generics)?;

        if opaque {
            return Ok(Self::Opaque(meta));
        }

        match &input.data {
            Data::Struct(data) => {
                let fields = SerialField::parse_fields(&data.fields)?;
                Ok(Self::Struct(SerialStruct { meta, fields }))
            }
            Data::Enum(data) => {
                if meta.impl_with_generic() {
                    return Err(syn::Error::new(
                        input.generics.span(),
                        "`Serial` enums cannot be generic",
                    ));
                }
                if data.variants.is_empty() {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "`Serial` enums need at least one variant",
                    ));
                }
                let mut variants = Vec::with_capacity(data.variants.len());
                for variant in &data.variants {
                    if !matches!(variant.fields, Fields::Unit) {
                        return Err(syn::Error::new(
                            variant.span(),
                            "`Serial` supports field-less enums only, mark the type \
                             `#[serial(opaque)]` and serialize it through `serde` instead",
                        ));
                    }
                    variants.push(&variant.ident);
                }
                Ok(Self::Enum(SerialEnum { meta, variants }))
            }
            Data::Union(data) => Err(syn::Error::new(
                data.union_token.span(),
                "`Serial` cannot be derived for unions, mark the type `#[serial(opaque)]`",
            )),
        }
    }
}

// -----------------------------------------------------------------------------
// SerialStruct

pub(crate) struct SerialStruct<'a> {
    pub meta: SerialMeta<'a>,
    pub fields: Vec<SerialField<'a>>,
}

/// A member of a derived struct.
pub(crate) struct SerialField<'a> {
    /// `self.#member`
    pub member: Member,
    /// The written name: the ident, the tuple index or the `rename`.
    pub name: LitStr,
    pub ty: &'a Type,
    pub public: bool,
    pub marker: FieldMarker,
}

impl<'a> SerialField<'a> {
    fn parse_fields(fields: &'a Fields) -> syn::Result<Vec<Self>> {
        let mut res = Vec::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            let attrs = FieldAttributes::parse_attrs(&field.attrs)?;
            let member = match &field.ident {
                Some(ident) => Member::Named(ident.clone()),
                None => Member::Unnamed(Index::from(index)),
            };
            let name = match attrs.rename {
                Some(rename) => rename,
                None => match &field.ident {
                    Some(ident) => LitStr::new(&ident.unraw().to_string(), ident.span()),
                    None => LitStr::new(&index.to_string(), field.ty.span()),
                },
            };
            res.push(Self {
                member,
                name,
                ty: &field.ty,
                public: matches!(field.vis, Visibility::Public(_)),
                marker: attrs.marker,
            });
        }

        for (index, field) in res.iter().enumerate() {
            let name = field.name.value();
            if res[..index].iter().any(|other| other.name.value() == name) {
                return Err(syn::Error::new(
                    field.name.span(),
                    format!("duplicate member name `{name}`"),
                ));
            }
        }
        Ok(res)
    }

    /// The span of the member type, for error reporting.
    pub fn span(&self) -> proc_macro2::Span {
        self.ty.span()
    }
}

// -----------------------------------------------------------------------------
// SerialEnum

pub(crate) struct SerialEnum<'a> {
    pub meta: SerialMeta<'a>,
    pub variants: Vec<&'a Ident>,
}
