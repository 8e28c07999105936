//! Parsing of `#[mappable(...)]` attributes.

use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Attribute, LitStr};

use crate::MAPPABLE_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// TypeAttributes

/// Attributes placed on the type.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub type_path: Option<LitStr>,
    pub abstract_type: Option<Span>,
    pub auto_register: Option<Span>,
}

impl TypeAttributes {
    pub(crate) fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in mappable_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("type_path") {
                    let lit: LitStr = meta.value()?.parse()?;
                    if lit.value().trim().is_empty() {
                        return Err(meta.error("`type_path` cannot be empty"));
                    }
                    set_once(&mut result.type_path, lit, &meta)
                } else if meta.path.is_ident("abstract_type") {
                    set_once(&mut result.abstract_type, meta.path.span(), &meta)
                } else if meta.path.is_ident("auto_register") {
                    set_once(&mut result.auto_register, meta.path.span(), &meta)
                } else {
                    Err(meta.error("expected `type_path`, `abstract_type` or `auto_register`"))
                }
            })?;
        }

        Ok(result)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

/// Attributes placed on a field or an enum variant.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub rename: Option<LitStr>,
    pub skip: Option<Span>,
    pub readonly: Option<Span>,
    pub constructor: Option<Span>,
    pub base: Option<Span>,
}

impl FieldAttributes {
    pub(crate) fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in mappable_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                let span = meta.path.span();
                if meta.path.is_ident("rename") {
                    let lit: LitStr = meta.value()?.parse()?;
                    set_once(&mut result.rename, lit, &meta)
                } else if meta.path.is_ident("skip") {
                    set_once(&mut result.skip, span, &meta)
                } else if meta.path.is_ident("readonly") {
                    set_once(&mut result.readonly, span, &meta)
                } else if meta.path.is_ident("constructor") {
                    set_once(&mut result.constructor, span, &meta)
                } else if meta.path.is_ident("base") {
                    set_once(&mut result.base, span, &meta)
                } else {
                    Err(meta.error(
                        "expected `rename`, `skip`, `readonly`, `constructor` or `base`",
                    ))
                }
            })?;
        }

        if let (Some(_), Some(span)) = (result.skip, result.base.or(result.rename.as_ref().map(LitStr::span))) {
            return Err(syn::Error::new(span, "a skipped field cannot be renamed or used as base"));
        }
        if let (Some(span), Some(_)) = (result.base, result.readonly.or(result.constructor)) {
            return Err(syn::Error::new(span, "a base field cannot be `readonly` or `constructor`"));
        }

        Ok(result)
    }

    /// Variants only support `rename`.
    pub(crate) fn validate_variant(&self) -> syn::Result<()> {
        match self.skip.or(self.readonly).or(self.constructor).or(self.base) {
            Some(span) => Err(syn::Error::new(span, "only `rename` is supported on enum variants")),
            None => Ok(()),
        }
    }
}

// -----------------------------------------------------------------------------
// Helpers

fn mappable_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident(MAPPABLE_ATTRIBUTE_NAME))
}

fn set_once<T>(slot: &mut Option<T>, value: T, meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(value);
    Ok(())
}
