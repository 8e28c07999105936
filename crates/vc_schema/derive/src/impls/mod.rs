//! Code generation of `#[derive(Mappable)]`.

// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod enum_impl;
mod struct_impl;

// -----------------------------------------------------------------------------
// Entry

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

use crate::attributes::TypeAttributes;

/// The registered path of the type, as an expression of type `&'static str`.
pub(crate) fn type_path_expr(ast: &DeriveInput, attrs: &TypeAttributes) -> TokenStream {
    match &attrs.type_path {
        Some(lit) => quote! { #lit },
        None => {
            let ident = ast.ident.to_string();
            quote! { ::core::concat!(::core::module_path!(), "::", #ident) }
        }
    }
}

pub(crate) fn impl_mappable(ast: &DeriveInput) -> syn::Result<TokenStream> {
    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            "`Mappable` cannot be derived for generic types",
        ));
    }

    let attrs = TypeAttributes::parse_attrs(&ast.attrs)?;
    let vc_schema_path = crate::path::vc_schema();

    let body = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => {
                struct_impl::impl_struct(ast, &attrs, fields.named.iter(), &vc_schema_path)?
            }
            Fields::Unit => struct_impl::impl_struct(ast, &attrs, std::iter::empty(), &vc_schema_path)?,
            Fields::Unnamed(fields) => {
                return Err(syn::Error::new_spanned(
                    fields,
                    "`Mappable` requires named fields",
                ));
            }
        },
        Data::Enum(data) => {
            if let Some(span) = attrs.abstract_type {
                return Err(syn::Error::new(span, "`abstract_type` is only valid on structs"));
            }
            enum_impl::impl_enum(ast, &attrs, data, &vc_schema_path)?
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &ast.ident,
                "`Mappable` cannot be derived for unions",
            ));
        }
    };

    let auto_register = auto_register::get_auto_register_impl(ast, &attrs, &vc_schema_path);

    Ok(quote! {
        #body
        #auto_register
    })
}
