use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataEnum, DeriveInput, Fields};

use crate::attributes::{FieldAttributes, TypeAttributes};

pub(crate) fn impl_enum(
    ast: &DeriveInput,
    attrs: &TypeAttributes,
    data: &DataEnum,
    vc_schema_path: &syn::Path,
) -> syn::Result<TokenStream> {
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.ident,
            "`Mappable` requires at least one variant",
        ));
    }

    let mappable_ = crate::path::mappable_(vc_schema_path);
    let registry_ = crate::path::registry_(vc_schema_path);
    let type_id_ = crate::path::type_id_(vc_schema_path);
    let schema_error_ = crate::path::schema_error_(vc_schema_path);
    let value_ = crate::path::value_(vc_schema_path);

    let ident = &ast.ident;
    let type_path = super::type_path_expr(ast, attrs);

    let mut names: Vec<String> = Vec::new();
    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                &variant.fields,
                "`Mappable` enums cannot have fields",
            ));
        }
        let variant_attrs = FieldAttributes::parse_attrs(&variant.attrs)?;
        variant_attrs.validate_variant()?;
        names.push(match &variant_attrs.rename {
            Some(lit) => lit.value(),
            None => variant.ident.to_string(),
        });
        variants.push(&variant.ident);
    }

    let indices: Vec<u32> = (0..variants.len() as u32).collect();

    Ok(quote! {
        impl #mappable_ for #ident {
            fn register(registry: &mut #registry_) -> ::core::result::Result<#type_id_, #schema_error_> {
                let path: &'static str = #type_path;
                if let ::core::option::Option::Some(id) = registry.id_of(path) {
                    return ::core::result::Result::Ok(id);
                }
                registry.register_enum(path, [#(#names),*])
            }

            fn type_id(registry: &#registry_) -> ::core::result::Result<#type_id_, #schema_error_> {
                let path: &'static str = #type_path;
                registry
                    .id_of(path)
                    .ok_or_else(|| #schema_error_::UnknownPath(path.into()))
            }

            fn to_value(&self, registry: &#registry_) -> ::core::result::Result<#value_, #schema_error_> {
                let ty = <Self as #mappable_>::type_id(registry)?;
                let index: u32 = match self {
                    #(Self::#variants => #indices,)*
                };
                ::core::result::Result::Ok(#value_::Enum(#vc_schema_path::value::EnumValue { ty, index }))
            }

            fn from_value(value: &#value_) -> ::core::result::Result<Self, #schema_error_> {
                const NAMES: &[&str] = &[#(#names),*];
                let index = match value {
                    #value_::Enum(enum_value) => ::core::option::Option::Some(enum_value.index),
                    #value_::String(text) => NAMES
                        .iter()
                        .position(|name| name.eq_ignore_ascii_case(text))
                        .map(|index| index as u32),
                    _ => ::core::option::Option::None,
                };
                match index {
                    #(::core::option::Option::Some(#indices) => ::core::result::Result::Ok(Self::#variants),)*
                    _ => ::core::result::Result::Err(
                        #vc_schema_path::__macro_exports::mismatch(#type_path, value),
                    ),
                }
            }
        }
    })
}
