use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Field};

use crate::attributes::{FieldAttributes, TypeAttributes};

enum FieldRole {
    Base,
    Skip,
    Member { name: String, flags: TokenStream },
}

pub(crate) fn impl_struct<'a>(
    ast: &DeriveInput,
    attrs: &TypeAttributes,
    fields: impl Iterator<Item = &'a Field>,
    vc_schema_path: &syn::Path,
) -> syn::Result<TokenStream> {
    let mappable_ = crate::path::mappable_(vc_schema_path);
    let struct_members_ = crate::path::struct_members_(vc_schema_path);
    let registry_ = crate::path::registry_(vc_schema_path);
    let type_id_ = crate::path::type_id_(vc_schema_path);
    let schema_error_ = crate::path::schema_error_(vc_schema_path);
    let value_ = crate::path::value_(vc_schema_path);
    let flags_ = quote! { #vc_schema_path::info::MemberFlags };

    let ident = &ast.ident;
    let type_path = super::type_path_expr(ast, attrs);

    let mut base: Option<&Field> = None;
    let mut roles: Vec<(&Field, FieldRole)> = Vec::new();
    for field in fields {
        let field_attrs = FieldAttributes::parse_attrs(&field.attrs)?;
        let role = if let Some(span) = field_attrs.base {
            if base.is_some() {
                return Err(syn::Error::new(span, "only one field can be marked as `base`"));
            }
            base = Some(field);
            FieldRole::Base
        } else if field_attrs.skip.is_some() {
            FieldRole::Skip
        } else {
            let name = match &field_attrs.rename {
                Some(lit) => lit.value(),
                None => field
                    .ident
                    .as_ref()
                    .map(|ident| ident.to_string().trim_start_matches("r#").to_string())
                    .unwrap_or_default(),
            };
            let flags = if field_attrs.constructor.is_some() {
                quote! { #flags_::READABLE.union(#flags_::CONSTRUCTOR) }
            } else if field_attrs.readonly.is_some() {
                quote! { #flags_::READABLE }
            } else {
                quote! { #flags_::READ_WRITE }
            };
            FieldRole::Member { name, flags }
        };
        roles.push((field, role));
    }

    // -------------------------------------------------------------------------
    // register

    let extends = base.map(|field| {
        let ty = &field.ty;
        quote! { .extends(<#ty as #mappable_>::register(registry)?) }
    });
    let abstract_call = attrs.abstract_type.map(|_| quote! { .abstract_type() });
    let member_calls = roles.iter().filter_map(|(field, role)| match role {
        FieldRole::Member { name, flags } => {
            let ty = &field.ty;
            Some(quote! {
                .member_with_flags(#name, <#ty as #mappable_>::register(registry)?, #flags)
            })
        }
        _ => None,
    });

    // -------------------------------------------------------------------------
    // members

    let writes = roles.iter().map(|(field, role)| {
        let field_ident = &field.ident;
        match role {
            FieldRole::Base => quote! {
                #struct_members_::write_members(&self.#field_ident, registry, object)?;
            },
            FieldRole::Skip => quote! {},
            FieldRole::Member { name, .. } => quote! {
                object.set_member(#name, #mappable_::to_value(&self.#field_ident, registry)?)?;
            },
        }
    });
    let reads = roles.iter().map(|(field, role)| {
        let field_ident = &field.ident;
        let ty = &field.ty;
        match role {
            FieldRole::Base => quote! {
                #field_ident: <#ty as #struct_members_>::read_members(object)?,
            },
            FieldRole::Skip => quote! {
                #field_ident: ::core::default::Default::default(),
            },
            FieldRole::Member { name, .. } => quote! {
                #field_ident: <#ty as #mappable_>::from_value(
                    &object.get_member(#name).unwrap_or_default(),
                )?,
            },
        }
    });

    Ok(quote! {
        impl #mappable_ for #ident {
            fn register(registry: &mut #registry_) -> ::core::result::Result<#type_id_, #schema_error_> {
                let path: &'static str = #type_path;
                if let ::core::option::Option::Some(id) = registry.id_of(path) {
                    return ::core::result::Result::Ok(id);
                }
                registry.reserve(path);
                let builder = #vc_schema_path::registry::StructBuilder::new(path)
                    #extends
                    #abstract_call
                    #(#member_calls)*;
                registry.register_struct(builder)
            }

            fn type_id(registry: &#registry_) -> ::core::result::Result<#type_id_, #schema_error_> {
                let path: &'static str = #type_path;
                registry
                    .id_of(path)
                    .ok_or_else(|| #schema_error_::UnknownPath(path.into()))
            }

            fn to_value(&self, registry: &#registry_) -> ::core::result::Result<#value_, #schema_error_> {
                let id = <Self as #mappable_>::type_id(registry)?;
                let object = registry.instantiate(id)?;
                <Self as #struct_members_>::write_members(self, registry, &object)?;
                ::core::result::Result::Ok(#value_::Object(object))
            }

            fn from_value(value: &#value_) -> ::core::result::Result<Self, #schema_error_> {
                match value {
                    #value_::Object(object) => <Self as #struct_members_>::read_members(object),
                    other => ::core::result::Result::Err(
                        #vc_schema_path::__macro_exports::mismatch(#type_path, other),
                    ),
                }
            }
        }

        impl #struct_members_ for #ident {
            #[allow(unused_variables)]
            fn write_members(
                &self,
                registry: &#registry_,
                object: &#vc_schema_path::value::ObjectRef,
            ) -> ::core::result::Result<(), #schema_error_> {
                #(#writes)*
                ::core::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn read_members(
                object: &#vc_schema_path::value::ObjectRef,
            ) -> ::core::result::Result<Self, #schema_error_> {
                ::core::result::Result::Ok(Self {
                    #(#reads)*
                })
            }
        }
    })
}
