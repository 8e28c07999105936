//! Paths of the `vc_schema` items referenced by generated code.

use proc_macro2::TokenStream;
use quote::quote;

/// Gets the access path to the `vc_schema` crate.
///
/// 1. For crates that depend on `vc_schema`, `::vc_schema` is returned.
/// 2. For crates that depend on `vc_mapping`, `::vc_mapping::schema` is returned.
/// 3. For other situations, `::vc_schema` is returned, but this may be incorrect.
///
/// Reading the manifest is relatively expensive, the path is obtained once
/// per derive and passed around.
pub(crate) fn vc_schema() -> syn::Path {
    vc_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("vc_schema"))
}

#[inline(always)]
pub(crate) fn mappable_(vc_schema_path: &syn::Path) -> TokenStream {
    quote! { #vc_schema_path::Mappable }
}

#[inline(always)]
pub(crate) fn struct_members_(vc_schema_path: &syn::Path) -> TokenStream {
    quote! { #vc_schema_path::__macro_exports::StructMembers }
}

#[inline(always)]
pub(crate) fn registry_(vc_schema_path: &syn::Path) -> TokenStream {
    quote! { #vc_schema_path::registry::TypeRegistry }
}

#[inline(always)]
pub(crate) fn type_id_(vc_schema_path: &syn::Path) -> TokenStream {
    quote! { #vc_schema_path::info::TypeId }
}

#[inline(always)]
pub(crate) fn schema_error_(vc_schema_path: &syn::Path) -> TokenStream {
    quote! { #vc_schema_path::SchemaError }
}

#[inline(always)]
pub(crate) fn value_(vc_schema_path: &syn::Path) -> TokenStream {
    quote! { #vc_schema_path::Value }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(vc_schema_path: &syn::Path) -> TokenStream {
    quote! { #vc_schema_path::__macro_exports::auto_register }
}
