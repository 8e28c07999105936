use proc_macro2::TokenStream;
use syn::DeriveInput;

use crate::attributes::TypeAttributes;

/// Generate `auto_register` implementation
#[cfg(feature = "auto_register")]
pub(crate) fn get_auto_register_impl(
    ast: &DeriveInput,
    attrs: &TypeAttributes,
    vc_schema_path: &syn::Path,
) -> TokenStream {
    use quote::quote_spanned;

    let Some(span) = attrs.auto_register else {
        return TokenStream::new();
    };

    let auto_register_ = crate::path::auto_register_(vc_schema_path);
    let mappable_ = crate::path::mappable_(vc_schema_path);
    let ident = &ast.ident;

    quote_spanned! { span =>
        #auto_register_::inventory::submit!{
            #auto_register_::AutoRegisterFunc(
                <#ident as #mappable_>::register
            )
        }
    }
}

/// Generate `auto_register` implementation
#[cfg(not(feature = "auto_register"))]
pub(crate) fn get_auto_register_impl(
    _: &DeriveInput,
    _: &TypeAttributes,
    _: &syn::Path,
) -> TokenStream {
    TokenStream::new()
}
