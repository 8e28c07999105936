//! See following macros:
//!
//! - [`Mappable`]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static MAPPABLE_ATTRIBUTE_NAME: &str = "mappable";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Mappable Derivation
///
/// `#[derive(Mappable)]` implements `Mappable` for structs with named fields
/// and for fieldless enums. Unit structs are structs without members.
///
/// Generic types, tuple structs and enums with fields are rejected.
///
/// ## Type Attributes
///
/// ```rust, ignore
/// #[derive(Mappable)]
/// #[mappable(type_path = "crm::Person", abstract_type, auto_register)]
/// struct Person { /* ... */ }
/// ```
///
/// - `type_path = "..."`: the path the type is registered under. Defaults to
///   `concat!(module_path!(), "::", "Ident")`.
/// - `abstract_type`: the registered struct is abstract. Such a type is
///   usually embedded in derived structs through a `base` field.
/// - `auto_register`: submits the type for `TypeRegistry::auto_register`.
///   This attribute is a no-op when the `auto_register` feature is disabled.
///
/// ## Field Attributes
///
/// ```rust, ignore
/// #[derive(Mappable)]
/// struct Customer {
///     #[mappable(base)]
///     person: Person,
///     #[mappable(rename = "Id", readonly)]
///     id: u32,
///     #[mappable(skip)]
///     cache: Vec<u8>,
/// }
/// ```
///
/// - `base`: the field holds the base struct, at most one per struct.
///   Its members become the first members of this struct.
/// - `rename = "..."`: the member name, defaults to the field name.
/// - `readonly`: the member is never assigned by the mapper.
/// - `constructor`: the member is only populated when an instance is created.
/// - `skip`: the field is not a member, it is restored with `Default`.
///
/// `rename` can also be applied to enum variants.
#[proc_macro_derive(Mappable, attributes(mappable))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match impls::impl_mappable(&ast) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}
