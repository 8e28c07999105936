//! The type registry: where type descriptors are declared and queried.
//!
//! ## Menu
//!
//! - [`TypeRegistry`]: A container of [`TypeInfo`]s indexed by id, path and short name.
//!   It also answers hierarchy questions (`is_subtype_of`, `subtypes_of`, `depth`)
//!   and creates instances.
//! - [`StructBuilder`]: A description of a struct, consumed by
//!   [`TypeRegistry::register_struct`].
//!
//! ## Declaring types
//!
//! Types can be described at runtime with [`StructBuilder`] and
//! [`TypeRegistry::register_enum`], or from Rust types with
//! `#[derive(Mappable)]` and [`Mappable::register`].
//!
//! ## auto_register
//!
//! See [`TypeRegistry::auto_register`].
//!
//! We use [`inventory`] crate to implement static registration, types opt in
//! with `#[mappable(auto_register)]`. Not all platforms support it (although
//! major platforms do), on the others nothing is registered.
//!
//! [`TypeInfo`]: crate::info::TypeInfo
//! [`Mappable::register`]: crate::Mappable::register
//! [`inventory`]: https://docs.rs/inventory

// -----------------------------------------------------------------------------
// Modules

mod struct_builder;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use struct_builder::StructBuilder;
pub use type_registry::TypeRegistry;
