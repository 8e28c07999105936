#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// The derive macro emits `::vc_schema::...` paths, this alias keeps them
// valid inside the crate itself (unit tests and doc tests).
extern crate self as vc_schema;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod mappable;

pub mod hash;
pub mod info;
pub mod registry;
pub mod value;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use error::SchemaError;
pub use mappable::Mappable;
pub use value::Value;
pub use vc_schema_derive as derive;
pub use vc_schema_derive::Mappable;
