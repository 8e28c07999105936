//! Dynamic values moved around by the mapping engine.
//!
//! ## Menu
//!
//! - [`Value`]: A enum of simple values and shared references.
//! - [`ObjectRef`]: A shared, interiorly mutable struct instance.
//! - [`ListRef`]: A shared, interiorly mutable sequence.
//! - [`DictionaryRef`]: A shared, interiorly mutable string-keyed map which
//!   keeps insertion order and supports case-insensitive lookup.
//! - [`EnumValue`]: A variant of a registered fieldless enum.
//! - [`can_convert`] / [`convert`]: static and runtime conversion between simple types.
//!
//! Reference kinds are `Arc` handles, cloning a [`Value`] never copies an
//! object graph. Identity is pointer identity, see [`Value::same`].
//!
//! Graphs with reference cycles are representable. `Arc` cycles are not
//! collected: a cyclic graph lives until one of its links is cleared.

// -----------------------------------------------------------------------------
// Modules

mod convert;
mod dictionary;
mod list;
mod object;
mod value;

// -----------------------------------------------------------------------------
// Exports

pub use convert::{can_convert, convert};
pub use dictionary::DictionaryRef;
pub use list::ListRef;
pub use object::ObjectRef;
pub use value::{EnumValue, Value};
