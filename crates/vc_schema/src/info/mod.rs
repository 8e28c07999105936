//! Type descriptors consumed by the mapping engine.
//!
//! ## Menu
//!
//! - [`TypeId`]: A dense id assigned by the [`TypeRegistry`], builtins have fixed ids.
//! - [`Type`]: A `TypeId` together with the full path and the short name of the type.
//! - [`TypeInfo`]: A enum describing a registered type, the inner is one of following:
//!     - [`PrimitiveInfo`]: `bool`, `char`, integers, floats and `String`.
//!     - [`EnumInfo`]: fieldless enums, a list of variant names.
//!     - [`StructInfo`]: named members, an optional base type and an abstract flag.
//!     - [`ListInfo`]: sequences, including the element type.
//!     - [`DictionaryInfo`]: string-keyed maps, including the value type.
//!     - [`OptionalInfo`]: nullable wrapper around another type.
//!     - `Any`: a slot which may hold a value of every type.
//! - [`TypeKind`]: the mapping classification of a type, one of
//!   `Simple`, `Complex`, `Enumerable` and `Dictionary`.
//! - [`MemberInfo`]: a struct member, including its slot, type and [`MemberFlags`].
//!
//! [`TypeRegistry`]: crate::registry::TypeRegistry

// -----------------------------------------------------------------------------
// Modules

mod container_info;
mod member_info;
mod primitive_info;
mod struct_info;
mod type_id;
mod type_info;

// -----------------------------------------------------------------------------
// Exports

pub use container_info::{DictionaryInfo, EnumInfo, ListInfo, OptionalInfo};
pub use member_info::{MemberFlags, MemberInfo};
pub use primitive_info::{PrimitiveInfo, PrimitiveKind};
pub use struct_info::StructInfo;
pub use type_id::{Type, TypeId};
pub use type_info::{TypeInfo, TypeKind};
