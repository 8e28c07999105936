//! The member model: navigable, classified members of registered types.
//!
//! ## Menu
//!
//! - [`QualifiedMember`]: a member reachable from a root object, with its
//!   dotted path, declared type, classification and access flags.
//! - [`MemberModel`]: enumerates the members of a type (targets) and the
//!   readable member paths below a type (sources), cached per type.

// -----------------------------------------------------------------------------
// Modules

mod model;
mod qualified;

// -----------------------------------------------------------------------------
// Exports

pub use model::{MAX_PATH_DEPTH, MemberModel, Members};
pub use qualified::QualifiedMember;
