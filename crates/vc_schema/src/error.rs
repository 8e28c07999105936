use std::sync::Arc;

use thiserror::Error;

use crate::info::TypeId;

// -----------------------------------------------------------------------------
// Error

/// Errors raised while describing types or moving data between Rust values
/// and [`Value`](crate::Value)s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("type `{0}` is not registered")]
    UnknownPath(Arc<str>),

    #[error("type id {0} is not registered")]
    UnknownType(TypeId),

    #[error("type `{0}` is already registered")]
    AlreadyRegistered(Arc<str>),

    #[error("type `{path}` declares member `{member}` more than once")]
    DuplicateMember { path: Arc<str>, member: Arc<str> },

    #[error("type `{path}` cannot extend `{base}`: base type is not a struct")]
    InvalidBase { path: Arc<str>, base: Arc<str> },

    #[error("type `{0}` is abstract and cannot be instantiated")]
    AbstractType(Arc<str>),

    #[error("type `{path}` has no member named `{member}`")]
    UnknownMember { path: Arc<str>, member: Arc<str> },

    #[error("expected a value of type `{expected}`, found {found}")]
    Mismatch { expected: Arc<str>, found: &'static str },
}
