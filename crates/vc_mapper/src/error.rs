use core::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;
use vc_schema::SchemaError;

/// The error type returned by user supplied functions and callbacks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// -----------------------------------------------------------------------------
// ConfigurationError

/// An invalid mapping configuration.
///
/// Configuration errors are raised while a plan is compiled, before any
/// data is touched. A plan that fails to compile is never cached, so the
/// same error is reported again on the next attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("conflicting configuration for member `{member}` of `{target_type}`: {reason}")]
    Conflict {
        target_type: Arc<str>,
        member: Arc<str>,
        reason: Arc<str>,
    },

    #[error(
        "a value of type `{value_type}` cannot populate member `{member}` of `{target_type}` (declared as `{member_type}`)"
    )]
    IncompatibleType {
        target_type: Arc<str>,
        member: Arc<str>,
        member_type: Arc<str>,
        value_type: Arc<str>,
    },

    #[error("type `{type_path}` has no member `{member}`")]
    UnknownMember { type_path: Arc<str>, member: Arc<str> },

    #[error("invalid derived type pair `{source_type}` -> `{target_type}`: {reason}")]
    InvalidDerivedPair {
        source_type: Arc<str>,
        target_type: Arc<str>,
        reason: Arc<str>,
    },

    #[error("configured value for `{member}` cannot be reversed: {reason}")]
    NotReversible { member: Arc<str>, reason: Arc<str> },

    #[error("identifier member `{member}` of `{type_path}` cannot be ignored")]
    IgnoredIdentifier { type_path: Arc<str>, member: Arc<str> },

    #[error("constant {value} cannot be converted to `{member_type}` for member `{member}`")]
    UnconvertibleConstant {
        member: Arc<str>,
        member_type: Arc<str>,
        value: Arc<str>,
    },

    #[error("values of type `{source_type}` cannot be mapped to `{target_type}`")]
    Unmappable {
        source_type: Arc<str>,
        target_type: Arc<str>,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// -----------------------------------------------------------------------------
// MappingExecutionError

/// A failure while a compiled plan runs.
///
/// Every mapping boundary (the root mapping, each nested object, each
/// collection element) wraps the failure of its inner work, so the chain
/// returned by [`Error::source`](core::error::Error::source) walks from the
/// outermost mapping down to the failing callback.
#[derive(Debug, Error)]
#[error(
    "mapping `{source_type}` -> `{target_type}` failed at `{}`",
    .member_path.as_deref().unwrap_or("<target>")
)]
pub struct MappingExecutionError {
    source_type: Arc<str>,
    target_type: Arc<str>,
    member_path: Option<Arc<str>>,
    #[source]
    cause: ExecutionCause,
}

impl MappingExecutionError {
    pub(crate) fn new(
        source_type: Arc<str>,
        target_type: Arc<str>,
        member_path: Option<Arc<str>>,
        cause: ExecutionCause,
    ) -> Self {
        Self {
            source_type,
            target_type,
            member_path,
            cause,
        }
    }

    /// Path of the source type of the failing mapping.
    #[inline]
    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    /// Path of the target type of the failing mapping.
    #[inline]
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// The target member being populated, `None` if the failure happened
    /// while creating the target itself.
    #[inline]
    pub fn member_path(&self) -> Option<&str> {
        self.member_path.as_deref()
    }

    #[inline]
    pub fn cause(&self) -> &ExecutionCause {
        &self.cause
    }

    /// Iterates over the wrapped mapping contexts, outermost first.
    pub fn contexts(&self) -> impl Iterator<Item = &Self> {
        core::iter::successors(Some(self), |error| match &error.cause {
            ExecutionCause::Nested(inner) => Some(&**inner),
            _ => None,
        })
    }

    /// Returns the innermost mapping context.
    pub fn innermost(&self) -> &Self {
        self.contexts().last().unwrap_or(self)
    }
}

// -----------------------------------------------------------------------------
// ExecutionCause

/// What went wrong inside one mapping context.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutionCause {
    #[error("a nested mapping failed")]
    Nested(#[source] Box<MappingExecutionError>),

    #[error("a configured function or callback failed")]
    Callback(#[source] BoxError),

    #[error("the plan of a runtime type could not be compiled")]
    Configuration(#[source] ConfigurationError),

    #[error("the target could not be created")]
    Schema(#[source] SchemaError),
}

// -----------------------------------------------------------------------------
// MappingError

/// The error returned by the mapping entry points.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MappingError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Execution(#[from] MappingExecutionError),

    /// Conversion between a Rust value and a [`Value`](vc_schema::Value) failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
