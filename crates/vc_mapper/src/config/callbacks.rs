use std::sync::Arc;

use crate::config::{MappingArgs, MappingScope};
use crate::{BoxError, MappingExecutionError};

/// Called around the creation of a target object.
pub type CreationCallback = Arc<dyn Fn(&MappingArgs<'_>) -> Result<(), BoxError> + Send + Sync>;

/// Observes mapping failures.
pub type ErrorCallback = Arc<dyn Fn(&MappingArgs<'_>, &MappingExecutionError) + Send + Sync>;

// -----------------------------------------------------------------------------
// Scoped

/// A configuration item restricted to a [`MappingScope`].
#[derive(Clone)]
pub struct Scoped<T> {
    pub scope: MappingScope,
    pub value: T,
}

impl<T> Scoped<T> {
    pub const fn new(scope: MappingScope, value: T) -> Self {
        Self { scope, value }
    }
}
