//! Plan execution.
//!
//! Plans are evaluated by walking their node trees. All state of one
//! mapping call lives in an [`ExecutionContext`]: the identity map of the
//! objects mapped so far and the locals of the running plans.

// -----------------------------------------------------------------------------
// Modules

mod context;
mod evaluator;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use context::ExecutionContext;

#[cfg(test)]
mod scenarios;
