//! Compiled mapping plans.
//!
//! A plan is compiled once per [`MapperKey`] and cached by the mapper. It
//! holds, for every target member, the ordered data sources that may
//! populate it, so running a plan never searches members or configuration.
//!
//! ## Menu
//!
//! - [`MapperKey`]: the source type, target type, rule set and [`MemberContext`] of a plan.
//! - [`MappingPlan`]: an immutable compiled plan, shared between threads.
//! - [`PlanDescription`]: a serializable summary returned by [`MappingPlan::describe`].
//! - [`DataSourceKind`], [`PopulationMode`], [`NoteReason`], [`BranchOrigin`]:
//!   the classifications shown in descriptions.

// -----------------------------------------------------------------------------
// Modules

mod compiled;
mod data_source;
mod derived;
mod describe;
mod enumerable;
mod key;
mod resolver;

pub(crate) mod builder;
pub(crate) mod node;

// -----------------------------------------------------------------------------
// Exports

pub use compiled::{BranchOrigin, MappingPlan, NoteReason, PopulationMode};
pub use data_source::DataSourceKind;
pub use describe::{
    BranchDescription, MemberDescription, NoteDescription, PlanDescription, PlanKind, SourceDescription,
};
pub use key::{MapperKey, MemberContext};

pub(crate) use compiled::{MemberPopulation, ObjectPlan, PlanBody, TargetSource};
