#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod cache;
mod error;
mod exec;
mod mapper;
mod rules;

pub mod config;
pub mod member;
pub mod plan;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use error::{BoxError, ConfigurationError, ExecutionCause, MappingError, MappingExecutionError};
pub use mapper::{Mapper, MappingRequest, TypedMappingRequest};
pub use rules::RuleSet;
