use core::fmt;
use std::sync::Arc;

use serde::Serialize;
use vc_schema::info::TypeId;
use vc_schema::registry::TypeRegistry;

use crate::config::{CreationCallback, ErrorCallback, Settings};
use crate::member::QualifiedMember;
use crate::plan::data_source::DataSource;
use crate::plan::node::{ConditionNode, NestedCall, ValueNode};
use crate::plan::{MapperKey, PlanDescription};

// -----------------------------------------------------------------------------
// Populations

/// How a target member receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PopulationMode {
    /// The first matching data source is written to the member.
    Assign,
    /// The member is read-only, its current value is updated in place.
    InPlace,
    /// Every matching data source is written, in order.
    Sequential,
}

#[derive(Clone)]
pub(crate) struct MemberPopulation {
    pub(crate) member: Arc<QualifiedMember>,
    pub(crate) mode: PopulationMode,
    /// Skips the member when it does not hold.
    pub(crate) guard: Option<ConditionNode>,
    pub(crate) sources: Vec<DataSource>,
    /// The chained sources, unused by sequential populations.
    pub(crate) value: ValueNode,
}

/// A value mapped onto the whole target once its members are populated.
#[derive(Clone)]
pub(crate) struct TargetSource {
    pub(crate) condition: Option<ConditionNode>,
    pub(crate) value: ValueNode,
    pub(crate) call: NestedCall,
}

/// Why a target member is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteReason {
    /// No source populates the member, it keeps its default or existing value.
    NoDataSources,
    /// The member cannot be written and has no source to update it in place.
    ReadOnly,
    /// The member is ignored by the configuration.
    Ignored,
}

#[derive(Debug, Clone)]
pub(crate) struct PlanNote {
    pub(crate) member: Arc<str>,
    pub(crate) reason: NoteReason,
}

// -----------------------------------------------------------------------------
// Derived branches

/// Where a derived type branch comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BranchOrigin {
    /// A configured derived type pair.
    Configured,
    /// A subtype of the source paired with a subtype of the target by name.
    SourceSubtype,
    /// A subtype of the existing target.
    TargetSubtype,
}

#[derive(Clone)]
pub(crate) struct DerivedBranch {
    pub(crate) condition: ConditionNode,
    pub(crate) call: NestedCall,
    pub(crate) origin: BranchOrigin,
}

// -----------------------------------------------------------------------------
// PlanBody

#[derive(Clone)]
pub(crate) struct ObjectPlan {
    /// The concrete struct created when there is no existing target.
    pub(crate) target: TypeId,
    /// Tested in order before the members, the first match maps the source instead.
    pub(crate) derived: Vec<DerivedBranch>,
    pub(crate) constructor: Vec<MemberPopulation>,
    pub(crate) members: Vec<MemberPopulation>,
    pub(crate) target_sources: Vec<TargetSource>,
    pub(crate) notes: Vec<PlanNote>,
    pub(crate) locals: usize,
}

#[derive(Clone)]
pub(crate) enum PlanBody {
    Object(ObjectPlan),
    /// An enumerable or dictionary node reading the source root.
    Collection { value: ValueNode, locals: usize },
    /// A simple value converted to the target type.
    Convert(TypeId),
}

impl PlanBody {
    pub(crate) fn locals(&self) -> usize {
        match self {
            Self::Object(object) => object.locals,
            Self::Collection { locals, .. } => *locals,
            Self::Convert(_) => 0,
        }
    }
}

// -----------------------------------------------------------------------------
// MappingPlan

/// A compiled mapping from one type to another.
///
/// Plans are immutable and shared: once published to the cache a plan is
/// invoked concurrently for any number of source instances. Use
/// [`describe`](Self::describe) to inspect what the plan does.
pub struct MappingPlan {
    pub(crate) key: MapperKey,
    pub(crate) source_path: Arc<str>,
    pub(crate) target_path: Arc<str>,
    pub(crate) settings: Settings,
    pub(crate) body: PlanBody,
    pub(crate) before_create: Vec<CreationCallback>,
    pub(crate) after_create: Vec<CreationCallback>,
    pub(crate) on_error: Vec<ErrorCallback>,
    pub(crate) registry: Arc<TypeRegistry>,
}

impl MappingPlan {
    #[inline]
    pub fn key(&self) -> &MapperKey {
        &self.key
    }

    #[inline]
    pub fn source_type(&self) -> &str {
        &self.source_path
    }

    #[inline]
    pub fn target_type(&self) -> &str {
        &self.target_path
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns a serializable summary of the plan.
    pub fn describe(&self) -> PlanDescription {
        PlanDescription::new(self)
    }
}

impl fmt::Debug for MappingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingPlan")
            .field("source", &self.source_path)
            .field("target", &self.target_path)
            .field("rule_set", &self.key.rule_set)
            .field("context", &self.key.context)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for MappingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.describe(), f)
    }
}
