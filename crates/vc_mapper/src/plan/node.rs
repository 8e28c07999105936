//! The plan tree.
//!
//! Plans are trees of value producing nodes walked by the executor. Every
//! node is immutable once compiled: the per call state (locals, the member
//! being populated, the identity map) lives in the executor's frames.

use std::sync::Arc;

use vc_schema::Value;
use vc_schema::info::TypeId;

use crate::RuleSet;
use crate::config::{ConditionFn, ValueFn};
use crate::member::QualifiedMember;
use crate::plan::MemberContext;

// -----------------------------------------------------------------------------
// NestedCall

/// A call into another plan.
#[derive(Debug, Clone)]
pub(crate) struct NestedCall {
    /// The declared source type, `None` when the plan is chosen by the
    /// runtime type of each source value.
    pub(crate) source: Option<TypeId>,
    pub(crate) target: TypeId,
    pub(crate) rule_set: RuleSet,
    pub(crate) context: MemberContext,
}

// -----------------------------------------------------------------------------
// ValueNode

#[derive(Clone)]
pub(crate) enum ValueNode {
    /// The source object of the running plan.
    SourceRoot,
    /// The target object of the running plan, `Null` before it is created.
    TargetRoot,
    /// The current value of the member being populated.
    Existing,
    Local(usize),
    Constant(Value),
    Default(TypeId),
    EmptyCollection(TypeId),
    /// A member path read from the source object.
    Member(Arc<QualifiedMember>),
    /// The first present entry of the source dictionary among the keys.
    Entry(Arc<[Arc<str>]>),
    /// The successively indexed entries `key[0]`, `key[1]`, .. of the
    /// source dictionary, collected into a list.
    Elements(Arc<str>),
    Function(ValueFn),
    Convert {
        value: Box<ValueNode>,
        to: TypeId,
    },
    /// Maps a value through another plan, onto the existing member value
    /// when `onto_existing` is set.
    Nested {
        value: Box<ValueNode>,
        call: NestedCall,
        onto_existing: bool,
    },
    Enumerable(Box<EnumerableNode>),
    Dictionary(Box<DictionaryNode>),
    /// The simple member paths of a source object as dictionary entries.
    Flattened(Box<FlattenedNode>),
    Let {
        index: usize,
        value: Box<ValueNode>,
        body: Box<ValueNode>,
    },
    Conditional {
        condition: Box<ConditionNode>,
        then: Box<ValueNode>,
        otherwise: Box<ValueNode>,
    },
}

impl ValueNode {
    pub(crate) fn convert(value: Self, to: TypeId) -> Self {
        Self::Convert {
            value: Box::new(value),
            to,
        }
    }

    pub(crate) fn nested(value: Self, call: NestedCall, onto_existing: bool) -> Self {
        Self::Nested {
            value: Box::new(value),
            call,
            onto_existing,
        }
    }

    pub(crate) fn conditional(condition: ConditionNode, then: Self, otherwise: Self) -> Self {
        Self::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub(crate) fn bind(index: usize, value: Self, body: Self) -> Self {
        Self::Let {
            index,
            value: Box::new(value),
            body: Box::new(body),
        }
    }

    /// Returns `true` for the empty collection fallbacks.
    pub(crate) fn creates_collection(&self) -> bool {
        match self {
            Self::EmptyCollection(_) => true,
            Self::Conditional { otherwise, .. } => otherwise.creates_collection(),
            _ => false,
        }
    }
}

// -----------------------------------------------------------------------------
// ConditionNode

#[derive(Clone)]
pub(crate) enum ConditionNode {
    Configured(ConditionFn),
    NotNull(ValueNode),
    /// Not `Null` and not numeric zero.
    NonZero(ValueNode),
    /// The value's runtime type is `ty` or derives from it.
    IsType {
        value: ValueNode,
        ty: TypeId,
    },
    /// The existing target is `Null` or an instance of `ty`.
    TargetAccepts(TypeId),
    /// The member being populated holds `Null` or its type's default.
    ExistingIsDefault,
    /// The source dictionary has a key starting with the prefix.
    HasPrefix(Arc<str>),
    All(Vec<ConditionNode>),
    Any(Vec<ConditionNode>),
}

impl ConditionNode {
    /// Joins conditions with `&&`, a single condition is returned unchanged.
    pub(crate) fn all(mut conditions: Vec<Self>) -> Option<Self> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(Self::All(conditions)),
        }
    }
}

// -----------------------------------------------------------------------------
// Collections

/// How each element (or dictionary value) is mapped.
#[derive(Debug, Clone)]
pub(crate) enum ElementMapping {
    Convert(TypeId),
    Nested(NestedCall),
}

/// The identifier members matching source elements with existing target elements.
#[derive(Debug, Clone)]
pub(crate) struct IdentifierPair {
    pub(crate) source: Arc<str>,
    pub(crate) target: Arc<str>,
}

#[derive(Clone)]
pub(crate) struct EnumerableNode {
    pub(crate) source: ValueNode,
    /// The non-optional list type created for new collections.
    pub(crate) target_list: TypeId,
    pub(crate) rule_set: RuleSet,
    pub(crate) element: ElementMapping,
    pub(crate) identifiers: Option<IdentifierPair>,
    /// Source elements are sorted by this identifier member before mapping.
    pub(crate) order_by: Option<Arc<str>>,
}

#[derive(Clone)]
pub(crate) struct DictionaryNode {
    pub(crate) source: ValueNode,
    pub(crate) target_dictionary: TypeId,
    pub(crate) rule_set: RuleSet,
    pub(crate) value: ElementMapping,
}

/// One dictionary entry read from a source member path.
#[derive(Clone)]
pub(crate) struct FlattenedEntry {
    pub(crate) key: Arc<str>,
    pub(crate) member: Arc<QualifiedMember>,
    pub(crate) to: TypeId,
}

#[derive(Clone)]
pub(crate) struct FlattenedNode {
    pub(crate) source: ValueNode,
    pub(crate) target_dictionary: TypeId,
    pub(crate) rule_set: RuleSet,
    pub(crate) entries: Vec<FlattenedEntry>,
}
