use std::sync::Arc;

use log::trace;
use serde::Serialize;

use crate::plan::node::{ConditionNode, ValueNode};

// -----------------------------------------------------------------------------
// DataSourceKind

/// Where a member value comes from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataSourceKind {
    /// A configured data source.
    Configured,
    /// A matching entry of a source dictionary.
    Dictionary,
    /// A source member matched by name.
    Structural,
    /// A nested mapping of the same source, unflattening prefixed members.
    Nested,
    /// The default or existing value.
    Fallback,
}

// -----------------------------------------------------------------------------
// DataSource

/// A candidate value for one target member.
#[derive(Clone)]
pub(crate) struct DataSource {
    pub(crate) kind: DataSourceKind,
    /// The source member path or dictionary key the value is read from.
    pub(crate) source_member: Option<Arc<str>>,
    /// Locals evaluated before the condition, in order.
    pub(crate) bindings: Vec<(usize, ValueNode)>,
    pub(crate) condition: Option<ConditionNode>,
    pub(crate) value: ValueNode,
}

impl DataSource {
    pub(crate) fn new(kind: DataSourceKind, value: ValueNode) -> Self {
        Self {
            kind,
            source_member: None,
            bindings: Vec::new(),
            condition: None,
            value,
        }
    }

    pub(crate) fn from_member(mut self, path: impl Into<Arc<str>>) -> Self {
        self.source_member = Some(path.into());
        self
    }

    pub(crate) fn bind(mut self, index: usize, value: ValueNode) -> Self {
        self.bindings.push((index, value));
        self
    }

    pub(crate) fn when(mut self, condition: Option<ConditionNode>) -> Self {
        self.condition = condition;
        self
    }

    #[inline]
    pub(crate) fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    /// The value of this source, or `otherwise` when its condition fails.
    fn chain(self, otherwise: ValueNode) -> ValueNode {
        let body = match self.condition {
            Some(condition) => ValueNode::conditional(condition, self.value, otherwise),
            None => self.value,
        };
        self.bindings
            .into_iter()
            .rev()
            .fold(body, |body, (index, value)| ValueNode::bind(index, value, body))
    }
}

// -----------------------------------------------------------------------------
// DataSourceSet

/// The data sources of one target member in priority order.
///
/// Once an unconditional source is pushed the set is closed, later
/// candidates could never be reached and are dropped. A set that is still
/// open when resolution ends is closed by its fallback.
#[derive(Default)]
pub(crate) struct DataSourceSet {
    sources: Vec<DataSource>,
    closed: bool,
}

impl DataSourceSet {
    pub(crate) fn push(&mut self, source: DataSource) {
        if self.closed {
            trace!("dropping unreachable {:?} data source", source.kind);
            return;
        }
        self.closed = !source.is_conditional();
        self.sources.push(source);
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closes the set with `fallback` unless an unconditional source closed it.
    pub(crate) fn finish(mut self, fallback: ValueNode) -> Vec<DataSource> {
        if !self.closed {
            self.sources.push(DataSource::new(DataSourceKind::Fallback, fallback));
        }
        self.sources
    }
}

/// Returns `true` if any of the sources is not the fallback.
pub(crate) fn has_value_sources(sources: &[DataSource]) -> bool {
    sources.iter().any(|source| source.kind != DataSourceKind::Fallback)
}

/// Assembles the first-match-wins chain of the sources.
///
/// The chain is built from the last source to the first: every conditional
/// source falls through to the chain of the sources after it.
pub(crate) fn chain(sources: &[DataSource]) -> ValueNode {
    sources
        .iter()
        .rev()
        .fold(ValueNode::Existing, |otherwise, source| source.clone().chain(otherwise))
}

#[cfg(test)]
mod tests {
    use vc_schema::Value;
    use vc_schema::info::TypeId;

    use super::{DataSource, DataSourceKind, DataSourceSet, chain, has_value_sources};
    use crate::plan::node::{ConditionNode, ValueNode};

    fn conditional(kind: DataSourceKind) -> DataSource {
        DataSource::new(kind, ValueNode::Local(0))
            .bind(0, ValueNode::Constant(Value::from(1)))
            .when(Some(ConditionNode::NotNull(ValueNode::Local(0))))
    }

    #[test]
    fn unconditional_source_closes_the_set() {
        let mut set = DataSourceSet::default();
        set.push(conditional(DataSourceKind::Configured));
        assert!(!set.is_closed());

        set.push(DataSource::new(DataSourceKind::Structural, ValueNode::SourceRoot));
        set.push(conditional(DataSourceKind::Nested));
        assert!(set.is_closed());

        let sources = set.finish(ValueNode::Default(TypeId::I32));
        let kinds: Vec<_> = sources.iter().map(|source| source.kind).collect();
        assert_eq!(kinds, [DataSourceKind::Configured, DataSourceKind::Structural]);
        assert!(has_value_sources(&sources));
    }

    #[test]
    fn fallback_is_last() {
        let mut set = DataSourceSet::default();
        set.push(conditional(DataSourceKind::Dictionary));

        let sources = set.finish(ValueNode::Default(TypeId::I32));
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].kind, DataSourceKind::Fallback);

        // let $0 = 1; if $0 != null { $0 } else { default(i32) }
        let ValueNode::Let { index: 0, body, .. } = chain(&sources) else {
            panic!("expected a binding");
        };
        let ValueNode::Conditional { otherwise, .. } = *body else {
            panic!("expected a conditional");
        };
        assert!(matches!(*otherwise, ValueNode::Default(TypeId::I32)));
    }

    #[test]
    fn only_fallback() {
        let sources = DataSourceSet::default().finish(ValueNode::Existing);
        assert!(!has_value_sources(&sources));
    }
}
