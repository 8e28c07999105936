use core::fmt;
use std::sync::Arc;

use vc_schema::Value;
use vc_schema::info::TypeId;

use crate::config::{MappingArgs, MappingScope};
use crate::{BoxError, ConfigurationError};

/// A configured function producing a member value.
pub type ValueFn = Arc<dyn Fn(&MappingArgs<'_>) -> Result<Value, BoxError> + Send + Sync>;

/// A configured condition.
pub type ConditionFn = Arc<dyn Fn(&MappingArgs<'_>) -> bool + Send + Sync>;

// -----------------------------------------------------------------------------
// ConfiguredValue

/// Where a configured data source takes its value from.
#[derive(Clone)]
pub enum ConfiguredValue {
    /// A fixed value, converted to the member type when the plan is compiled.
    Constant(Value),
    /// A member of the source, nested members are separated by `.`.
    /// For dictionary sources the path is the entry key.
    SourceMember(Arc<str>),
    /// A function returning values of type `result`.
    Function { result: TypeId, func: ValueFn },
}

impl ConfiguredValue {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    pub fn member(path: impl Into<Arc<str>>) -> Self {
        Self::SourceMember(path.into())
    }

    pub fn function(
        result: TypeId,
        func: impl Fn(&MappingArgs<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self::Function {
            result,
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for ConfiguredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::SourceMember(path) => f.debug_tuple("SourceMember").field(path).finish(),
            Self::Function { result, .. } => f.debug_struct("Function").field("result", result).finish_non_exhaustive(),
        }
    }
}

// -----------------------------------------------------------------------------
// ConfiguredTarget

/// What a configured data source populates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfiguredTarget {
    /// A member of the target, matched ignoring ASCII case.
    Member(Arc<str>),
    /// The whole target: the value is mapped onto the target after its members.
    Target,
}

// -----------------------------------------------------------------------------
// ConfiguredDataSource

/// A user supplied value source for a target member.
///
/// Configured sources take precedence over every source the mapper finds by
/// itself. Within one scope, at most one unconditional source may exist for
/// a member, a second one is reported as a conflict when the plan compiles.
///
/// # Examples
///
/// ```
/// use vc_mapper::config::{ConfiguredDataSource, ConfiguredValue, MappingScope};
/// use vc_schema::info::TypeId;
///
/// let scope = MappingScope::ALL;
/// let source = ConfiguredDataSource::new(scope, ConfiguredValue::member("Id"), "Value")
///     .reversible()
///     .when(|args| !args.source().is_null());
///
/// assert!(source.is_conditional());
/// ```
#[derive(Clone)]
pub struct ConfiguredDataSource {
    scope: MappingScope,
    value: ConfiguredValue,
    target: ConfiguredTarget,
    condition: Option<ConditionFn>,
    reversible: bool,
    sequential: bool,
}

impl ConfiguredDataSource {
    /// Populates the target member `member` from `value`.
    pub fn new(scope: MappingScope, value: ConfiguredValue, member: impl Into<Arc<str>>) -> Self {
        Self {
            scope,
            value,
            target: ConfiguredTarget::Member(member.into()),
            condition: None,
            reversible: false,
            sequential: false,
        }
    }

    /// Maps `value` onto the whole target.
    pub fn to_target(scope: MappingScope, value: ConfiguredValue) -> Self {
        Self {
            scope,
            value,
            target: ConfiguredTarget::Target,
            condition: None,
            reversible: false,
            sequential: false,
        }
    }

    /// Applies the source only when `condition` holds.
    pub fn when(mut self, condition: impl Fn(&MappingArgs<'_>) -> bool + Send + Sync + 'static) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Also registers the reverse member-to-member source, from the target
    /// type's member back to the source type's member.
    pub fn reversible(mut self) -> Self {
        self.reversible = true;
        self
    }

    /// Applies this source in order with the member's other sequential
    /// sources: each one that applies writes the member, later ones win.
    pub fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }

    #[inline]
    pub fn scope(&self) -> &MappingScope {
        &self.scope
    }

    #[inline]
    pub fn value(&self) -> &ConfiguredValue {
        &self.value
    }

    #[inline]
    pub fn target(&self) -> &ConfiguredTarget {
        &self.target
    }

    #[inline]
    pub fn condition(&self) -> Option<&ConditionFn> {
        self.condition.as_ref()
    }

    #[inline]
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    #[inline]
    pub fn is_reversible(&self) -> bool {
        self.reversible
    }

    #[inline]
    pub fn is_sequential(&self) -> bool {
        self.sequential
    }

    /// Returns `true` if this source populates the member named `name`.
    pub(crate) fn targets_member(&self, name: &str) -> bool {
        matches!(&self.target, ConfiguredTarget::Member(member) if member.eq_ignore_ascii_case(name))
    }

    /// Builds the source populating this source's member from its target member.
    pub(crate) fn reversed(&self) -> Result<Self, ConfigurationError> {
        let not_reversible = |member: &str, reason: &str| ConfigurationError::NotReversible {
            member: member.into(),
            reason: reason.into(),
        };

        let ConfiguredTarget::Member(member) = &self.target else {
            return Err(not_reversible("<target>", "the source populates the whole target"));
        };
        let ConfiguredValue::SourceMember(path) = &self.value else {
            return Err(not_reversible(member, "only source member values can be reversed"));
        };
        if path.contains('.') {
            return Err(not_reversible(member, "nested source members cannot be reversed"));
        }
        if self.condition.is_some() {
            return Err(not_reversible(member, "conditional sources cannot be reversed"));
        }
        if self.scope.source().is_none() || self.scope.target().is_none() {
            return Err(not_reversible(member, "the scope must name both the source and the target type"));
        }

        Ok(Self {
            scope: self.scope.reversed(),
            value: ConfiguredValue::SourceMember(member.clone()),
            target: ConfiguredTarget::Member(path.clone()),
            condition: None,
            reversible: false,
            sequential: self.sequential,
        })
    }
}

impl fmt::Debug for ConfiguredDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredDataSource")
            .field("scope", &self.scope)
            .field("value", &self.value)
            .field("target", &self.target)
            .field("conditional", &self.condition.is_some())
            .field("reversible", &self.reversible)
            .field("sequential", &self.sequential)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use vc_schema::info::TypeId;

    use super::*;
    use crate::ConfigurationError;

    #[test]
    fn reverse_member_source() {
        let scope = MappingScope::pair(TypeId::I32, TypeId::STRING);
        let source = ConfiguredDataSource::new(scope, ConfiguredValue::member("Id"), "Value").reversible();

        let reversed = source.reversed().unwrap();
        assert_eq!(reversed.scope(), &scope.reversed());
        assert!(reversed.targets_member("id"));
        assert!(matches!(reversed.value(), ConfiguredValue::SourceMember(path) if &**path == "Value"));
        assert!(!reversed.is_reversible());
    }

    #[test]
    fn not_reversible() {
        let scope = MappingScope::pair(TypeId::I32, TypeId::STRING);

        let constant = ConfiguredDataSource::new(scope, ConfiguredValue::constant(1), "Value");
        assert!(matches!(
            constant.reversed(),
            Err(ConfigurationError::NotReversible { member, .. }) if &*member == "Value"
        ));

        let nested = ConfiguredDataSource::new(scope, ConfiguredValue::member("Address.Line1"), "Line1");
        assert!(nested.reversed().is_err());

        let unscoped = ConfiguredDataSource::new(MappingScope::ALL, ConfiguredValue::member("Id"), "Value");
        assert!(unscoped.reversed().is_err());

        let conditional = ConfiguredDataSource::new(scope, ConfiguredValue::member("Id"), "Value").when(|_| true);
        assert!(conditional.reversed().is_err());
    }
}
