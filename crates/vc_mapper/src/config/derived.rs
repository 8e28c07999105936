use core::fmt;
use std::sync::Arc;

use vc_schema::info::TypeId;
use vc_schema::registry::TypeRegistry;

use crate::config::{ConditionFn, MappingArgs, MappingScope};
use crate::{ConfigurationError, RuleSet};

// -----------------------------------------------------------------------------
// DerivedTypePair

/// Maps a derived source type to a derived target type.
///
/// The pair applies to plans whose declared types are in its scope: when
/// the runtime source is (derived from) `source`, the mapping is redirected
/// to `target`.
///
/// An abstract `target` is replaced by its only concrete subtype, more or
/// fewer concrete subtypes make the pair invalid.
#[derive(Clone)]
pub struct DerivedTypePair {
    declared_source: TypeId,
    declared_target: TypeId,
    rule_set: Option<RuleSet>,
    source: TypeId,
    target: TypeId,
    condition: Option<ConditionFn>,
}

impl DerivedTypePair {
    pub fn new(declared_source: TypeId, declared_target: TypeId, source: TypeId, target: TypeId) -> Self {
        Self {
            declared_source,
            declared_target,
            rule_set: None,
            source,
            target,
            condition: None,
        }
    }

    /// Restricts the pair to one rule set.
    pub fn with_rule_set(mut self, rule_set: RuleSet) -> Self {
        self.rule_set = Some(rule_set);
        self
    }

    /// Applies the pair only when `condition` holds.
    pub fn when(mut self, condition: impl Fn(&MappingArgs<'_>) -> bool + Send + Sync + 'static) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// The scope of the declared types.
    pub fn scope(&self) -> MappingScope {
        let scope = MappingScope::pair(self.declared_source, self.declared_target);
        match self.rule_set {
            Some(rule_set) => scope.with_rule_set(rule_set),
            None => scope,
        }
    }

    #[inline]
    pub fn source(&self) -> TypeId {
        self.source
    }

    #[inline]
    pub fn target(&self) -> TypeId {
        self.target
    }

    #[inline]
    pub fn condition(&self) -> Option<&ConditionFn> {
        self.condition.as_ref()
    }

    /// Checks the pair and resolves an abstract target to its concrete type.
    pub(crate) fn validate(mut self, registry: &TypeRegistry) -> Result<Self, ConfigurationError> {
        let (source, target) = (self.source, self.target);
        let invalid = |reason: String| ConfigurationError::InvalidDerivedPair {
            source_type: registry.path_of(source).into(),
            target_type: registry.path_of(target).into(),
            reason: reason.into(),
        };

        if source == target {
            return Err(invalid("a type cannot be paired with itself".into()));
        }
        if source == self.declared_source || !registry.is_subtype_of(source, self.declared_source) {
            return Err(invalid(format!(
                "`{}` is not derived from `{}`",
                registry.path_of(source),
                registry.path_of(self.declared_source),
            )));
        }
        if !registry.is_subtype_of(target, self.declared_target) {
            return Err(invalid(format!(
                "`{}` is not `{}` or derived from it",
                registry.path_of(target),
                registry.path_of(self.declared_target),
            )));
        }

        if registry.is_abstract(target) {
            let concrete: Vec<TypeId> = registry
                .subtypes_of(target)
                .into_iter()
                .filter(|ty| !registry.is_abstract(*ty))
                .collect();
            match concrete[..] {
                [only] => self.target = only,
                _ => {
                    return Err(invalid(format!(
                        "abstract type `{}` has {} concrete subtypes, expected exactly one",
                        registry.path_of(target),
                        concrete.len(),
                    )));
                }
            }
        }

        Ok(self)
    }
}

impl fmt::Debug for DerivedTypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedTypePair")
            .field("declared_source", &self.declared_source)
            .field("declared_target", &self.declared_target)
            .field("rule_set", &self.rule_set)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}
