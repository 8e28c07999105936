use core::fmt;

use vc_schema::info::TypeId;
use vc_schema::registry::TypeRegistry;

use crate::RuleSet;

// -----------------------------------------------------------------------------
// MappingScope

/// The mappings a piece of configuration applies to.
///
/// Each part is optional. A scope applies to a mapping from `S` to `T` with
/// rule set `R` when `S` is assignable to the scope's source type, `T` to
/// its target type, and `R` equals its rule set.
///
/// ```
/// use vc_mapper::RuleSet;
/// use vc_mapper::config::MappingScope;
/// use vc_schema::info::TypeId;
/// use vc_schema::registry::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// let scope = MappingScope::to(TypeId::STRING).with_rule_set(RuleSet::Merge);
///
/// assert!(scope.applies_to(&registry, TypeId::I32, TypeId::STRING, RuleSet::Merge));
/// assert!(!scope.applies_to(&registry, TypeId::I32, TypeId::STRING, RuleSet::CreateNew));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MappingScope {
    source: Option<TypeId>,
    target: Option<TypeId>,
    rule_set: Option<RuleSet>,
}

impl MappingScope {
    /// Every mapping.
    pub const ALL: Self = Self {
        source: None,
        target: None,
        rule_set: None,
    };

    /// Mappings from `source` (or a type derived from it).
    pub const fn from(source: TypeId) -> Self {
        Self {
            source: Some(source),
            ..Self::ALL
        }
    }

    /// Mappings to `target` (or a type derived from it).
    pub const fn to(target: TypeId) -> Self {
        Self {
            target: Some(target),
            ..Self::ALL
        }
    }

    /// Mappings from `source` to `target`.
    pub const fn pair(source: TypeId, target: TypeId) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            rule_set: None,
        }
    }

    /// Restricts the scope to one rule set.
    pub const fn with_rule_set(mut self, rule_set: RuleSet) -> Self {
        self.rule_set = Some(rule_set);
        self
    }

    #[inline]
    pub fn source(&self) -> Option<TypeId> {
        self.source
    }

    #[inline]
    pub fn target(&self) -> Option<TypeId> {
        self.target
    }

    #[inline]
    pub fn rule_set(&self) -> Option<RuleSet> {
        self.rule_set
    }

    pub fn applies_to(&self, registry: &TypeRegistry, source: TypeId, target: TypeId, rule_set: RuleSet) -> bool {
        self.source.is_none_or(|ty| registry.is_assignable(source, ty))
            && self.target.is_none_or(|ty| registry.is_assignable(target, ty))
            && self.rule_set.is_none_or(|rule| rule == rule_set)
    }

    /// Number of restricted parts, more specific configuration takes precedence.
    pub(crate) fn specificity(&self) -> usize {
        usize::from(self.source.is_some()) + usize::from(self.target.is_some()) + usize::from(self.rule_set.is_some())
    }

    /// Swaps source and target.
    pub(crate) fn reversed(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            rule_set: self.rule_set,
        }
    }

    pub(crate) fn display<'a>(&'a self, registry: &'a TypeRegistry) -> impl fmt::Display + 'a {
        DisplayScope { scope: self, registry }
    }
}

struct DisplayScope<'a> {
    scope: &'a MappingScope,
    registry: &'a TypeRegistry,
}

impl fmt::Display for DisplayScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |ty: Option<TypeId>| ty.map_or("*", |ty| self.registry.path_of(ty));
        write!(f, "{} -> {}", name(self.scope.source), name(self.scope.target))?;
        if let Some(rule_set) = self.scope.rule_set {
            write!(f, " ({rule_set})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use vc_schema::info::TypeId;
    use vc_schema::registry::{StructBuilder, TypeRegistry};

    use super::MappingScope;
    use crate::RuleSet;

    #[test]
    fn derived_types_are_in_scope() {
        let mut registry = TypeRegistry::new();
        let animal = registry.register_struct(StructBuilder::new("zoo::Animal")).unwrap();
        let dog = registry
            .register_struct(StructBuilder::new("zoo::Dog").extends(animal))
            .unwrap();

        let scope = MappingScope::from(animal);
        assert!(scope.applies_to(&registry, dog, TypeId::STRING, RuleSet::CreateNew));
        assert!(!MappingScope::from(dog).applies_to(&registry, animal, TypeId::STRING, RuleSet::CreateNew));
        assert!(MappingScope::ALL.applies_to(&registry, animal, dog, RuleSet::Overwrite));
    }

    #[test]
    fn specificity_and_display() {
        let registry = TypeRegistry::new();
        let scope = MappingScope::pair(TypeId::I32, TypeId::STRING).with_rule_set(RuleSet::Merge);

        assert_eq!(MappingScope::ALL.specificity(), 0);
        assert_eq!(scope.specificity(), 3);
        assert_eq!(scope.display(&registry).to_string(), "i32 -> String (Merge)");
        assert_eq!(scope.reversed().display(&registry).to_string(), "String -> i32 (Merge)");
        assert_eq!(MappingScope::ALL.display(&registry).to_string(), "* -> *");
    }
}
