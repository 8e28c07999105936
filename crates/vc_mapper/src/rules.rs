use core::fmt;

use serde::Serialize;

// -----------------------------------------------------------------------------
// RuleSet

/// The strategy applied when a target already holds data.
///
/// The rule set is part of every plan's cache key: the same pair of types
/// compiles to a different plan for each strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleSet {
    /// Builds a fresh target. Existing target data is never read.
    CreateNew,
    /// Fills only what the target is missing: simple members are written
    /// while they are `Null` or default, collections gain new elements.
    Merge,
    /// Writes every member that has a value source, collections are
    /// replaced by the mapped source elements.
    Overwrite,
}

impl RuleSet {
    pub const ALL: [Self; 3] = [Self::CreateNew, Self::Merge, Self::Overwrite];

    /// Returns the display name of the rule set.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateNew => "CreateNew",
            Self::Merge => "Merge",
            Self::Overwrite => "Overwrite",
        }
    }

    /// Returns `true` if the rule set maps onto an existing target.
    #[inline]
    pub const fn uses_existing(self) -> bool {
        !matches!(self, Self::CreateNew)
    }

    /// The rule set used to apply a value onto a target that already exists.
    #[inline]
    pub(crate) const fn onto_existing(self) -> Self {
        match self {
            Self::CreateNew => Self::Merge,
            other => other,
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::RuleSet;

    #[test]
    fn names() {
        assert_eq!(RuleSet::CreateNew.to_string(), "CreateNew");
        assert_eq!(format!("{:>9}", RuleSet::Merge), "    Merge");
        assert!(!RuleSet::CreateNew.uses_existing());
        assert!(RuleSet::Overwrite.uses_existing());
        assert_eq!(RuleSet::CreateNew.onto_existing(), RuleSet::Merge);
        assert_eq!(RuleSet::Overwrite.onto_existing(), RuleSet::Overwrite);
    }
}
