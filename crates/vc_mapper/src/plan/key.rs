use core::fmt;
use std::sync::Arc;

use vc_schema::info::TypeId;

use crate::RuleSet;

// -----------------------------------------------------------------------------
// MemberContext

/// The target members enclosing a mapping that reuses its parent's source.
///
/// When a complex target member is populated from the same source object
/// (unflattening `AddressLine1` into `Address.Line1`) or from the same
/// dictionary (keys `Address.Line1`), the nested plan is compiled for the
/// enclosing member names. The root context is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MemberContext(Arc<[Arc<str>]>);

impl MemberContext {
    #[inline]
    pub fn root() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn names(&self) -> &[Arc<str>] {
        &self.0
    }

    /// The context of a member nested in this one.
    pub(crate) fn child(&self, name: &Arc<str>) -> Self {
        let mut names = self.0.to_vec();
        names.push(name.clone());
        Self(names.into())
    }

    /// The enclosing names concatenated, `Address` for `Address.Line1`.
    pub fn flattened(&self) -> String {
        self.0.concat()
    }
}

impl fmt::Display for MemberContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0.join("."))
    }
}

// -----------------------------------------------------------------------------
// MapperKey

/// Identifies a compiled plan.
///
/// A plan is a pure function of its key. Keys whose source type is `Any`
/// are further discriminated by the runtime type of the source, see
/// the plan cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapperKey {
    pub source: TypeId,
    pub target: TypeId,
    pub rule_set: RuleSet,
    pub context: MemberContext,
}

impl MapperKey {
    pub fn new(source: TypeId, target: TypeId, rule_set: RuleSet) -> Self {
        Self {
            source,
            target,
            rule_set,
            context: MemberContext::root(),
        }
    }

    pub fn with_context(mut self, context: MemberContext) -> Self {
        self.context = context;
        self
    }

    /// The key of the same mapping for another source type.
    pub(crate) fn with_source(&self, source: TypeId) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }
}

impl fmt::Display for MapperKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.source, self.target, self.rule_set)?;
        if !self.context.is_root() {
            write!(f, " in `{}`", self.context)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vc_schema::info::TypeId;

    use super::{MapperKey, MemberContext};
    use crate::RuleSet;

    #[test]
    fn context() {
        let address: Arc<str> = "Address".into();
        let line: Arc<str> = "Line".into();
        let context = MemberContext::root().child(&address).child(&line);

        assert!(!context.is_root());
        assert_eq!(context.flattened(), "AddressLine");
        assert_eq!(context.to_string(), "Address.Line");
    }

    #[test]
    fn keys_differ_by_context() {
        let key = MapperKey::new(TypeId::ANY, TypeId::STRING, RuleSet::Merge);
        let nested = key.clone().with_context(MemberContext::root().child(&"Address".into()));

        assert_ne!(key, nested);
        assert_eq!(key, MapperKey::new(TypeId::ANY, TypeId::STRING, RuleSet::Merge));
        assert_eq!(key.with_source(TypeId::I32).source, TypeId::I32);
    }
}
