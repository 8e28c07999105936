use core::fmt;
use std::sync::Arc;

use vc_schema::info::{MemberInfo, TypeId};
use vc_schema::registry::TypeRegistry;

use crate::config::MappingScope;

/// A predicate selecting target members.
pub type MemberFilter = Arc<dyn Fn(&MemberInfo) -> bool + Send + Sync>;

// -----------------------------------------------------------------------------
// Ignore

/// What an [`Ignore`] removes.
#[derive(Clone)]
pub enum IgnoreRule {
    /// The target member with this name (ASCII case-insensitive).
    Member(Arc<str>),
    /// Every target member whose type is assignable to this type.
    MemberType(TypeId),
    /// Every target member accepted by the predicate.
    Filter(MemberFilter),
}

impl fmt::Debug for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(name) => f.debug_tuple("Member").field(name).finish(),
            Self::MemberType(ty) => f.debug_tuple("MemberType").field(ty).finish(),
            Self::Filter(_) => f.write_str("Filter(..)"),
        }
    }
}

/// Removes target members from every plan in scope.
///
/// An ignored member is not populated at all, it keeps the value the target
/// was created with (or already held).
#[derive(Debug, Clone)]
pub struct Ignore {
    scope: MappingScope,
    rule: IgnoreRule,
}

impl Ignore {
    pub fn member(scope: MappingScope, name: impl Into<Arc<str>>) -> Self {
        Self {
            scope,
            rule: IgnoreRule::Member(name.into()),
        }
    }

    pub fn member_type(scope: MappingScope, ty: TypeId) -> Self {
        Self {
            scope,
            rule: IgnoreRule::MemberType(ty),
        }
    }

    pub fn filter(scope: MappingScope, filter: impl Fn(&MemberInfo) -> bool + Send + Sync + 'static) -> Self {
        Self {
            scope,
            rule: IgnoreRule::Filter(Arc::new(filter)),
        }
    }

    #[inline]
    pub fn scope(&self) -> &MappingScope {
        &self.scope
    }

    #[inline]
    pub fn rule(&self) -> &IgnoreRule {
        &self.rule
    }

    pub(crate) fn matches(&self, registry: &TypeRegistry, member: &MemberInfo) -> bool {
        match &self.rule {
            IgnoreRule::Member(name) => member.name().eq_ignore_ascii_case(name),
            IgnoreRule::MemberType(ty) => registry.is_assignable(member.ty(), *ty) && *ty != TypeId::ANY,
            IgnoreRule::Filter(filter) => filter(member),
        }
    }
}
