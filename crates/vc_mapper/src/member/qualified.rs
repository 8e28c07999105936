use core::fmt;
use std::sync::Arc;

use vc_schema::info::{MemberFlags, MemberInfo, TypeId, TypeKind};
use vc_schema::registry::TypeRegistry;

// -----------------------------------------------------------------------------
// QualifiedMember

/// A member reachable from a root object through a chain of members.
///
/// The classification is derived once from the declared type and never
/// changes. `owner` is the struct type the member is read from: it differs
/// from the parent's declared type when the path narrows to a subtype, in
/// which case reading the member requires the parent value to be of the
/// owner type at runtime.
#[derive(Clone)]
pub struct QualifiedMember {
    parent: Option<Arc<QualifiedMember>>,
    name: Arc<str>,
    path: Arc<str>,
    flat_name: Arc<str>,
    ty: TypeId,
    owner: TypeId,
    slot: usize,
    flags: MemberFlags,
    kind: TypeKind,
    depth: usize,
}

impl QualifiedMember {
    /// A member of the root type `owner`.
    pub(crate) fn root(registry: &TypeRegistry, owner: TypeId, member: &MemberInfo) -> Self {
        Self {
            parent: None,
            name: member.name_arc().clone(),
            path: member.name_arc().clone(),
            flat_name: member.name_arc().clone(),
            ty: member.ty(),
            owner,
            slot: member.slot(),
            flags: member.flags(),
            kind: registry.kind_of(member.ty()),
            depth: 1,
        }
    }

    /// A member of the value held by `parent`, read as an `owner`.
    pub(crate) fn child(registry: &TypeRegistry, parent: &Arc<Self>, owner: TypeId, member: &MemberInfo) -> Self {
        Self {
            parent: Some(parent.clone()),
            name: member.name_arc().clone(),
            path: format!("{}.{}", parent.path, member.name()).into(),
            flat_name: format!("{}{}", parent.flat_name, member.name()).into(),
            ty: member.ty(),
            owner,
            slot: member.slot(),
            flags: member.flags(),
            kind: registry.kind_of(member.ty()),
            depth: parent.depth + 1,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    /// The member's own name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// The dotted path from the root, `Address.Line1`.
    #[inline]
    pub fn path(&self) -> &Arc<str> {
        &self.path
    }

    /// The concatenated names from the root, `AddressLine1`.
    #[inline]
    pub fn flat_name(&self) -> &str {
        &self.flat_name
    }

    /// The declared type.
    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    #[inline]
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    /// Number of members on the path, 1 for a member of the root.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_readable(&self) -> bool {
        self.flags.contains(MemberFlags::READABLE)
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.flags.contains(MemberFlags::WRITABLE)
    }

    #[inline]
    pub fn is_constructor_parameter(&self) -> bool {
        self.flags.contains(MemberFlags::CONSTRUCTOR)
    }

    /// Returns `true` if reading the member requires a runtime type check of its parent.
    pub fn is_narrowed(&self, registry: &TypeRegistry) -> bool {
        self.parent
            .as_ref()
            .is_some_and(|parent| registry.non_optional(parent.ty) != self.owner)
    }
}

impl fmt::Debug for QualifiedMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualifiedMember")
            .field("path", &self.path)
            .field("ty", &self.ty)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .finish()
    }
}

impl fmt::Display for QualifiedMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.path)
    }
}
