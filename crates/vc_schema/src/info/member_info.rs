use std::sync::Arc;

use bitflags::bitflags;

use crate::info::TypeId;

// -----------------------------------------------------------------------------
// MemberFlags

bitflags! {
    /// Access capabilities of a struct member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        /// The member can be read from an instance.
        const READABLE = 1;
        /// The member can be assigned after construction.
        const WRITABLE = 1 << 1;
        /// The member is initialized by a constructor parameter of the same name.
        const CONSTRUCTOR = 1 << 2;
    }
}

impl MemberFlags {
    /// Flags of an ordinary get/set member.
    pub const READ_WRITE: Self = Self::READABLE.union(Self::WRITABLE);
}

// -----------------------------------------------------------------------------
// MemberInfo

/// A named member of a struct.
///
/// `slot` is the position of the member's value inside an object of the
/// declaring type or any type derived from it: derived types lay out their
/// base members first, so slots never move down a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    name: Arc<str>,
    ty: TypeId,
    slot: usize,
    declaring_type: TypeId,
    flags: MemberFlags,
}

impl MemberInfo {
    pub(crate) fn new(
        name: Arc<str>,
        ty: TypeId,
        slot: usize,
        declaring_type: TypeId,
        flags: MemberFlags,
    ) -> Self {
        Self {
            name,
            ty,
            slot,
            declaring_type,
            flags,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// Returns the declared type of the member.
    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns the type which introduced this member.
    #[inline]
    pub fn declaring_type(&self) -> TypeId {
        self.declaring_type
    }

    #[inline]
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    #[inline]
    pub fn is_readable(&self) -> bool {
        self.flags.contains(MemberFlags::READABLE)
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.flags.contains(MemberFlags::WRITABLE)
    }

    /// Returns `true` if the member is set through the constructor.
    #[inline]
    pub fn is_constructor_parameter(&self) -> bool {
        self.flags.contains(MemberFlags::CONSTRUCTOR)
    }
}
