use crate::hash::HashMap;
use crate::info::{MemberInfo, Type, TypeId};

/// Type information of a struct.
///
/// Members are kept in declaration order, inherited members first.
///
/// # Examples
///
/// ```
/// use vc_schema::info::TypeId;
/// use vc_schema::registry::{StructBuilder, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
/// let id = registry
///     .register_struct(
///         StructBuilder::new("shop::Address")
///             .member("Line1", TypeId::STRING)
///             .member("Line2", TypeId::STRING),
///     )
///     .unwrap();
///
/// let info = registry.get_struct(id).unwrap();
/// assert_eq!(info.member_len(), 2);
/// assert_eq!(info.member("line2").unwrap().slot(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct StructInfo {
    ty: Type,
    base: Option<TypeId>,
    is_abstract: bool,
    members: Box<[MemberInfo]>,
    // lowercase name -> index
    indices: HashMap<Box<str>, usize>,
}

impl StructInfo {
    pub(crate) fn new(
        ty: Type,
        base: Option<TypeId>,
        is_abstract: bool,
        members: Vec<MemberInfo>,
    ) -> Self {
        let indices = members
            .iter()
            .enumerate()
            .map(|(index, member)| (member.name().to_ascii_lowercase().into_boxed_str(), index))
            .collect();

        Self {
            ty,
            base,
            is_abstract,
            members: members.into_boxed_slice(),
            indices,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the direct base type, if any.
    #[inline]
    pub fn base(&self) -> Option<TypeId> {
        self.base
    }

    /// Returns `true` if instances of exactly this type cannot be created.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Returns the member with the given name, compared case-insensitively.
    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        match self.indices.get(name) {
            Some(&index) => self.members.get(index),
            None => {
                let lower = name.to_ascii_lowercase();
                self.indices
                    .get(lower.as_str())
                    .and_then(|&index| self.members.get(index))
            }
        }
    }

    /// Returns the member at the given slot.
    #[inline]
    pub fn member_at(&self, slot: usize) -> Option<&MemberInfo> {
        self.members.get(slot)
    }

    /// Returns the members in declaration order.
    #[inline]
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    #[inline]
    pub fn member_len(&self) -> usize {
        self.members.len()
    }

    /// Returns the members which are set through the constructor, in declaration order.
    pub fn constructor_members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members.iter().filter(|m| m.is_constructor_parameter())
    }
}
