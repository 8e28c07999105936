use std::sync::Arc;

use crate::info::{MemberFlags, TypeId};

/// A member declared on a [`StructBuilder`].
#[derive(Debug, Clone)]
pub(crate) struct MemberDecl {
    pub name: Arc<str>,
    pub ty: TypeId,
    pub flags: MemberFlags,
}

/// Describes a struct to be registered with
/// [`TypeRegistry::register_struct`](crate::registry::TypeRegistry::register_struct).
///
/// Members are declared in order. Inherited members are added by the
/// registry, in front of the declared ones.
///
/// # Examples
///
/// ```
/// use vc_schema::info::TypeId;
/// use vc_schema::registry::{StructBuilder, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
/// let person = registry
///     .register_struct(
///         StructBuilder::new("crm::Person")
///             .abstract_type()
///             .member("Name", TypeId::STRING),
///     )
///     .unwrap();
/// let customer = registry
///     .register_struct(
///         StructBuilder::new("crm::Customer")
///             .extends(person)
///             .readonly_member("Id", TypeId::U32)
///             .member("Discount", TypeId::F64),
///     )
///     .unwrap();
///
/// let info = registry.get_struct(customer).unwrap();
/// assert_eq!(info.members()[0].name(), "Name");
/// assert!(registry.is_subtype_of(customer, person));
/// ```
#[derive(Debug, Clone)]
pub struct StructBuilder {
    pub(crate) path: Arc<str>,
    pub(crate) base: Option<TypeId>,
    pub(crate) is_abstract: bool,
    pub(crate) members: Vec<MemberDecl>,
}

impl StructBuilder {
    pub fn new(path: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            base: None,
            is_abstract: false,
            members: Vec::new(),
        }
    }

    /// Sets the base struct whose members are inherited.
    pub fn extends(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    /// Marks the struct as abstract, instances of exactly this type cannot be created.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Adds a readable and writable member.
    pub fn member(self, name: impl Into<Arc<str>>, ty: TypeId) -> Self {
        self.member_with_flags(name, ty, MemberFlags::READ_WRITE)
    }

    /// Adds a member that can be read but not assigned.
    pub fn readonly_member(self, name: impl Into<Arc<str>>, ty: TypeId) -> Self {
        self.member_with_flags(name, ty, MemberFlags::READABLE)
    }

    /// Adds a readable member which is only populated when an instance is created.
    pub fn constructor_member(self, name: impl Into<Arc<str>>, ty: TypeId) -> Self {
        self.member_with_flags(name, ty, MemberFlags::READABLE | MemberFlags::CONSTRUCTOR)
    }

    pub fn member_with_flags(
        mut self,
        name: impl Into<Arc<str>>,
        ty: TypeId,
        flags: MemberFlags,
    ) -> Self {
        self.members.push(MemberDecl {
            name: name.into(),
            ty,
            flags,
        });
        self
    }

    /// Returns the path the struct will be registered under.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }
}
