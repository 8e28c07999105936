use core::fmt;
use std::sync::Arc;

use crate::info::{DictionaryInfo, EnumInfo, ListInfo, OptionalInfo};
use crate::info::{PrimitiveInfo, PrimitiveKind, StructInfo, Type, TypeId};

// -----------------------------------------------------------------------------
// TypeKind

/// The mapping classification of a type.
///
/// A member's classification is derived once from its declared type and
/// decides how the mapper populates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Primitives and enums, copied or converted by value.
    Simple,
    /// Structs (and `Any`), populated member by member through a nested plan.
    Complex,
    /// Sequences, populated element by element.
    Enumerable,
    /// String-keyed maps.
    Dictionary,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.pad("Simple"),
            Self::Complex => f.pad("Complex"),
            Self::Enumerable => f.pad("Enumerable"),
            Self::Dictionary => f.pad("Dictionary"),
        }
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Information about a registered type.
///
/// Obtained through [`TypeRegistry::get`](crate::registry::TypeRegistry::get).
#[derive(Debug, Clone)]
pub enum TypeInfo {
    Any(Type),
    Primitive(PrimitiveInfo),
    Enum(EnumInfo),
    Struct(Arc<StructInfo>),
    List(ListInfo),
    Dictionary(DictionaryInfo),
    Optional(OptionalInfo),
}

impl TypeInfo {
    /// Returns the underlying [`Type`].
    pub fn ty(&self) -> &Type {
        match self {
            Self::Any(ty) => ty,
            Self::Primitive(info) => info.ty(),
            Self::Enum(info) => info.ty(),
            Self::Struct(info) => info.ty(),
            Self::List(info) => info.ty(),
            Self::Dictionary(info) => info.ty(),
            Self::Optional(info) => info.ty(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.ty().id()
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.ty().path()
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.ty().name()
    }

    /// Returns the struct information, if this is a struct.
    #[inline]
    pub fn as_struct(&self) -> Option<&Arc<StructInfo>> {
        match self {
            Self::Struct(info) => Some(info),
            _ => None,
        }
    }

    #[inline]
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Primitive(info) => Some(info.kind()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_enum(&self) -> Option<&EnumInfo> {
        match self {
            Self::Enum(info) => Some(info),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&ListInfo> {
        match self {
            Self::List(info) => Some(info),
            _ => None,
        }
    }

    #[inline]
    pub fn as_dictionary(&self) -> Option<&DictionaryInfo> {
        match self {
            Self::Dictionary(info) => Some(info),
            _ => None,
        }
    }

    #[inline]
    pub fn as_optional(&self) -> Option<&OptionalInfo> {
        match self {
            Self::Optional(info) => Some(info),
            _ => None,
        }
    }

    /// Returns `true` if a value of this type may be `Null`.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        !matches!(self, Self::Primitive(_) | Self::Enum(_))
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any(_))
    }
}
