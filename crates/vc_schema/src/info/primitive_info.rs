use core::fmt;

use crate::info::{Type, TypeId};

// -----------------------------------------------------------------------------
// PrimitiveKind

/// The builtin simple types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
}

impl PrimitiveKind {
    /// All kinds in registration order, the position matches [`TypeId`].
    pub(crate) const ALL: [Self; 13] = [
        Self::Bool,
        Self::Char,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::F32,
        Self::F64,
        Self::String,
    ];

    /// Returns the fixed [`TypeId`] of this primitive.
    pub const fn type_id(self) -> TypeId {
        match self {
            Self::Bool => TypeId::BOOL,
            Self::Char => TypeId::CHAR,
            Self::I8 => TypeId::I8,
            Self::I16 => TypeId::I16,
            Self::I32 => TypeId::I32,
            Self::I64 => TypeId::I64,
            Self::U8 => TypeId::U8,
            Self::U16 => TypeId::U16,
            Self::U32 => TypeId::U32,
            Self::U64 => TypeId::U64,
            Self::F32 => TypeId::F32,
            Self::F64 => TypeId::F64,
            Self::String => TypeId::STRING,
        }
    }

    /// Returns the type path used for registration.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "String",
        }
    }

    /// Returns `true` for integer and floating point kinds.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, Self::F32 | Self::F64)
    }

    /// Returns `true` for signed and unsigned integer kinds.
    #[inline]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    /// Inclusive bounds of an integer kind as `i128`.
    pub(crate) const fn integer_bounds(self) -> Option<(i128, i128)> {
        match self {
            Self::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            Self::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            Self::I32 => Some((i32::MIN as i128, i32::MAX as i128)),
            Self::I64 => Some((i64::MIN as i128, i64::MAX as i128)),
            Self::U8 => Some((0, u8::MAX as i128)),
            Self::U16 => Some((0, u16::MAX as i128)),
            Self::U32 => Some((0, u32::MAX as i128)),
            Self::U64 => Some((0, u64::MAX as i128)),
            _ => None,
        }
    }

    #[inline]
    pub(crate) const fn is_unsigned(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.path())
    }
}

// -----------------------------------------------------------------------------
// PrimitiveInfo

/// Type information of a builtin simple type.
#[derive(Debug, Clone)]
pub struct PrimitiveInfo {
    ty: Type,
    kind: PrimitiveKind,
}

impl PrimitiveInfo {
    pub(crate) fn new(kind: PrimitiveKind) -> Self {
        Self {
            ty: Type::new(kind.type_id(), kind.path().into()),
            kind,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::PrimitiveKind;

    #[test]
    fn registration_order_matches_ids() {
        for (index, kind) in PrimitiveKind::ALL.iter().enumerate() {
            assert_eq!(kind.type_id().index(), index + 1);
        }
    }

    #[test]
    fn numeric_classification() {
        assert!(PrimitiveKind::U16.is_integer());
        assert!(PrimitiveKind::F32.is_numeric());
        assert!(!PrimitiveKind::F32.is_integer());
        assert!(!PrimitiveKind::String.is_numeric());
        assert_eq!(PrimitiveKind::U8.integer_bounds(), Some((0, 255)));
    }
}
