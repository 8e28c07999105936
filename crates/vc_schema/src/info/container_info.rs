use std::sync::Arc;

use crate::info::{Type, TypeId};

// -----------------------------------------------------------------------------
// EnumInfo

/// Type information of a fieldless enum.
#[derive(Debug, Clone)]
pub struct EnumInfo {
    ty: Type,
    variants: Box<[Arc<str>]>,
}

impl EnumInfo {
    pub(crate) fn new(ty: Type, variants: Box<[Arc<str>]>) -> Self {
        Self { ty, variants }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the variant names in declaration order.
    #[inline]
    pub fn variants(&self) -> &[Arc<str>] {
        &self.variants
    }

    #[inline]
    pub fn variant_name(&self, index: usize) -> Option<&str> {
        self.variants.get(index).map(AsRef::as_ref)
    }

    /// Returns the index of the variant, compared case-insensitively.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variants
            .iter()
            .position(|variant| variant.eq_ignore_ascii_case(name))
    }
}

// -----------------------------------------------------------------------------
// ListInfo

/// Type information of a sequence, e.g. `Vec<T>`.
#[derive(Debug, Clone)]
pub struct ListInfo {
    ty: Type,
    element: TypeId,
}

impl ListInfo {
    pub(crate) fn new(ty: Type, element: TypeId) -> Self {
        Self { ty, element }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the element type.
    #[inline]
    pub fn element(&self) -> TypeId {
        self.element
    }
}

// -----------------------------------------------------------------------------
// DictionaryInfo

/// Type information of a string-keyed map, e.g. `HashMap<String, T>`.
#[derive(Debug, Clone)]
pub struct DictionaryInfo {
    ty: Type,
    value: TypeId,
}

impl DictionaryInfo {
    pub(crate) fn new(ty: Type, value: TypeId) -> Self {
        Self { ty, value }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the entry value type.
    #[inline]
    pub fn value(&self) -> TypeId {
        self.value
    }
}

// -----------------------------------------------------------------------------
// OptionalInfo

/// Type information of a nullable wrapper, e.g. `Option<T>`.
#[derive(Debug, Clone)]
pub struct OptionalInfo {
    ty: Type,
    inner: TypeId,
}

impl OptionalInfo {
    pub(crate) fn new(ty: Type, inner: TypeId) -> Self {
        Self { ty, inner }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the wrapped type.
    #[inline]
    pub fn inner(&self) -> TypeId {
        self.inner
    }
}
