use core::fmt;
use std::sync::Arc;

// -----------------------------------------------------------------------------
// TypeId

/// A dense type identifier assigned by a [`TypeRegistry`].
///
/// Ids are only meaningful for the registry that produced them. Builtin
/// types are registered first by [`TypeRegistry::new`] and therefore have
/// the fixed ids exposed as associated constants.
///
/// [`TypeRegistry`]: crate::registry::TypeRegistry
/// [`TypeRegistry::new`]: crate::registry::TypeRegistry::new
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub const ANY: Self = Self(0);
    pub const BOOL: Self = Self(1);
    pub const CHAR: Self = Self(2);
    pub const I8: Self = Self(3);
    pub const I16: Self = Self(4);
    pub const I32: Self = Self(5);
    pub const I64: Self = Self(6);
    pub const U8: Self = Self(7);
    pub const U16: Self = Self(8);
    pub const U32: Self = Self(9);
    pub const U64: Self = Self(10);
    pub const F32: Self = Self(11);
    pub const F64: Self = Self(12);
    pub const STRING: Self = Self(13);

    /// Number of builtin types.
    pub(crate) const BUILTIN_COUNT: u32 = 14;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the index of this id inside its registry.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` for the fixed builtin ids.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::BUILTIN_COUNT
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// -----------------------------------------------------------------------------
// Type

/// The identity of a registered type: its [`TypeId`], full path and short name.
///
/// The short name is the last `::` segment of the path with generics kept,
/// e.g. `app::dto::CustomerDto` has the name `CustomerDto`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Type {
    id: TypeId,
    path: Arc<str>,
    name: Arc<str>,
}

impl Type {
    pub(crate) fn new(id: TypeId, path: Arc<str>) -> Self {
        let name: Arc<str> = Arc::from(short_name(&path));
        Self { id, path, name }
    }

    /// Returns the [`TypeId`].
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type path, e.g. `app::dto::CustomerDto`.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a shared handle to the full type path.
    #[inline]
    pub fn path_arc(&self) -> &Arc<str> {
        &self.path
    }

    /// Returns the short name, e.g. `CustomerDto`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.path, self.id.0)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.path)
    }
}

// Last path segment outside of generic brackets.
fn short_name(path: &str) -> &str {
    let mut depth = 0_usize;
    let mut start = 0_usize;
    let bytes = path.as_bytes();
    let mut index = 0_usize;
    while index < bytes.len() {
        match bytes[index] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(index + 1) == Some(&b':') => {
                start = index + 2;
                index += 1;
            }
            _ => {}
        }
        index += 1;
    }
    &path[start..]
}

#[cfg(test)]
mod tests {
    use super::{Type, TypeId, short_name};

    #[test]
    fn short_names() {
        assert_eq!(short_name("app::dto::CustomerDto"), "CustomerDto");
        assert_eq!(short_name("Vec<app::Order>"), "Vec<app::Order>");
        assert_eq!(short_name("app::Page<app::Order>"), "Page<app::Order>");
        assert_eq!(short_name("i32"), "i32");
    }

    #[test]
    fn type_identity() {
        let ty = Type::new(TypeId::from_index(20), "shop::Order".into());
        assert_eq!(ty.name(), "Order");
        assert_eq!(ty.path(), "shop::Order");
        assert!(!ty.id().is_builtin());
        assert!(TypeId::STRING.is_builtin());
    }
}
