use core::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::info::TypeId;
use crate::value::Value;

struct ListData {
    ty: TypeId,
    items: RwLock<Vec<Value>>,
}

/// A shared sequence of values.
///
/// `ty` is the list type (obtained from [`TypeRegistry::list_of`]), not the
/// element type.
///
/// [`TypeRegistry::list_of`]: crate::registry::TypeRegistry::list_of
#[derive(Clone)]
pub struct ListRef(Arc<ListData>);

impl ListRef {
    /// Creates a list of the given list type.
    pub fn new(ty: TypeId, items: Vec<Value>) -> Self {
        Self(Arc::new(ListData {
            ty,
            items: RwLock::new(items),
        }))
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.0.ty
    }

    pub fn len(&self) -> usize {
        self.0.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a clone of the element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        let items = self.0.items.read().unwrap_or_else(PoisonError::into_inner);
        items.get(index).cloned()
    }

    pub fn push(&self, value: Value) {
        self.0
            .items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    /// Replaces the whole content, keeping the list's identity.
    pub fn replace(&self, items: Vec<Value>) {
        *self.0.items.write().unwrap_or_else(PoisonError::into_inner) = items;
    }

    /// Returns clones of all elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self.0.items.read().unwrap_or_else(PoisonError::into_inner);
        let mut list = f.debug_list();
        for item in items.iter() {
            match item {
                // Nested collections are summarized to keep self-references printable.
                Value::List(inner) => list.entry(&format_args!("List@{:#x}", inner.address())),
                Value::Dictionary(inner) => {
                    list.entry(&format_args!("Dictionary@{:#x}", inner.address()))
                }
                other => list.entry(other),
            };
        }
        list.finish()
    }
}
