use core::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::hash::HashMap;
use crate::info::TypeId;
use crate::value::Value;

#[derive(Default)]
struct Entries {
    keys: Vec<Arc<str>>,
    values: Vec<Value>,
    indices: HashMap<Arc<str>, usize>,
}

impl Entries {
    fn insert(&mut self, key: Arc<str>, value: Value) {
        if let Some(&index) = self.indices.get(&key) {
            self.values[index] = value;
        } else {
            self.indices.insert(key.clone(), self.keys.len());
            self.keys.push(key);
            self.values.push(value);
        }
    }

    fn position_ignore_case(&self, key: &str) -> Option<usize> {
        match self.indices.get(key) {
            Some(&index) => Some(index),
            None => self.keys.iter().position(|k| k.eq_ignore_ascii_case(key)),
        }
    }
}

struct DictionaryData {
    ty: TypeId,
    entries: RwLock<Entries>,
}

/// A shared string-keyed map.
///
/// Entries keep their insertion order. Lookups come in an exact and a
/// case-insensitive flavour, the latter prefers an exact match.
///
/// # Examples
///
/// ```
/// use vc_schema::info::TypeId;
/// use vc_schema::registry::TypeRegistry;
/// use vc_schema::value::DictionaryRef;
///
/// let mut registry = TypeRegistry::new();
/// let ty = registry.dictionary_of(TypeId::STRING).unwrap();
///
/// let address = DictionaryRef::new(ty);
/// address.insert("Line1", "A");
/// address.insert("Line2", "B");
///
/// assert_eq!(address.get_ignore_case("line2").unwrap().as_str(), Some("B"));
/// assert_eq!(address.keys().len(), 2);
/// ```
#[derive(Clone)]
pub struct DictionaryRef(Arc<DictionaryData>);

impl DictionaryRef {
    /// Creates an empty dictionary of the given dictionary type.
    pub fn new(ty: TypeId) -> Self {
        Self(Arc::new(DictionaryData {
            ty,
            entries: RwLock::new(Entries::default()),
        }))
    }

    /// Creates a dictionary from key-value pairs, later keys overwrite earlier ones.
    pub fn from_entries<K, V>(ty: TypeId, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Arc<str>>,
        V: Into<Value>,
    {
        let mut inner = Entries::default();
        for (key, value) in entries {
            inner.insert(key.into(), value.into());
        }
        Self(Arc::new(DictionaryData {
            ty,
            entries: RwLock::new(inner),
        }))
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.0.ty
    }

    pub fn len(&self) -> usize {
        self.read(|entries| entries.keys.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts or replaces an entry.
    pub fn insert(&self, key: impl Into<Arc<str>>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        self.0
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    /// Returns the value of the entry with exactly this key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read(|entries| {
            entries
                .indices
                .get(key)
                .map(|&index| entries.values[index].clone())
        })
    }

    /// Returns the value of the first entry whose key equals `key` ignoring ASCII case.
    pub fn get_ignore_case(&self, key: &str) -> Option<Value> {
        self.read(|entries| {
            entries
                .position_ignore_case(key)
                .map(|index| entries.values[index].clone())
        })
    }

    /// Returns `true` if a key equals `key` ignoring ASCII case.
    pub fn contains_key_ignore_case(&self, key: &str) -> bool {
        self.read(|entries| entries.position_ignore_case(key).is_some())
    }

    /// Returns `true` if some key starts with `prefix` ignoring ASCII case.
    pub fn has_prefix_ignore_case(&self, prefix: &str) -> bool {
        self.read(|entries| {
            entries
                .keys
                .iter()
                .any(|key| starts_with_ignore_case(key, prefix))
        })
    }

    /// Returns the entries whose key starts with `prefix` (ignoring ASCII case),
    /// with the prefix removed, in insertion order.
    pub fn entries_with_prefix(&self, prefix: &str) -> Vec<(Arc<str>, Value)> {
        self.read(|entries| {
            entries
                .keys
                .iter()
                .zip(entries.values.iter())
                .filter(|(key, _)| starts_with_ignore_case(key, prefix))
                .map(|(key, value)| (Arc::from(&key[prefix.len()..]), value.clone()))
                .collect()
        })
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> Vec<Arc<str>> {
        self.read(|entries| entries.keys.clone())
    }

    /// Returns clones of all entries in insertion order.
    pub fn entries(&self) -> Vec<(Arc<str>, Value)> {
        self.read(|entries| {
            entries
                .keys
                .iter()
                .cloned()
                .zip(entries.values.iter().cloned())
                .collect()
        })
    }

    /// Removes every entry, keeping the dictionary's identity.
    pub fn clear(&self) {
        *self.0.entries.write().unwrap_or_else(PoisonError::into_inner) = Entries::default();
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    fn read<R>(&self, func: impl FnOnce(&Entries) -> R) -> R {
        func(&self.0.entries.read().unwrap_or_else(PoisonError::into_inner))
    }
}

fn starts_with_ignore_case(key: &str, prefix: &str) -> bool {
    key.len() >= prefix.len()
        && key.is_char_boundary(prefix.len())
        && key[..prefix.len()].eq_ignore_ascii_case(prefix)
}

impl fmt::Debug for DictionaryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|entries| {
            let mut map = f.debug_map();
            for (key, value) in entries.keys.iter().zip(entries.values.iter()) {
                match value {
                    Value::List(inner) => map.entry(key, &format_args!("List@{:#x}", inner.address())),
                    Value::Dictionary(inner) => {
                        map.entry(key, &format_args!("Dictionary@{:#x}", inner.address()))
                    }
                    other => map.entry(key, other),
                };
            }
            map.finish()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DictionaryRef;
    use crate::Value;
    use crate::info::TypeId;

    #[test]
    fn insertion_order_and_overwrite() {
        let dict = DictionaryRef::from_entries(TypeId::ANY, [("b", 1), ("a", 2), ("b", 3)]);
        let keys: Vec<_> = dict.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(dict.get("b"), Some(Value::Int(3)));
    }

    #[test]
    fn case_insensitive_lookup_prefers_exact() {
        let dict = DictionaryRef::from_entries(TypeId::ANY, [("NAME", "upper"), ("name", "lower")]);
        assert_eq!(dict.get_ignore_case("name"), Some(Value::from("lower")));
        assert_eq!(dict.get_ignore_case("Name"), Some(Value::from("upper")));
        assert!(dict.get("Name").is_none());
    }

    #[test]
    fn prefixed_entries() {
        let dict = DictionaryRef::from_entries(
            TypeId::ANY,
            [("Address.Line1", "A"), ("address.Line2", "B"), ("Name", "C")],
        );
        assert!(dict.has_prefix_ignore_case("Address."));
        let nested = dict.entries_with_prefix("ADDRESS.");
        assert_eq!(nested.len(), 2);
        assert_eq!(&*nested[1].0, "Line2");
    }
}
