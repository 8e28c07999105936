use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;

use crate::SchemaError;
use crate::info::TypeId;
use crate::registry::TypeRegistry;
use crate::value::{DictionaryRef, ListRef, Value};

// -----------------------------------------------------------------------------
// Mappable

/// A Rust type which can be described to a [`TypeRegistry`] and moved in and
/// out of [`Value`]s.
///
/// This is the bridge between typed code and the mapping engine, which only
/// works with [`Value`]s. Implement it with `#[derive(Mappable)]`:
///
/// ```
/// use vc_schema::{Mappable, Value};
/// use vc_schema::registry::TypeRegistry;
///
/// #[derive(Mappable, Debug, PartialEq)]
/// #[mappable(type_path = "crm::Address")]
/// struct Address {
///     line1: String,
///     #[mappable(rename = "PostCode")]
///     post_code: Option<String>,
/// }
///
/// let mut registry = TypeRegistry::new();
/// let id = Address::register(&mut registry).unwrap();
/// assert_eq!(registry.path_of(id), "crm::Address");
///
/// let address = Address { line1: "1 Main St".into(), post_code: None };
/// let value = address.to_value(&registry).unwrap();
/// assert_eq!(value.as_object().unwrap().get_member("postcode"), Some(Value::Null));
/// assert_eq!(Address::from_value(&value).unwrap(), address);
/// ```
///
/// # Derive attributes
///
/// On the type:
///
/// - `type_path = "..."`: the registered path, defaults to `module_path!()::Ident`.
/// - `abstract_type`: instances of exactly this type cannot be created.
/// - `auto_register`: submit the type for [`TypeRegistry::auto_register`].
///
/// On a field:
///
/// - `rename = "..."`: the member name, defaults to the field name.
/// - `skip`: not a member, restored with [`Default`].
/// - `readonly`: the member can be read but is never assigned by the mapper.
/// - `constructor`: the member is only populated when an instance is created.
/// - `base`: the field holds the base struct, its members are inherited.
pub trait Mappable: Sized {
    /// Registers the type (and the types it refers to), returns its id.
    ///
    /// Registering an already registered type returns the existing id.
    fn register(registry: &mut TypeRegistry) -> Result<TypeId, SchemaError>;

    /// Returns the id of the type in a registry it was registered with.
    fn type_id(registry: &TypeRegistry) -> Result<TypeId, SchemaError>;

    /// Converts `self` into a [`Value`].
    fn to_value(&self, registry: &TypeRegistry) -> Result<Value, SchemaError>;

    /// Reads a value of this type from a [`Value`].
    fn from_value(value: &Value) -> Result<Self, SchemaError>;
}

pub fn mismatch(expected: &str, found: &Value) -> SchemaError {
    SchemaError::Mismatch {
        expected: Arc::from(expected),
        found: found.kind_name(),
    }
}

// -----------------------------------------------------------------------------
// Primitives

macro_rules! impl_mappable_int {
    ($id:ident, $as:ident: $($ty:ty),*) => {
        $(
            impl Mappable for $ty {
                #[inline]
                fn register(_: &mut TypeRegistry) -> Result<TypeId, SchemaError> {
                    Ok(TypeId::$id)
                }

                #[inline]
                fn type_id(_: &TypeRegistry) -> Result<TypeId, SchemaError> {
                    Ok(TypeId::$id)
                }

                #[inline]
                fn to_value(&self, _: &TypeRegistry) -> Result<Value, SchemaError> {
                    Ok(Value::from(*self))
                }

                fn from_value(value: &Value) -> Result<Self, SchemaError> {
                    value
                        .$as()
                        .and_then(|number| <$ty>::try_from(number).ok())
                        .ok_or_else(|| mismatch(stringify!($ty), value))
                }
            }
        )*
    };
}

macro_rules! impl_mappable_int_ids {
    ($($ty:ty => $id:ident, $as:ident;)*) => {
        $( impl_mappable_int!($id, $as: $ty); )*
    };
}

impl_mappable_int_ids! {
    i8 => I8, as_i64;
    i16 => I16, as_i64;
    i32 => I32, as_i64;
    i64 => I64, as_i64;
    u8 => U8, as_u64;
    u16 => U16, as_u64;
    u32 => U32, as_u64;
    u64 => U64, as_u64;
}

macro_rules! impl_mappable_simple {
    ($ty:ty, $id:ident, |$value:ident| $read:expr) => {
        impl Mappable for $ty {
            #[inline]
            fn register(_: &mut TypeRegistry) -> Result<TypeId, SchemaError> {
                Ok(TypeId::$id)
            }

            #[inline]
            fn type_id(_: &TypeRegistry) -> Result<TypeId, SchemaError> {
                Ok(TypeId::$id)
            }

            #[inline]
            fn to_value(&self, _: &TypeRegistry) -> Result<Value, SchemaError> {
                Ok(Value::from(self.clone()))
            }

            fn from_value($value: &Value) -> Result<Self, SchemaError> {
                $read.ok_or_else(|| mismatch(stringify!($ty), $value))
            }
        }
    };
}

impl_mappable_simple!(bool, BOOL, |value| value.as_bool());
impl_mappable_simple!(f64, F64, |value| value.as_f64());
impl_mappable_simple!(f32, F32, |value| value.as_f64().map(|number| number as f32));
impl_mappable_simple!(String, STRING, |value| value.as_str().map(String::from));
impl_mappable_simple!(char, CHAR, |value| match value {
    Value::Char(ch) => Some(*ch),
    _ => None,
});

impl Mappable for Value {
    #[inline]
    fn register(_: &mut TypeRegistry) -> Result<TypeId, SchemaError> {
        Ok(TypeId::ANY)
    }

    #[inline]
    fn type_id(_: &TypeRegistry) -> Result<TypeId, SchemaError> {
        Ok(TypeId::ANY)
    }

    #[inline]
    fn to_value(&self, _: &TypeRegistry) -> Result<Value, SchemaError> {
        Ok(self.clone())
    }

    #[inline]
    fn from_value(value: &Value) -> Result<Self, SchemaError> {
        Ok(value.clone())
    }
}

// -----------------------------------------------------------------------------
// Containers

impl<T: Mappable> Mappable for Option<T> {
    fn register(registry: &mut TypeRegistry) -> Result<TypeId, SchemaError> {
        let inner = T::register(registry)?;
        registry.optional_of(inner)
    }

    fn type_id(registry: &TypeRegistry) -> Result<TypeId, SchemaError> {
        let inner = T::type_id(registry)?;
        registry
            .find_optional(inner)
            .ok_or_else(|| SchemaError::UnknownPath(format!("Option<{}>", registry.path_of(inner)).into()))
    }

    fn to_value(&self, registry: &TypeRegistry) -> Result<Value, SchemaError> {
        match self {
            Some(inner) => inner.to_value(registry),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Mappable> Mappable for Box<T> {
    #[inline]
    fn register(registry: &mut TypeRegistry) -> Result<TypeId, SchemaError> {
        T::register(registry)
    }

    #[inline]
    fn type_id(registry: &TypeRegistry) -> Result<TypeId, SchemaError> {
        T::type_id(registry)
    }

    #[inline]
    fn to_value(&self, registry: &TypeRegistry) -> Result<Value, SchemaError> {
        T::to_value(self, registry)
    }

    fn from_value(value: &Value) -> Result<Self, SchemaError> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: Mappable> Mappable for Vec<T> {
    fn register(registry: &mut TypeRegistry) -> Result<TypeId, SchemaError> {
        let element = T::register(registry)?;
        registry.list_of(element)
    }

    fn type_id(registry: &TypeRegistry) -> Result<TypeId, SchemaError> {
        let element = T::type_id(registry)?;
        registry
            .find_list(element)
            .ok_or_else(|| SchemaError::UnknownPath(format!("Vec<{}>", registry.path_of(element)).into()))
    }

    fn to_value(&self, registry: &TypeRegistry) -> Result<Value, SchemaError> {
        let items = self
            .iter()
            .map(|item| item.to_value(registry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::List(ListRef::new(Self::type_id(registry)?, items)))
    }

    fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let list = value.as_list().ok_or_else(|| mismatch("Vec", value))?;
        list.snapshot().iter().map(T::from_value).collect()
    }
}

fn dictionary_type_id<T: Mappable>(registry: &TypeRegistry) -> Result<TypeId, SchemaError> {
    let value = T::type_id(registry)?;
    registry.find_dictionary(value).ok_or_else(|| {
        SchemaError::UnknownPath(format!("Map<String, {}>", registry.path_of(value)).into())
    })
}

impl<T: Mappable, S: BuildHasher + Default> Mappable for HashMap<String, T, S> {
    fn register(registry: &mut TypeRegistry) -> Result<TypeId, SchemaError> {
        let value = T::register(registry)?;
        registry.dictionary_of(value)
    }

    fn type_id(registry: &TypeRegistry) -> Result<TypeId, SchemaError> {
        dictionary_type_id::<T>(registry)
    }

    fn to_value(&self, registry: &TypeRegistry) -> Result<Value, SchemaError> {
        let dictionary = DictionaryRef::new(Self::type_id(registry)?);
        for (key, value) in self {
            dictionary.insert(key.as_str(), value.to_value(registry)?);
        }
        Ok(Value::Dictionary(dictionary))
    }

    fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let dictionary = value.as_dictionary().ok_or_else(|| mismatch("HashMap", value))?;
        dictionary
            .entries()
            .into_iter()
            .map(|(key, value)| Ok((key.to_string(), T::from_value(&value)?)))
            .collect()
    }
}

impl<T: Mappable> Mappable for BTreeMap<String, T> {
    fn register(registry: &mut TypeRegistry) -> Result<TypeId, SchemaError> {
        let value = T::register(registry)?;
        registry.dictionary_of(value)
    }

    fn type_id(registry: &TypeRegistry) -> Result<TypeId, SchemaError> {
        dictionary_type_id::<T>(registry)
    }

    fn to_value(&self, registry: &TypeRegistry) -> Result<Value, SchemaError> {
        let dictionary = DictionaryRef::new(Self::type_id(registry)?);
        for (key, value) in self {
            dictionary.insert(key.as_str(), value.to_value(registry)?);
        }
        Ok(Value::Dictionary(dictionary))
    }

    fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let dictionary = value.as_dictionary().ok_or_else(|| mismatch("BTreeMap", value))?;
        dictionary
            .entries()
            .into_iter()
            .map(|(key, value)| Ok((key.to_string(), T::from_value(&value)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::info::TypeId;
    use crate::registry::TypeRegistry;
    use crate::{Mappable, SchemaError, Value};

    #[test]
    fn integers_check_range() {
        assert_eq!(u8::from_value(&Value::Int(255)), Ok(255));
        assert!(matches!(u8::from_value(&Value::Int(256)), Err(SchemaError::Mismatch { .. })));
        assert_eq!(i64::from_value(&Value::UInt(3)), Ok(3));
    }

    #[test]
    fn containers_register_their_element() {
        let mut registry = TypeRegistry::new();
        let id = <Vec<Option<i32>>>::register(&mut registry).unwrap();
        assert_eq!(registry.path_of(id), "Vec<Option<i32>>");
        assert_eq!(<Vec<Option<i32>>>::type_id(&registry), Ok(id));

        let value = vec![Some(1), None].to_value(&registry).unwrap();
        assert_eq!(value.as_list().unwrap().get(1), Some(Value::Null));
        assert_eq!(<Vec<Option<i32>>>::from_value(&value), Ok(vec![Some(1), None]));
    }

    #[test]
    fn maps_become_dictionaries() {
        let mut registry = TypeRegistry::new();
        let id = <BTreeMap<String, u32>>::register(&mut registry).unwrap();

        let map = BTreeMap::from([("a".to_string(), 1_u32), ("b".to_string(), 2)]);
        let value = map.to_value(&registry).unwrap();
        let dictionary = value.as_dictionary().unwrap();
        assert_eq!(dictionary.type_id(), id);
        assert_eq!(dictionary.get("b"), Some(Value::UInt(2)));
        assert_eq!(<BTreeMap<String, u32>>::from_value(&value), Ok(map));
        assert_eq!(registry.dictionary_value_of(id), Some(TypeId::U32));
    }

    #[derive(Mappable, Debug, PartialEq)]
    #[mappable(type_path = "zoo::Animal", abstract_type)]
    struct Animal {
        name: String,
    }

    #[derive(Mappable, Debug, PartialEq)]
    #[mappable(type_path = "zoo::Diet")]
    enum Diet {
        Meat,
        #[mappable(rename = "Plants")]
        Vegetarian,
    }

    #[derive(Mappable, Debug, PartialEq)]
    #[mappable(type_path = "zoo::Dog")]
    struct Dog {
        #[mappable(base)]
        animal: Animal,
        #[mappable(readonly)]
        id: u32,
        diet: Diet,
        friend: Option<Box<Dog>>,
        #[mappable(skip)]
        scratch: Vec<u8>,
    }

    #[test]
    fn derived_struct_inherits_base_members() {
        let mut registry = TypeRegistry::new();
        let dog = Dog::register(&mut registry).unwrap();
        let animal = registry.id_of("zoo::Animal").unwrap();

        assert!(registry.is_subtype_of(dog, animal));
        assert!(registry.is_abstract(animal));

        let info = registry.get_struct(dog).unwrap();
        let names: Vec<_> = info.members().iter().map(|m| m.name()).collect();
        assert_eq!(names, ["name", "id", "diet", "friend"]);
        assert!(!info.member("id").unwrap().is_writable());
    }

    #[test]
    fn derived_values_round_trip() {
        let mut registry = TypeRegistry::new();
        Dog::register(&mut registry).unwrap();

        let rex = Dog {
            animal: Animal { name: "Rex".into() },
            id: 7,
            diet: Diet::Vegetarian,
            friend: None,
            scratch: vec![1],
        };
        let value = rex.to_value(&registry).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.get_member("Name"), Some(Value::from("Rex")));

        let back = Dog::from_value(&value).unwrap();
        assert_eq!(back.diet, Diet::Vegetarian);
        assert!(back.scratch.is_empty());
        assert_eq!(Diet::from_value(&Value::from("plants")), Ok(Diet::Vegetarian));
    }
}
