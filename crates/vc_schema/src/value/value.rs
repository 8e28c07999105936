use core::fmt;
use std::sync::Arc;

use crate::info::TypeId;
use crate::value::{DictionaryRef, ListRef, ObjectRef};

// -----------------------------------------------------------------------------
// EnumValue

/// A variant of a registered fieldless enum, stored by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub ty: TypeId,
    pub index: u32,
}

// -----------------------------------------------------------------------------
// Value

/// A dynamically typed value.
///
/// Integers keep their sign class only (`Int` or `UInt`), the declared type
/// of the slot holding them decides the width.
///
/// # Equality
///
/// Simple values compare by content (`Int`, `UInt` and `Float` compare
/// numerically with each other), reference values compare by identity.
///
/// # Examples
///
/// ```
/// use vc_schema::Value;
///
/// assert_eq!(Value::from(3_i32), Value::from(3_u64));
/// assert_eq!(Value::from("x"), Value::String("x".into()));
/// assert!(Value::Null.is_null());
/// ```
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    String(Arc<str>),
    Enum(EnumValue),
    Object(ObjectRef),
    List(ListRef),
    Dictionary(DictionaryRef),
}

impl Value {
    /// Returns `true` for `Null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for values which are not shared references.
    #[inline]
    pub fn is_simple(&self) -> bool {
        !matches!(self, Self::Object(_) | Self::List(_) | Self::Dictionary(_))
    }

    /// Returns `true` for `Null`, `false`, zero numbers, `'\0'` and the empty string.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(value) => !*value,
            Self::Int(value) => *value == 0,
            Self::UInt(value) => *value == 0,
            Self::Float(value) => *value == 0.0,
            Self::Char(value) => *value == '\0',
            Self::String(value) => value.is_empty(),
            Self::Enum(value) => value.index == 0,
            Self::Object(_) | Self::List(_) | Self::Dictionary(_) => false,
        }
    }

    /// Returns `true` for numeric zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(value) => *value == 0,
            Self::UInt(value) => *value == 0,
            Self::Float(value) => *value == 0.0,
            _ => false,
        }
    }

    /// Returns the runtime type of the value.
    ///
    /// Integers report `i64`/`u64` and floats `f64`, `Null` has no type.
    pub fn runtime_type(&self) -> Option<TypeId> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(TypeId::BOOL),
            Self::Int(_) => Some(TypeId::I64),
            Self::UInt(_) => Some(TypeId::U64),
            Self::Float(_) => Some(TypeId::F64),
            Self::Char(_) => Some(TypeId::CHAR),
            Self::String(_) => Some(TypeId::STRING),
            Self::Enum(value) => Some(value.ty),
            Self::Object(object) => Some(object.type_id()),
            Self::List(list) => Some(list.type_id()),
            Self::Dictionary(dictionary) => Some(dictionary.type_id()),
        }
    }

    /// Returns `true` if both values are the same reference, or equal simple values.
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Dictionary(a), Self::Dictionary(b)) => a.ptr_eq(b),
            (a, b) => a.is_simple() && b.is_simple() && a == b,
        }
    }

    /// Returns the address of a reference value, used as an identity key.
    pub fn address(&self) -> Option<usize> {
        match self {
            Self::Object(object) => Some(object.address()),
            Self::List(list) => Some(list.address()),
            Self::Dictionary(dictionary) => Some(dictionary.address()),
            _ => None,
        }
    }

    /// Compares two identifier values, tolerating numeric/text differences.
    ///
    /// `Int(5)`, `UInt(5)` and `String("5")` all identify the same element.
    pub fn matches_identifier(&self, other: &Self) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        if self == other {
            return true;
        }
        match (self, other) {
            (Self::String(text), number) | (number, Self::String(text)) => {
                number.display_simple().is_some_and(|shown| shown == **text)
            }
            _ => false,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::UInt(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Returns the value as `u64` if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(value) => u64::try_from(*value).ok(),
            Self::UInt(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as `f64` for every numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::UInt(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Self::List(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_dictionary(&self) -> Option<&DictionaryRef> {
        match self {
            Self::Dictionary(value) => Some(value),
            _ => None,
        }
    }

    /// A short description of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "a bool",
            Self::Int(_) => "a signed integer",
            Self::UInt(_) => "an unsigned integer",
            Self::Float(_) => "a float",
            Self::Char(_) => "a char",
            Self::String(_) => "a string",
            Self::Enum(_) => "an enum variant",
            Self::Object(_) => "an object",
            Self::List(_) => "a list",
            Self::Dictionary(_) => "a dictionary",
        }
    }

    // Text form of a simple value without registry access (enums excluded).
    pub(crate) fn display_simple(&self) -> Option<String> {
        match self {
            Self::Bool(value) => Some(value.to_string()),
            Self::Int(value) => Some(value.to_string()),
            Self::UInt(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::Char(value) => Some(value.to_string()),
            Self::String(value) => Some(value.to_string()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Int(a), Self::UInt(b)) | (Self::UInt(b), Self::Int(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Self::Float(a), other) | (other, Self::Float(a)) => {
                other.as_f64().is_some_and(|b| *a == b)
            }
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Dictionary(a), Self::Dictionary(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::UInt(value) => write!(f, "{value}u"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Char(value) => write!(f, "{value:?}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Enum(value) => write!(f, "Enum({}#{})", value.ty, value.index),
            Self::Object(value) => fmt::Debug::fmt(value, f),
            Self::List(value) => fmt::Debug::fmt(value, f),
            Self::Dictionary(value) => fmt::Debug::fmt(value, f),
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions

macro_rules! impl_from_int {
    ($variant:ident as $repr:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value as $repr)
                }
            }
        )*
    };
}

impl_from_int!(Int as i64: i8, i16, i32, i64);
impl_from_int!(UInt as u64: u8, u16, u32, u64);

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<char> for Value {
    #[inline]
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(value: f32) -> Self {
        Self::Float(value as f64)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<ObjectRef> for Value {
    #[inline]
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl From<ListRef> for Value {
    #[inline]
    fn from(value: ListRef) -> Self {
        Self::List(value)
    }
}

impl From<DictionaryRef> for Value {
    #[inline]
    fn from(value: DictionaryRef) -> Self {
        Self::Dictionary(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
