use std::sync::Arc;

use crate::info::{PrimitiveKind, TypeId, TypeInfo};
use crate::registry::TypeRegistry;
use crate::value::{EnumValue, Value};

// -----------------------------------------------------------------------------
// Static check

/// Returns `true` if a value declared as `from` may be converted to `to`.
///
/// The check is static: a `true` result does not promise that every value
/// converts (`"abc"` does not parse as `i32`), but a `false` result means no
/// value of `from` ever does.
///
/// - Identical and assignable types always convert.
/// - `Any` converts to everything and everything converts to `Any`.
/// - `Option<T>` converts like `T` on either side.
/// - Numbers convert to each other and to `bool`, range checked at runtime.
/// - Every simple type converts to `String`, `String` parses into every simple type.
/// - Enums convert to other enums by variant name, and to integers by index.
pub fn can_convert(registry: &TypeRegistry, from: TypeId, to: TypeId) -> bool {
    let from = registry.non_optional(from);
    let to = registry.non_optional(to);

    if from == to || from == TypeId::ANY || to == TypeId::ANY {
        return true;
    }
    if registry.is_assignable(from, to) {
        return true;
    }

    let (Some(from_info), Some(to_info)) = (registry.get(from), registry.get(to)) else {
        return false;
    };

    match (from_info, to_info) {
        (TypeInfo::Primitive(a), TypeInfo::Primitive(b)) => primitive_convertible(a.kind(), b.kind()),
        (TypeInfo::Enum(_), TypeInfo::Enum(_)) => true,
        (TypeInfo::Enum(_), TypeInfo::Primitive(b)) | (TypeInfo::Primitive(b), TypeInfo::Enum(_)) => {
            b.kind().is_integer() || b.kind() == PrimitiveKind::String
        }
        _ => false,
    }
}

fn primitive_convertible(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    use PrimitiveKind as K;

    match (from, to) {
        (_, K::String) | (K::String, _) => true,
        (K::Char, K::Char) => true,
        (K::Char, _) | (_, K::Char) => false,
        (K::Bool, b) => b == K::Bool || b.is_numeric(),
        (a, K::Bool) => a.is_numeric(),
        (a, b) => a.is_numeric() && b.is_numeric(),
    }
}

// -----------------------------------------------------------------------------
// Runtime conversion

/// Converts `value` to the type `to`.
///
/// Returns `None` if the value cannot be represented: a failed parse, an
/// integer out of range, an unknown variant name, or an unrelated reference
/// type. `Null` converts to `Null` for nullable targets only.
///
/// # Examples
///
/// ```
/// use vc_schema::Value;
/// use vc_schema::info::TypeId;
/// use vc_schema::registry::TypeRegistry;
/// use vc_schema::value::convert;
///
/// let registry = TypeRegistry::new();
///
/// assert_eq!(convert(&registry, &Value::from("42"), TypeId::U8), Some(Value::UInt(42)));
/// assert_eq!(convert(&registry, &Value::Int(-1), TypeId::U8), None);
/// assert_eq!(convert(&registry, &Value::Float(2.5), TypeId::STRING), Some(Value::from("2.5")));
/// ```
pub fn convert(registry: &TypeRegistry, value: &Value, to: TypeId) -> Option<Value> {
    if to == TypeId::ANY {
        return Some(value.clone());
    }
    let info = registry.get(to)?;

    if value.is_null() {
        return info.is_nullable().then_some(Value::Null);
    }

    match info {
        TypeInfo::Any(_) => Some(value.clone()),
        TypeInfo::Optional(optional) => convert(registry, value, optional.inner()),
        TypeInfo::Primitive(primitive) => to_primitive(registry, value, primitive.kind()),
        TypeInfo::Enum(info) => {
            let index = match value {
                Value::Enum(enum_value) if enum_value.ty == to => return Some(value.clone()),
                Value::Enum(enum_value) => {
                    let name = registry.get(enum_value.ty)?.as_enum()?.variant_name(enum_value.index as usize)?;
                    info.index_of(name)?
                }
                Value::String(text) => match info.index_of(text.trim()) {
                    Some(index) => index,
                    None => text.trim().parse::<usize>().ok()?,
                },
                other => usize::try_from(other.as_u64()?).ok()?,
            };
            (index < info.variants().len()).then(|| {
                Value::Enum(EnumValue {
                    ty: to,
                    index: index as u32,
                })
            })
        }
        TypeInfo::Struct(_) | TypeInfo::List(_) | TypeInfo::Dictionary(_) => {
            let runtime = value.runtime_type()?;
            registry.is_assignable(runtime, to).then(|| value.clone())
        }
    }
}

fn to_primitive(registry: &TypeRegistry, value: &Value, kind: PrimitiveKind) -> Option<Value> {
    match kind {
        PrimitiveKind::String => to_text(registry, value).map(Value::String),
        PrimitiveKind::Bool => match value {
            Value::Bool(flag) => Some(Value::Bool(*flag)),
            Value::String(text) => parse_bool(text.trim()).map(Value::Bool),
            other => other.as_f64().map(|number| Value::Bool(number != 0.0)),
        },
        PrimitiveKind::Char => match value {
            Value::Char(ch) => Some(Value::Char(*ch)),
            Value::String(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some(Value::Char(ch)),
                    _ => None,
                }
            }
            _ => None,
        },
        PrimitiveKind::F32 | PrimitiveKind::F64 => {
            let number = match value {
                Value::Bool(flag) => f64::from(u8::from(*flag)),
                Value::String(text) => text.trim().parse::<f64>().ok()?,
                other => other.as_f64()?,
            };
            if kind == PrimitiveKind::F32 && number.is_finite() && number.abs() > f64::from(f32::MAX) {
                return None;
            }
            Some(Value::Float(number))
        }
        integer => {
            let (min, max) = integer.integer_bounds()?;
            let number: i128 = match value {
                Value::Int(number) => i128::from(*number),
                Value::UInt(number) => i128::from(*number),
                Value::Bool(flag) => i128::from(*flag),
                Value::Enum(enum_value) => i128::from(enum_value.index),
                Value::Float(number) => {
                    if number.fract() != 0.0 || !number.is_finite() {
                        return None;
                    }
                    *number as i128
                }
                Value::String(text) => text.trim().parse::<i128>().ok()?,
                _ => return None,
            };
            if number < min || number > max {
                return None;
            }
            if integer.is_unsigned() {
                u64::try_from(number).ok().map(Value::UInt)
            } else {
                i64::try_from(number).ok().map(Value::Int)
            }
        }
    }
}

fn to_text(registry: &TypeRegistry, value: &Value) -> Option<Arc<str>> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Enum(enum_value) => registry
            .get(enum_value.ty)?
            .as_enum()?
            .variants()
            .get(enum_value.index as usize)
            .cloned(),
        other => other.display_simple().map(Arc::from),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{can_convert, convert};
    use crate::Value;
    use crate::info::TypeId;
    use crate::registry::TypeRegistry;
    use crate::value::EnumValue;

    #[test]
    fn static_checks() {
        let mut registry = TypeRegistry::new();
        let color = registry.register_enum("paint::Color", ["Red", "Green"]).unwrap();
        let opt_i32 = registry.optional_of(TypeId::I32).unwrap();

        assert!(can_convert(&registry, TypeId::I32, TypeId::F64));
        assert!(can_convert(&registry, TypeId::STRING, TypeId::U8));
        assert!(can_convert(&registry, opt_i32, TypeId::I64));
        assert!(can_convert(&registry, color, TypeId::STRING));
        assert!(!can_convert(&registry, TypeId::CHAR, TypeId::I32));

        let list = registry.list_of(TypeId::I32).unwrap();
        assert!(!can_convert(&registry, list, TypeId::I32));
    }

    #[test]
    fn integers_are_range_checked() {
        let registry = TypeRegistry::new();
        assert_eq!(convert(&registry, &Value::Int(300), TypeId::U8), None);
        assert_eq!(convert(&registry, &Value::Int(200), TypeId::U8), Some(Value::UInt(200)));
        assert_eq!(convert(&registry, &Value::Float(3.0), TypeId::I16), Some(Value::Int(3)));
        assert_eq!(convert(&registry, &Value::Float(3.5), TypeId::I16), None);
        assert_eq!(convert(&registry, &Value::from(" 12 "), TypeId::I32), Some(Value::Int(12)));
    }

    #[test]
    fn null_only_for_nullable_targets() {
        let mut registry = TypeRegistry::new();
        let opt = registry.optional_of(TypeId::I32).unwrap();
        assert_eq!(convert(&registry, &Value::Null, TypeId::I32), None);
        assert_eq!(convert(&registry, &Value::Null, opt), Some(Value::Null));
        assert_eq!(convert(&registry, &Value::from("7"), opt), Some(Value::Int(7)));
    }

    #[test]
    fn enums_by_name_and_index() {
        let mut registry = TypeRegistry::new();
        let color = registry.register_enum("paint::Color", ["Red", "Green"]).unwrap();
        let shade = registry.register_enum("paint::Shade", ["Blue", "Green"]).unwrap();

        let green = Value::Enum(EnumValue { ty: color, index: 1 });
        assert_eq!(convert(&registry, &Value::from("green"), color), Some(green.clone()));
        assert_eq!(convert(&registry, &Value::UInt(1), color), Some(green.clone()));
        assert_eq!(convert(&registry, &Value::UInt(5), color), None);
        assert_eq!(convert(&registry, &green, TypeId::STRING), Some(Value::from("Green")));
        assert_eq!(
            convert(&registry, &green, shade),
            Some(Value::Enum(EnumValue { ty: shade, index: 1 }))
        );
    }
}
