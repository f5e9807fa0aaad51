//! Member Value Coercion
//!
//! Conversions from raw member values to typed results. A conversion that
//! cannot be performed yields `None`; callers treat that as "not found".

use crate::annotation_value::AnnotationValue;
use crate::value::{ClassRef, MemberValue};
use std::str::FromStr;

/// Types a raw member value can be coerced into.
pub trait FromMemberValue: Sized {
    /// Name of the target type, used in error messages.
    const EXPECTED: &'static str;

    fn from_member_value(value: &MemberValue) -> Option<Self>;
}

/// Scalar lookups on an array member read its first element.
fn first<T: FromMemberValue>(items: &[MemberValue]) -> Option<T> {
    items.first().and_then(T::from_member_value)
}

impl FromMemberValue for MemberValue {
    const EXPECTED: &'static str = "value";

    fn from_member_value(value: &MemberValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromMemberValue for String {
    const EXPECTED: &'static str = "string";

    fn from_member_value(value: &MemberValue) -> Option<Self> {
        match value {
            MemberValue::String(s) | MemberValue::Enum(s) => Some(s.clone()),
            MemberValue::Class(c) => Some(c.name().to_string()),
            MemberValue::Bool(b) => Some(b.to_string()),
            MemberValue::Int(i) => Some(i.to_string()),
            MemberValue::Long(l) => Some(l.to_string()),
            MemberValue::Double(d) => Some(d.to_string()),
            MemberValue::Array(items) => first(items),
            MemberValue::Annotation(_) => None,
        }
    }
}

impl FromMemberValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_member_value(value: &MemberValue) -> Option<Self> {
        match value {
            MemberValue::Bool(b) => Some(*b),
            MemberValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            MemberValue::Array(items) => first(items),
            _ => None,
        }
    }
}

impl FromMemberValue for i32 {
    const EXPECTED: &'static str = "int";

    fn from_member_value(value: &MemberValue) -> Option<Self> {
        match value {
            MemberValue::Int(i) => Some(*i),
            MemberValue::Long(l) => i32::try_from(*l).ok(),
            MemberValue::Double(d) => whole(*d).and_then(|l| i32::try_from(l).ok()),
            MemberValue::String(s) => s.trim().parse().ok(),
            MemberValue::Array(items) => first(items),
            _ => None,
        }
    }
}

impl FromMemberValue for i64 {
    const EXPECTED: &'static str = "long";

    fn from_member_value(value: &MemberValue) -> Option<Self> {
        match value {
            MemberValue::Int(i) => Some(i64::from(*i)),
            MemberValue::Long(l) => Some(*l),
            MemberValue::Double(d) => whole(*d),
            MemberValue::String(s) => s.trim().parse().ok(),
            MemberValue::Array(items) => first(items),
            _ => None,
        }
    }
}

impl FromMemberValue for f64 {
    const EXPECTED: &'static str = "double";

    fn from_member_value(value: &MemberValue) -> Option<Self> {
        match value {
            MemberValue::Int(i) => Some(f64::from(*i)),
            MemberValue::Long(l) => Some(*l as f64),
            MemberValue::Double(d) => Some(*d),
            MemberValue::String(s) => s.trim().parse().ok(),
            MemberValue::Array(items) => first(items),
            _ => None,
        }
    }
}

impl FromMemberValue for ClassRef {
    const EXPECTED: &'static str = "class";

    fn from_member_value(value: &MemberValue) -> Option<Self> {
        match value {
            MemberValue::Class(c) => Some(c.clone()),
            MemberValue::String(s) => ClassRef::parse(s),
            MemberValue::Array(items) => first(items),
            _ => None,
        }
    }
}

impl FromMemberValue for AnnotationValue {
    const EXPECTED: &'static str = "annotation";

    fn from_member_value(value: &MemberValue) -> Option<Self> {
        match value {
            MemberValue::Annotation(a) => Some((**a).clone()),
            MemberValue::Array(items) => first(items),
            _ => None,
        }
    }
}

/// Array conversion. Elements that do not convert are dropped; a convertible
/// scalar becomes a single element array.
impl<T: FromMemberValue> FromMemberValue for Vec<T> {
    const EXPECTED: &'static str = "array";

    fn from_member_value(value: &MemberValue) -> Option<Self> {
        match value {
            MemberValue::Array(items) => Some(items.iter().filter_map(T::from_member_value).collect()),
            scalar => T::from_member_value(scalar).map(|v| vec![v]),
        }
    }
}

/// Converts an enum constant or a string to `E` by name.
pub fn to_enum<E: FromStr>(value: &MemberValue) -> Option<E> {
    match value {
        MemberValue::Enum(name) | MemberValue::String(name) => name.trim().parse().ok(),
        MemberValue::Array(items) => items.first().and_then(to_enum),
        _ => None,
    }
}

/// Accept predicate matching values convertible to `T`.
pub fn accepts<T: FromMemberValue>(value: &MemberValue) -> bool {
    T::from_member_value(value).is_some()
}

/// Accept predicate matching values convertible to the enum `E`.
pub fn accepts_enum<E: FromStr>(value: &MemberValue) -> bool {
    to_enum::<E>(value).is_some()
}

fn whole(d: f64) -> Option<i64> {
    if d.is_finite() && d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64 {
        Some(d as i64)
    } else {
        None
    }
}
