//! Member Values
//!
//! Raw values stored for annotation members, before any coercion.

use crate::annotation_value::AnnotationValue;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Ordered member name to raw value mapping.
pub type MemberValues = IndexMap<String, MemberValue>;

/// Qualified type name, optionally with trailing `[]` array dimensions.
static TYPE_NAME_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*(?:\[\])*$").unwrap()
});

/// A reference to a type by name. Types are never loaded here, only named.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassRef {
    name: String,
}

impl ClassRef {
    /// Returns `None` when `name` is not a valid qualified type name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if TYPE_NAME_REGEXP.is_match(name) {
            Some(Self {
                name: name.to_string(),
            })
        } else {
            None
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without the package prefix.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Raw value of an annotation member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MemberValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Class(ClassRef),
    /// Enum constant, by name.
    Enum(String),
    Array(Vec<MemberValue>),
    Annotation(Box<AnnotationValue>),
}

impl MemberValue {
    pub fn is_array(&self) -> bool {
        matches!(self, MemberValue::Array(_))
    }

    /// Elements of an array value, or the value itself as a single element.
    pub fn elements(&self) -> &[MemberValue] {
        match self {
            MemberValue::Array(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Returns true if any string reachable from this value satisfies `predicate`.
    pub fn any_string(&self, predicate: &dyn Fn(&str) -> bool) -> bool {
        match self {
            MemberValue::String(s) => predicate(s),
            MemberValue::Array(items) => items.iter().any(|item| item.any_string(predicate)),
            MemberValue::Annotation(annotation) => annotation
                .values()
                .values()
                .any(|value| value.any_string(predicate)),
            _ => false,
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            MemberValue::Bool(_) => 0,
            MemberValue::Int(_) => 1,
            MemberValue::Long(_) => 2,
            MemberValue::Double(_) => 3,
            MemberValue::String(_) => 4,
            MemberValue::Class(_) => 5,
            MemberValue::Enum(_) => 6,
            MemberValue::Array(_) => 7,
            MemberValue::Annotation(_) => 8,
        }
    }
}

// Doubles compare by bit pattern so that equality stays reflexive and
// consistent with `Hash`.
impl PartialEq for MemberValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MemberValue::Bool(a), MemberValue::Bool(b)) => a == b,
            (MemberValue::Int(a), MemberValue::Int(b)) => a == b,
            (MemberValue::Long(a), MemberValue::Long(b)) => a == b,
            (MemberValue::Double(a), MemberValue::Double(b)) => a.to_bits() == b.to_bits(),
            (MemberValue::String(a), MemberValue::String(b)) => a == b,
            (MemberValue::Class(a), MemberValue::Class(b)) => a == b,
            (MemberValue::Enum(a), MemberValue::Enum(b)) => a == b,
            (MemberValue::Array(a), MemberValue::Array(b)) => a == b,
            (MemberValue::Annotation(a), MemberValue::Annotation(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for MemberValue {}

impl Hash for MemberValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        match self {
            MemberValue::Bool(b) => b.hash(state),
            MemberValue::Int(i) => i.hash(state),
            MemberValue::Long(l) => l.hash(state),
            MemberValue::Double(d) => d.to_bits().hash(state),
            MemberValue::String(s) | MemberValue::Enum(s) => s.hash(state),
            MemberValue::Class(c) => c.hash(state),
            MemberValue::Array(items) => items.hash(state),
            MemberValue::Annotation(a) => a.hash(state),
        }
    }
}

impl fmt::Display for MemberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberValue::Bool(b) => write!(f, "{}", b),
            MemberValue::Int(i) => write!(f, "{}", i),
            MemberValue::Long(l) => write!(f, "{}L", l),
            MemberValue::Double(d) => write!(f, "{:?}", d),
            MemberValue::String(s) => write!(f, "\"{}\"", s),
            MemberValue::Class(c) => write!(f, "{}.class", c),
            MemberValue::Enum(e) => f.write_str(e),
            MemberValue::Array(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("}")
            }
            MemberValue::Annotation(a) => write!(f, "{}", a),
        }
    }
}

impl From<bool> for MemberValue {
    fn from(value: bool) -> Self {
        MemberValue::Bool(value)
    }
}

impl From<i32> for MemberValue {
    fn from(value: i32) -> Self {
        MemberValue::Int(value)
    }
}

impl From<i64> for MemberValue {
    fn from(value: i64) -> Self {
        MemberValue::Long(value)
    }
}

impl From<f64> for MemberValue {
    fn from(value: f64) -> Self {
        MemberValue::Double(value)
    }
}

impl From<&str> for MemberValue {
    fn from(value: &str) -> Self {
        MemberValue::String(value.to_string())
    }
}

impl From<String> for MemberValue {
    fn from(value: String) -> Self {
        MemberValue::String(value)
    }
}

impl From<ClassRef> for MemberValue {
    fn from(value: ClassRef) -> Self {
        MemberValue::Class(value)
    }
}

impl From<AnnotationValue> for MemberValue {
    fn from(value: AnnotationValue) -> Self {
        MemberValue::Annotation(Box::new(value))
    }
}

impl<T: Into<MemberValue>> From<Vec<T>> for MemberValue {
    fn from(values: Vec<T>) -> Self {
        MemberValue::Array(values.into_iter().map(Into::into).collect())
    }
}
