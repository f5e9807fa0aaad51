//! Annotation Values
//!
//! One resolved occurrence of an annotation: its name, the members that were
//! given explicitly, and the defaults declared by the annotation type.

use crate::convert::{self, FromMemberValue};
use crate::value::{ClassRef, MemberValue, MemberValues};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// Name of the member used when an annotation is given a single unnamed value.
pub const VALUE_MEMBER: &str = "value";

static NO_DEFAULTS: Lazy<Arc<MemberValues>> = Lazy::new(|| Arc::new(MemberValues::new()));

/// Shared empty default mapping.
pub fn no_defaults() -> Arc<MemberValues> {
    NO_DEFAULTS.clone()
}

/// An immutable annotation occurrence.
///
/// Equality and hashing consider the annotation name and the explicit member
/// values only. Member order and default values do not participate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationValue {
    annotation_name: String,
    values: MemberValues,
    #[serde(skip)]
    default_values: Arc<MemberValues>,
}

impl AnnotationValue {
    pub fn new(annotation_name: impl Into<String>, values: MemberValues) -> Self {
        Self::with_defaults(annotation_name, values, no_defaults())
    }

    pub fn with_defaults(
        annotation_name: impl Into<String>,
        values: MemberValues,
        default_values: Arc<MemberValues>,
    ) -> Self {
        Self {
            annotation_name: annotation_name.into(),
            values,
            default_values,
        }
    }

    /// Annotation without members.
    pub fn marker(annotation_name: impl Into<String>) -> Self {
        Self::new(annotation_name, MemberValues::new())
    }

    pub fn builder(annotation_name: impl Into<String>) -> AnnotationValueBuilder {
        AnnotationValueBuilder::new(annotation_name)
    }

    pub fn annotation_name(&self) -> &str {
        &self.annotation_name
    }

    /// Explicitly given members, in declaration order.
    pub fn values(&self) -> &MemberValues {
        &self.values
    }

    pub fn default_values(&self) -> &Arc<MemberValues> {
        &self.default_values
    }

    /// Same occurrence carrying a different default mapping.
    pub fn rebind_defaults(self, default_values: Arc<MemberValues>) -> Self {
        Self {
            default_values,
            ..self
        }
    }

    /// Whether `member` was given explicitly.
    pub fn contains(&self, member: &str) -> bool {
        self.values.contains_key(member)
    }

    /// Raw member value, falling back to the declared default.
    pub fn get(&self, member: &str) -> Option<&MemberValue> {
        self.values
            .get(member)
            .or_else(|| self.default_values.get(member))
    }

    /// Member value converted to `T`; `None` when absent or not convertible.
    pub fn get_as<T: FromMemberValue>(&self, member: &str) -> Option<T> {
        self.get(member).and_then(T::from_member_value)
    }

    pub fn value(&self) -> Option<&MemberValue> {
        self.get(VALUE_MEMBER)
    }

    pub fn string_value(&self, member: &str) -> Option<String> {
        self.get_as(member)
    }

    pub fn string_values(&self, member: &str) -> Vec<String> {
        self.get_as(member).unwrap_or_default()
    }

    pub fn bool_value(&self, member: &str) -> Option<bool> {
        self.get_as(member)
    }

    pub fn is_true(&self, member: &str) -> bool {
        self.bool_value(member).unwrap_or(false)
    }

    pub fn is_false(&self, member: &str) -> bool {
        !self.is_true(member)
    }

    pub fn int_value(&self, member: &str) -> Option<i32> {
        self.get_as(member)
    }

    pub fn long_value(&self, member: &str) -> Option<i64> {
        self.get_as(member)
    }

    pub fn double_value(&self, member: &str) -> Option<f64> {
        self.get_as(member)
    }

    pub fn class_value(&self, member: &str) -> Option<ClassRef> {
        self.get_as(member)
    }

    pub fn class_values(&self, member: &str) -> Vec<ClassRef> {
        self.get_as(member).unwrap_or_default()
    }

    pub fn enum_value<E: FromStr>(&self, member: &str) -> Option<E> {
        self.get(member).and_then(convert::to_enum)
    }

    pub fn enum_values<E: FromStr>(&self, member: &str) -> Vec<E> {
        self.get(member)
            .map(|value| value.elements().iter().filter_map(convert::to_enum::<E>).collect())
            .unwrap_or_default()
    }

    /// Nested annotations held by `member`.
    pub fn annotations(&self, member: &str) -> Vec<AnnotationValue> {
        self.get_as(member).unwrap_or_default()
    }

    /// Merges `other` into this occurrence: members already present are kept,
    /// members only present in `other` are added.
    pub fn merge_absent(&self, other: &AnnotationValue, default_values: Arc<MemberValues>) -> Self {
        let mut values = MemberValues::with_capacity(self.values.len() + other.values.len());
        values.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        for (member, value) in &other.values {
            if !values.contains_key(member) {
                values.insert(member.clone(), value.clone());
            }
        }
        Self::with_defaults(self.annotation_name.clone(), values, default_values)
    }
}

impl PartialEq for AnnotationValue {
    fn eq(&self, other: &Self) -> bool {
        self.annotation_name == other.annotation_name && self.values == other.values
    }
}

impl Eq for AnnotationValue {}

impl Hash for AnnotationValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.annotation_name.hash(state);
        // IndexMap equality ignores order, so combine entry hashes commutatively.
        let combined = self.values.iter().fold(0u64, |acc, entry| {
            let mut hasher = DefaultHasher::new();
            entry.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        });
        self.values.len().hash(state);
        combined.hash(state);
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.annotation_name)?;
        if self.values.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, (member, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", member, value)?;
        }
        f.write_str(")")
    }
}

/// Builder for [`AnnotationValue`].
#[derive(Debug, Clone)]
pub struct AnnotationValueBuilder {
    annotation_name: String,
    values: MemberValues,
    default_values: Option<Arc<MemberValues>>,
}

impl AnnotationValueBuilder {
    pub fn new(annotation_name: impl Into<String>) -> Self {
        Self {
            annotation_name: annotation_name.into(),
            values: MemberValues::new(),
            default_values: None,
        }
    }

    /// Sets the `value` member.
    pub fn value(self, value: impl Into<MemberValue>) -> Self {
        self.member(VALUE_MEMBER, value)
    }

    pub fn member(mut self, name: impl Into<String>, value: impl Into<MemberValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn class_member(self, name: impl Into<String>, class: ClassRef) -> Self {
        self.member(name, MemberValue::Class(class))
    }

    pub fn enum_member(self, name: impl Into<String>, constant: impl Into<String>) -> Self {
        self.member(name, MemberValue::Enum(constant.into()))
    }

    pub fn defaults(mut self, default_values: Arc<MemberValues>) -> Self {
        self.default_values = Some(default_values);
        self
    }

    pub fn build(self) -> AnnotationValue {
        AnnotationValue::with_defaults(
            self.annotation_name,
            self.values,
            self.default_values.unwrap_or_else(no_defaults),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn defaults(entries: &[(&str, MemberValue)]) -> Arc<MemberValues> {
        Arc::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn should_fall_back_to_defaults() {
        let value = AnnotationValue::builder("Retry")
            .member("attempts", 5)
            .defaults(defaults(&[
                ("attempts", MemberValue::Int(3)),
                ("delay", MemberValue::from("1s")),
            ]))
            .build();

        assert_eq!(value.int_value("attempts"), Some(5));
        assert_eq!(value.string_value("delay").as_deref(), Some("1s"));
        assert!(!value.contains("delay"));
        assert_eq!(value.get("missing"), None);
    }

    #[test]
    fn should_ignore_order_and_defaults_for_equality() {
        let a = AnnotationValue::builder("Foo")
            .member("a", 1)
            .member("b", 2)
            .build();
        let b = AnnotationValue::builder("Foo")
            .member("b", 2)
            .member("a", 1)
            .defaults(defaults(&[("c", MemberValue::Int(3))]))
            .build();

        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn should_differ_by_name() {
        let a = AnnotationValue::builder("Foo").value("x").build();
        let b = AnnotationValue::builder("Bar").value("x").build();
        assert_ne!(a, b);
    }

    #[test]
    fn should_merge_only_absent_members() {
        let specific = AnnotationValue::builder("Foo").member("a", 1).build();
        let inherited = AnnotationValue::builder("Foo")
            .member("a", 9)
            .member("b", 2)
            .build();

        let merged = specific.merge_absent(&inherited, no_defaults());
        assert_eq!(merged.int_value("a"), Some(1));
        assert_eq!(merged.int_value("b"), Some(2));
        let members: Vec<_> = merged.values().keys().cloned().collect();
        assert_eq!(members, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn should_render_like_source() {
        let value = AnnotationValue::builder("Named").value("primary").build();
        assert_eq!(value.to_string(), "@Named(value=\"primary\")");
        assert_eq!(AnnotationValue::marker("Singleton").to_string(), "@Singleton");
    }

    #[test]
    fn should_treat_absent_boolean_as_false() {
        let value = AnnotationValue::marker("Foo");
        assert!(!value.is_true("enabled"));
        assert!(value.is_false("enabled"));
    }
}
