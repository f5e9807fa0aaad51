//! Annotation Metadata
//!
//! The query contract implemented by one level of metadata (the annotations
//! present on a single element) and by anything that composes levels.
//!
//! Lookups take annotation names rather than loaded types. Every lookup
//! returns `Option` or a possibly empty collection; absence is routine.

use crate::annotation_value::{no_defaults, AnnotationValue};
use crate::convert::{self, FromMemberValue};
use crate::environment::EnvironmentAnnotationMetadata;
use crate::error::Result;
use crate::synthesis::{self, Annotation, AnnotationProxy};
use crate::value::{ClassRef, MemberValue, MemberValues};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Shared handle to a level. Levels are immutable and may be held by any
/// number of hierarchies at once.
pub type MetadataRef = Arc<dyn AnnotationMetadata>;

/// Predicate deciding whether a raw value is usable for the requested type.
/// A level whose value is rejected reports the value as absent.
pub type Accept<'a> = &'a dyn Fn(&MemberValue) -> bool;

/// Caller supplied transformation applied to raw values before coercion.
pub trait ValueMapper {
    fn map_value(&self, value: MemberValue) -> MemberValue;
}

impl<F> ValueMapper for F
where
    F: Fn(MemberValue) -> MemberValue,
{
    fn map_value(&self, value: MemberValue) -> MemberValue {
        self(value)
    }
}

/// Read access to the annotations of an element.
pub trait AnnotationMetadata: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Capability check for environment aware coercion.
    fn as_environment(&self) -> Option<&dyn EnvironmentAnnotationMetadata> {
        None
    }

    fn is_empty(&self) -> bool;

    /// Whether any member value holds an unresolved `${...}` expression.
    fn has_property_expressions(&self) -> bool {
        false
    }

    fn has_annotation(&self, annotation: &str) -> bool;

    fn has_declared_annotation(&self, annotation: &str) -> bool;

    fn has_stereotype(&self, annotation: &str) -> bool;

    fn has_declared_stereotype(&self, annotation: &str) -> bool;

    fn annotation_names(&self) -> IndexSet<String>;

    fn declared_annotation_names(&self) -> IndexSet<String>;

    /// Names of the annotations that carry `stereotype` as a meta-annotation.
    fn annotation_names_by_stereotype(&self, stereotype: &str) -> Vec<String>;

    fn declared_annotation_names_by_stereotype(&self, stereotype: &str) -> Vec<String>;

    fn find_annotation(&self, annotation: &str) -> Option<AnnotationValue>;

    fn find_declared_annotation(&self, annotation: &str) -> Option<AnnotationValue>;

    /// Every occurrence of `annotation`, unwrapping repeatable containers.
    fn annotation_values_by_name(&self, annotation: &str) -> Vec<AnnotationValue>;

    fn declared_annotation_values_by_name(&self, annotation: &str) -> Vec<AnnotationValue>;

    fn default_values(&self, annotation: &str) -> Arc<MemberValues>;

    /// Container annotation name when `annotation` is repeatable.
    fn find_repeatable_annotation(&self, annotation: &str) -> Option<String>;

    fn is_repeatable_annotation(&self, annotation: &str) -> bool {
        self.find_repeatable_annotation(annotation).is_some()
    }

    /// First raw value of `member` (or its default) that `accept` allows.
    fn value_where(&self, annotation: &str, member: &str, accept: Accept<'_>) -> Option<MemberValue>;

    /// All raw elements of an array valued `member` that `accept` allows.
    fn values_where(&self, annotation: &str, member: &str, accept: Accept<'_>) -> Vec<MemberValue>;

    /// Explicit member values of `annotation`.
    fn member_values(&self, annotation: &str) -> MemberValues {
        self.find_annotation(annotation)
            .map(|value| value.values().clone())
            .unwrap_or_default()
    }

    /// Whether `member` was given explicitly on `annotation`.
    fn is_present(&self, annotation: &str, member: &str) -> bool {
        self.find_annotation(annotation)
            .is_some_and(|value| value.contains(member))
    }

    fn default_value(&self, annotation: &str, member: &str) -> Option<MemberValue> {
        self.default_values(annotation).get(member).cloned()
    }

    fn value(&self, annotation: &str, member: &str) -> Option<MemberValue> {
        self.value_where(annotation, member, &|_| true)
    }

    fn string_value(&self, annotation: &str, member: &str) -> Option<String> {
        lookup(self, annotation, member)
    }

    fn string_values(&self, annotation: &str, member: &str) -> Vec<String> {
        lookup_all(self, annotation, member)
    }

    fn bool_value(&self, annotation: &str, member: &str) -> Option<bool> {
        lookup(self, annotation, member)
    }

    fn is_true(&self, annotation: &str, member: &str) -> bool {
        self.bool_value(annotation, member).unwrap_or(false)
    }

    /// Absent members count as false, so this is `true` when nothing is set.
    fn is_false(&self, annotation: &str, member: &str) -> bool {
        !self.bool_value(annotation, member).unwrap_or(false)
    }

    fn int_value(&self, annotation: &str, member: &str) -> Option<i32> {
        lookup(self, annotation, member)
    }

    fn long_value(&self, annotation: &str, member: &str) -> Option<i64> {
        lookup(self, annotation, member)
    }

    fn double_value(&self, annotation: &str, member: &str) -> Option<f64> {
        lookup(self, annotation, member)
    }

    fn class_value(&self, annotation: &str, member: &str) -> Option<ClassRef> {
        lookup(self, annotation, member)
    }

    fn class_values(&self, annotation: &str, member: &str) -> Vec<ClassRef> {
        lookup_all(self, annotation, member)
    }

    /// One annotation-like view per annotation present.
    fn synthesize_all(&self) -> Vec<AnnotationProxy> {
        self.annotation_names()
            .iter()
            .filter_map(|name| self.find_annotation(name))
            .map(AnnotationProxy::new)
            .collect()
    }

    fn synthesize_declared_all(&self) -> Vec<AnnotationProxy> {
        self.declared_annotation_names()
            .iter()
            .filter_map(|name| self.find_declared_annotation(name))
            .map(AnnotationProxy::new)
            .collect()
    }
}

/// Scalar lookup coerced to `T`.
pub(crate) fn lookup<T, M>(metadata: &M, annotation: &str, member: &str) -> Option<T>
where
    T: FromMemberValue,
    M: AnnotationMetadata + ?Sized,
{
    metadata
        .value_where(annotation, member, &convert::accepts::<T>)
        .and_then(|value| T::from_member_value(&value))
}

/// Array lookup coerced element-wise to `T`.
pub(crate) fn lookup_all<T, M>(metadata: &M, annotation: &str, member: &str) -> Vec<T>
where
    T: FromMemberValue,
    M: AnnotationMetadata + ?Sized,
{
    metadata
        .values_where(annotation, member, &convert::accepts::<T>)
        .iter()
        .filter_map(T::from_member_value)
        .collect()
}

/// Generic queries available on every metadata, including trait objects.
pub trait AnnotationMetadataExt: AnnotationMetadata {
    fn get_value<T: FromMemberValue>(&self, annotation: &str, member: &str) -> Option<T> {
        lookup(self, annotation, member)
    }

    fn enum_value<E: FromStr>(&self, annotation: &str, member: &str) -> Option<E> {
        self.value_where(annotation, member, &convert::accepts_enum::<E>)
            .and_then(|value| convert::to_enum(&value))
    }

    fn enum_values<E: FromStr>(&self, annotation: &str, member: &str) -> Vec<E> {
        self.values_where(annotation, member, &convert::accepts_enum::<E>)
            .iter()
            .filter_map(convert::to_enum::<E>)
            .collect()
    }

    fn default_value_as<T: FromMemberValue>(&self, annotation: &str, member: &str) -> Option<T> {
        self.default_value(annotation, member)
            .and_then(|value| T::from_member_value(&value))
    }

    /// Members of `annotation` that convert to `T`, in declaration order.
    fn values_of<T: FromMemberValue>(&self, annotation: &str) -> IndexMap<String, T> {
        self.member_values(annotation)
            .iter()
            .filter_map(|(member, value)| {
                T::from_member_value(value).map(|converted| (member.clone(), converted))
            })
            .collect()
    }

    fn annotation_values_by_type<A: Annotation>(&self) -> Vec<AnnotationValue> {
        self.annotation_values_by_name(A::NAME)
    }

    fn declared_annotation_values_by_type<A: Annotation>(&self) -> Vec<AnnotationValue> {
        self.declared_annotation_values_by_name(A::NAME)
    }

    fn synthesize<A: Annotation>(&self) -> Result<Option<A>> {
        self.find_annotation(A::NAME)
            .map(|value| synthesis::build_annotation(&value))
            .transpose()
    }

    fn synthesize_declared<A: Annotation>(&self) -> Result<Option<A>> {
        self.find_declared_annotation(A::NAME)
            .map(|value| synthesis::build_annotation(&value))
            .transpose()
    }

    /// Builds `A` from the members of another annotation, `source`.
    fn synthesize_from<A: Annotation>(&self, source: &str) -> Result<Option<A>> {
        self.find_annotation(source)
            .map(|value| {
                let aliased = AnnotationValue::with_defaults(
                    A::NAME,
                    value.values().clone(),
                    self.default_values(A::NAME),
                );
                synthesis::build_annotation(&aliased)
            })
            .transpose()
    }

    fn synthesize_annotations_by_type<A: Annotation>(&self) -> Result<Vec<A>> {
        self.annotation_values_by_name(A::NAME)
            .iter()
            .map(synthesis::build_annotation::<A>)
            .collect()
    }

    fn synthesize_declared_annotations_by_type<A: Annotation>(&self) -> Result<Vec<A>> {
        self.declared_annotation_values_by_name(A::NAME)
            .iter()
            .map(synthesis::build_annotation::<A>)
            .collect()
    }
}

impl<M: AnnotationMetadata + ?Sized> AnnotationMetadataExt for M {}

/// Metadata for an element without annotations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyAnnotationMetadata;

static EMPTY_METADATA: Lazy<MetadataRef> = Lazy::new(|| Arc::new(EmptyAnnotationMetadata));

/// Shared empty level.
pub fn empty_metadata() -> MetadataRef {
    EMPTY_METADATA.clone()
}

impl AnnotationMetadata for EmptyAnnotationMetadata {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_empty(&self) -> bool {
        true
    }

    fn has_annotation(&self, _annotation: &str) -> bool {
        false
    }

    fn has_declared_annotation(&self, _annotation: &str) -> bool {
        false
    }

    fn has_stereotype(&self, _annotation: &str) -> bool {
        false
    }

    fn has_declared_stereotype(&self, _annotation: &str) -> bool {
        false
    }

    fn annotation_names(&self) -> IndexSet<String> {
        IndexSet::new()
    }

    fn declared_annotation_names(&self) -> IndexSet<String> {
        IndexSet::new()
    }

    fn annotation_names_by_stereotype(&self, _stereotype: &str) -> Vec<String> {
        Vec::new()
    }

    fn declared_annotation_names_by_stereotype(&self, _stereotype: &str) -> Vec<String> {
        Vec::new()
    }

    fn find_annotation(&self, _annotation: &str) -> Option<AnnotationValue> {
        None
    }

    fn find_declared_annotation(&self, _annotation: &str) -> Option<AnnotationValue> {
        None
    }

    fn annotation_values_by_name(&self, _annotation: &str) -> Vec<AnnotationValue> {
        Vec::new()
    }

    fn declared_annotation_values_by_name(&self, _annotation: &str) -> Vec<AnnotationValue> {
        Vec::new()
    }

    fn default_values(&self, _annotation: &str) -> Arc<MemberValues> {
        no_defaults()
    }

    fn find_repeatable_annotation(&self, _annotation: &str) -> Option<String> {
        None
    }

    fn value_where(&self, _annotation: &str, _member: &str, _accept: Accept<'_>) -> Option<MemberValue> {
        None
    }

    fn values_where(&self, _annotation: &str, _member: &str, _accept: Accept<'_>) -> Vec<MemberValue> {
        Vec::new()
    }
}
