//! Annotation Metadata Hierarchy
//!
//! Metadata for an element whose annotations are spread over several levels:
//! what the element declares, then what each ancestor declares (an overridden
//! method, the type a proxy stands in for, ...).
//!
//! Levels are stored most specific first. Index 0 is the declared metadata and
//! the last index is the root. Scalar lookups return the first level that has
//! a usable value, so declared values shadow inherited ones. Aggregating
//! lookups walk every level in the same order.

use annotation_core::annotation_value::AnnotationValue;
use annotation_core::metadata::{empty_metadata, Accept, AnnotationMetadata, MetadataRef, ValueMapper};
use annotation_core::synthesis::AnnotationProxy;
use annotation_core::value::{MemberValue, MemberValues};
use annotation_core::EnvironmentAnnotationMetadata;
use indexmap::IndexSet;
use smallvec::SmallVec;
use std::any::Any;
use std::collections::HashSet;
use std::iter::Rev;
use std::slice;
use std::sync::Arc;

/// Inline capacity; hierarchies are rarely deeper than this.
const INLINE_LEVELS: usize = 4;

type Levels = SmallVec<[MetadataRef; INLINE_LEVELS]>;

/// Ordered chain of metadata levels, most specific first.
///
/// Immutable once built. Levels are shared by reference, so many hierarchies
/// can hold the same ancestors; see [`create_sibling`](Self::create_sibling).
#[derive(Debug, Clone)]
pub struct AnnotationMetadataHierarchy {
    hierarchy: Levels,
}

impl AnnotationMetadataHierarchy {
    /// Builds a hierarchy from levels given root first: the first level is the
    /// outermost ancestor and the last is the declaring element.
    ///
    /// No levels gives the canonical empty hierarchy of two empty levels.
    pub fn new<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = MetadataRef>,
    {
        let mut hierarchy: Levels = levels.into_iter().collect();
        if hierarchy.is_empty() {
            return Self::empty();
        }
        hierarchy.reverse();
        Self { hierarchy }
    }

    /// Two empty levels, so declared and root are always addressable.
    pub fn empty() -> Self {
        let mut hierarchy = Levels::new();
        hierarchy.push(empty_metadata());
        hierarchy.push(empty_metadata());
        Self { hierarchy }
    }

    /// Copy of `existing` with `child` in place of the declared level.
    fn sibling(existing: &Self, child: MetadataRef) -> Self {
        let mut hierarchy = existing.hierarchy.clone();
        hierarchy[0] = child;
        Self { hierarchy }
    }

    /// Metadata declared on the element itself.
    pub fn declared_metadata(&self) -> &MetadataRef {
        &self.hierarchy[0]
    }

    /// Metadata of the outermost ancestor.
    pub fn root_metadata(&self) -> &MetadataRef {
        &self.hierarchy[self.hierarchy.len() - 1]
    }

    /// Metadata for another element that shares this element's ancestors.
    ///
    /// Returns `child` unchanged when there are no ancestors to share.
    pub fn create_sibling(&self, child: MetadataRef) -> MetadataRef {
        if self.hierarchy.len() > 1 {
            Arc::new(Self::sibling(self, child))
        } else {
            child
        }
    }

    pub fn len(&self) -> usize {
        self.hierarchy.len()
    }

    /// True when no level has any annotation. Never zero-length.
    pub fn is_empty(&self) -> bool {
        AnnotationMetadata::is_empty(self)
    }

    /// Level at `index`, 0 being the declared level.
    pub fn get(&self, index: usize) -> Option<&MetadataRef> {
        self.hierarchy.get(index)
    }

    /// Levels from the root to the declared level.
    pub fn iter(&self) -> Rev<slice::Iter<'_, MetadataRef>> {
        self.hierarchy.iter().rev()
    }

    fn levels(&self) -> impl Iterator<Item = &dyn AnnotationMetadata> + '_ {
        self.hierarchy.iter().map(|level| level.as_ref())
    }

    fn any(&self, predicate: impl Fn(&dyn AnnotationMetadata) -> bool) -> bool {
        self.levels().any(predicate)
    }

    fn first<T>(&self, lookup: impl FnMut(&dyn AnnotationMetadata) -> Option<T>) -> Option<T> {
        self.levels().find_map(lookup)
    }

    /// Concatenates the declared level's values with every later level that
    /// has any.
    fn concat(&self, mut lookup: impl FnMut(&dyn AnnotationMetadata) -> Vec<MemberValue>) -> Vec<MemberValue> {
        let mut values = lookup(self.hierarchy[0].as_ref());
        for level in self.levels().skip(1) {
            let more = lookup(level);
            if !more.is_empty() {
                values.extend(more);
            }
        }
        values
    }

    /// Occurrences across levels, value-equal ones kept once in first-seen
    /// order.
    fn distinct_values(&self, annotation: &str) -> Vec<AnnotationValue> {
        let mut unique = HashSet::new();
        let mut values = Vec::new();
        for level in self.levels() {
            for value in level.annotation_values_by_name(annotation) {
                if unique.insert(value.clone()) {
                    values.push(value);
                }
            }
        }
        values
    }
}

/// Lookup on one level, through the environment overload when the level
/// supports it.
fn level_value(
    level: &dyn AnnotationMetadata,
    annotation: &str,
    member: &str,
    mapper: Option<&dyn ValueMapper>,
    accept: Accept<'_>,
) -> Option<MemberValue> {
    match level.as_environment() {
        Some(environment) => environment.mapped_value_where(annotation, member, mapper, accept),
        None => level.value_where(annotation, member, accept),
    }
}

fn level_values(
    level: &dyn AnnotationMetadata,
    annotation: &str,
    member: &str,
    mapper: Option<&dyn ValueMapper>,
    accept: Accept<'_>,
) -> Vec<MemberValue> {
    match level.as_environment() {
        Some(environment) => environment.mapped_values_where(annotation, member, mapper, accept),
        None => level.values_where(annotation, member, accept),
    }
}

impl<'a> IntoIterator for &'a AnnotationMetadataHierarchy {
    type Item = &'a MetadataRef;
    type IntoIter = Rev<slice::Iter<'a, MetadataRef>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Default for AnnotationMetadataHierarchy {
    fn default() -> Self {
        Self::empty()
    }
}

impl EnvironmentAnnotationMetadata for AnnotationMetadataHierarchy {
    fn mapped_value_where(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
        accept: Accept<'_>,
    ) -> Option<MemberValue> {
        self.first(|level| level_value(level, annotation, member, mapper, accept))
    }

    fn mapped_values_where(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
        accept: Accept<'_>,
    ) -> Vec<MemberValue> {
        self.concat(|level| level_values(level, annotation, member, mapper, accept))
    }
}

impl AnnotationMetadata for AnnotationMetadataHierarchy {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_environment(&self) -> Option<&dyn EnvironmentAnnotationMetadata> {
        Some(self)
    }

    fn is_empty(&self) -> bool {
        self.levels().all(|level| level.is_empty())
    }

    fn has_property_expressions(&self) -> bool {
        self.any(|level| level.has_property_expressions())
    }

    fn has_annotation(&self, annotation: &str) -> bool {
        self.any(|level| level.has_annotation(annotation))
    }

    fn has_declared_annotation(&self, annotation: &str) -> bool {
        self.declared_metadata().has_declared_annotation(annotation)
    }

    fn has_stereotype(&self, annotation: &str) -> bool {
        self.any(|level| level.has_stereotype(annotation))
    }

    fn has_declared_stereotype(&self, annotation: &str) -> bool {
        self.declared_metadata().has_declared_stereotype(annotation)
    }

    fn annotation_names(&self) -> IndexSet<String> {
        let mut names = IndexSet::new();
        for level in self.levels() {
            names.extend(level.annotation_names());
        }
        names
    }

    fn declared_annotation_names(&self) -> IndexSet<String> {
        self.declared_metadata().declared_annotation_names()
    }

    fn annotation_names_by_stereotype(&self, stereotype: &str) -> Vec<String> {
        self.levels()
            .flat_map(|level| level.annotation_names_by_stereotype(stereotype))
            .collect()
    }

    fn declared_annotation_names_by_stereotype(&self, stereotype: &str) -> Vec<String> {
        self.declared_metadata()
            .declared_annotation_names_by_stereotype(stereotype)
    }

    /// Merges the annotation across levels: members of a more specific level
    /// win, and members it lacks are filled in from the levels behind it.
    fn find_annotation(&self, annotation: &str) -> Option<AnnotationValue> {
        let mut merged: Option<AnnotationValue> = None;
        for level in self.levels() {
            let Some(found) = level.find_annotation(annotation) else {
                continue;
            };
            merged = Some(match merged {
                None => found,
                Some(existing) => existing.merge_absent(&found, self.default_values(annotation)),
            });
        }
        merged
    }

    fn find_declared_annotation(&self, annotation: &str) -> Option<AnnotationValue> {
        self.declared_metadata().find_declared_annotation(annotation)
    }

    fn annotation_values_by_name(&self, annotation: &str) -> Vec<AnnotationValue> {
        self.distinct_values(annotation)
    }

    fn declared_annotation_values_by_name(&self, annotation: &str) -> Vec<AnnotationValue> {
        self.declared_metadata()
            .declared_annotation_values_by_name(annotation)
    }

    fn default_values(&self, annotation: &str) -> Arc<MemberValues> {
        self.first(|level| {
            let defaults = level.default_values(annotation);
            (!defaults.is_empty()).then_some(defaults)
        })
        .unwrap_or_else(annotation_core::annotation_value::no_defaults)
    }

    fn find_repeatable_annotation(&self, annotation: &str) -> Option<String> {
        self.first(|level| level.find_repeatable_annotation(annotation))
    }

    fn is_repeatable_annotation(&self, annotation: &str) -> bool {
        self.any(|level| level.is_repeatable_annotation(annotation))
    }

    fn value_where(&self, annotation: &str, member: &str, accept: Accept<'_>) -> Option<MemberValue> {
        self.mapped_value_where(annotation, member, None, accept)
    }

    fn values_where(&self, annotation: &str, member: &str, accept: Accept<'_>) -> Vec<MemberValue> {
        self.mapped_values_where(annotation, member, None, accept)
    }

    fn member_values(&self, annotation: &str) -> MemberValues {
        self.first(|level| {
            let values = level.member_values(annotation);
            (!values.is_empty()).then_some(values)
        })
        .unwrap_or_default()
    }

    fn is_present(&self, annotation: &str, member: &str) -> bool {
        self.any(|level| level.is_present(annotation, member))
    }

    fn default_value(&self, annotation: &str, member: &str) -> Option<MemberValue> {
        self.first(|level| level.default_value(annotation, member))
    }

    fn synthesize_all(&self) -> Vec<AnnotationProxy> {
        self.levels().flat_map(|level| level.synthesize_all()).collect()
    }

    fn synthesize_declared_all(&self) -> Vec<AnnotationProxy> {
        self.declared_metadata().synthesize_declared_all()
    }
}
