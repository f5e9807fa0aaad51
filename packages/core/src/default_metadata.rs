//! Default Annotation Metadata
//!
//! Reference implementation of a single level: the annotations found on one
//! element, as recorded by whatever scanned the element.

use crate::annotation_value::{no_defaults, AnnotationValue, VALUE_MEMBER};
use crate::environment::value_contains_placeholder;
use crate::metadata::{Accept, AnnotationMetadata};
use crate::value::{MemberValue, MemberValues};
use bitflags::bitflags;
use indexmap::{IndexMap, IndexSet};
use std::any::Any;
use std::sync::Arc;

bitflags! {
    /// How an annotation is present on the element.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Presence: u8 {
        /// Written directly on the element.
        const DECLARED = 1 << 0;
        /// Present through inheritance.
        const INHERITED = 1 << 1;
        /// Meta-annotation of a declared annotation.
        const DECLARED_STEREOTYPE = 1 << 2;
        /// Meta-annotation of an inherited annotation.
        const STEREOTYPE = 1 << 3;

        const ANNOTATION = Self::DECLARED.bits() | Self::INHERITED.bits();
        const ANY_DECLARED = Self::DECLARED.bits() | Self::DECLARED_STEREOTYPE.bits();
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    values: MemberValues,
    presence: Presence,
}

/// Annotations of a single element.
#[derive(Debug, Clone, Default)]
pub struct DefaultAnnotationMetadata {
    entries: IndexMap<String, Entry>,
    by_stereotype: IndexMap<String, Vec<String>>,
    declared_by_stereotype: IndexMap<String, Vec<String>>,
    /// Repeatable annotation name to its container annotation name.
    repeated: IndexMap<String, String>,
    defaults: IndexMap<String, Arc<MemberValues>>,
    property_expressions: bool,
}

impl DefaultAnnotationMetadata {
    pub fn builder() -> DefaultAnnotationMetadataBuilder {
        DefaultAnnotationMetadataBuilder::default()
    }

    fn entry(&self, annotation: &str, mask: Presence) -> Option<&Entry> {
        self.entries
            .get(annotation)
            .filter(|entry| entry.presence.intersects(mask))
    }

    fn annotation_value(&self, annotation: &str, entry: &Entry) -> AnnotationValue {
        AnnotationValue::with_defaults(annotation, entry.values.clone(), self.default_values(annotation))
    }

    /// Occurrences held by the container of a repeatable annotation.
    fn repeated_values(&self, annotation: &str, mask: Presence) -> Option<Vec<AnnotationValue>> {
        let container = self.repeated.get(annotation)?;
        let entry = self.entry(container, mask)?;
        let defaults = self.default_values(annotation);
        let occurrences = entry
            .values
            .get(VALUE_MEMBER)
            .map(|value| {
                value
                    .elements()
                    .iter()
                    .filter_map(|element| match element {
                        MemberValue::Annotation(nested) => {
                            Some((**nested).clone().rebind_defaults(defaults.clone()))
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(occurrences)
    }

    fn values_by_name(&self, annotation: &str, mask: Presence) -> Vec<AnnotationValue> {
        if let Some(occurrences) = self.repeated_values(annotation, mask) {
            return occurrences;
        }
        self.entry(annotation, mask)
            .map(|entry| vec![self.annotation_value(annotation, entry)])
            .unwrap_or_default()
    }

    fn names(&self, mask: Presence) -> IndexSet<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.presence.intersects(mask))
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn raw_value(&self, annotation: &str, member: &str) -> Option<&MemberValue> {
        let entry = self.entries.get(annotation)?;
        entry
            .values
            .get(member)
            .or_else(|| self.defaults.get(annotation).and_then(|d| d.get(member)))
    }
}

impl AnnotationMetadata for DefaultAnnotationMetadata {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn has_property_expressions(&self) -> bool {
        self.property_expressions
    }

    fn has_annotation(&self, annotation: &str) -> bool {
        self.entry(annotation, Presence::ANNOTATION).is_some()
            || self
                .repeated
                .get(annotation)
                .is_some_and(|container| self.entry(container, Presence::ANNOTATION).is_some())
    }

    fn has_declared_annotation(&self, annotation: &str) -> bool {
        self.entry(annotation, Presence::DECLARED).is_some()
            || self
                .repeated
                .get(annotation)
                .is_some_and(|container| self.entry(container, Presence::DECLARED).is_some())
    }

    fn has_stereotype(&self, annotation: &str) -> bool {
        self.entries.contains_key(annotation) || self.has_annotation(annotation)
    }

    fn has_declared_stereotype(&self, annotation: &str) -> bool {
        self.entry(annotation, Presence::ANY_DECLARED).is_some()
            || self.has_declared_annotation(annotation)
    }

    fn annotation_names(&self) -> IndexSet<String> {
        self.names(Presence::ANNOTATION)
    }

    fn declared_annotation_names(&self) -> IndexSet<String> {
        self.names(Presence::DECLARED)
    }

    fn annotation_names_by_stereotype(&self, stereotype: &str) -> Vec<String> {
        match self.by_stereotype.get(stereotype) {
            Some(names) => names.clone(),
            None if self.has_annotation(stereotype) => vec![stereotype.to_string()],
            None => Vec::new(),
        }
    }

    fn declared_annotation_names_by_stereotype(&self, stereotype: &str) -> Vec<String> {
        match self.declared_by_stereotype.get(stereotype) {
            Some(names) => names.clone(),
            None if self.has_declared_annotation(stereotype) => vec![stereotype.to_string()],
            None => Vec::new(),
        }
    }

    fn find_annotation(&self, annotation: &str) -> Option<AnnotationValue> {
        match self.entries.get(annotation) {
            Some(entry) => Some(self.annotation_value(annotation, entry)),
            None => self
                .repeated_values(annotation, Presence::all())
                .and_then(|occurrences| occurrences.into_iter().next()),
        }
    }

    fn find_declared_annotation(&self, annotation: &str) -> Option<AnnotationValue> {
        match self.entry(annotation, Presence::ANY_DECLARED) {
            Some(entry) => Some(self.annotation_value(annotation, entry)),
            None => self
                .repeated_values(annotation, Presence::ANY_DECLARED)
                .and_then(|occurrences| occurrences.into_iter().next()),
        }
    }

    fn annotation_values_by_name(&self, annotation: &str) -> Vec<AnnotationValue> {
        self.values_by_name(annotation, Presence::all())
    }

    fn declared_annotation_values_by_name(&self, annotation: &str) -> Vec<AnnotationValue> {
        self.values_by_name(annotation, Presence::ANY_DECLARED)
    }

    fn default_values(&self, annotation: &str) -> Arc<MemberValues> {
        self.defaults.get(annotation).cloned().unwrap_or_else(no_defaults)
    }

    fn find_repeatable_annotation(&self, annotation: &str) -> Option<String> {
        self.repeated.get(annotation).cloned()
    }

    fn value_where(&self, annotation: &str, member: &str, accept: Accept<'_>) -> Option<MemberValue> {
        self.raw_value(annotation, member)
            .filter(|value| accept(value))
            .cloned()
    }

    fn values_where(&self, annotation: &str, member: &str, accept: Accept<'_>) -> Vec<MemberValue> {
        self.raw_value(annotation, member)
            .map(|value| {
                value
                    .elements()
                    .iter()
                    .filter(|element| accept(element))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_present(&self, annotation: &str, member: &str) -> bool {
        self.entries
            .get(annotation)
            .is_some_and(|entry| entry.values.contains_key(member))
    }
}

/// Builder for [`DefaultAnnotationMetadata`].
#[derive(Debug, Clone, Default)]
pub struct DefaultAnnotationMetadataBuilder {
    metadata: DefaultAnnotationMetadata,
}

impl DefaultAnnotationMetadataBuilder {
    /// Annotation written directly on the element.
    pub fn declared(mut self, value: AnnotationValue) -> Self {
        self.add(value, Presence::DECLARED);
        self
    }

    /// Annotation present through inheritance.
    pub fn inherited(mut self, value: AnnotationValue) -> Self {
        self.add(value, Presence::INHERITED);
        self
    }

    /// `stereotype` found as a meta-annotation of the declared annotation `of`.
    pub fn declared_stereotype(mut self, of: &str, stereotype: AnnotationValue) -> Self {
        push_unique(&mut self.metadata.declared_by_stereotype, stereotype.annotation_name(), of);
        push_unique(&mut self.metadata.by_stereotype, stereotype.annotation_name(), of);
        self.add(stereotype, Presence::DECLARED_STEREOTYPE);
        self
    }

    /// `stereotype` found as a meta-annotation of the inherited annotation `of`.
    pub fn inherited_stereotype(mut self, of: &str, stereotype: AnnotationValue) -> Self {
        push_unique(&mut self.metadata.by_stereotype, stereotype.annotation_name(), of);
        self.add(stereotype, Presence::STEREOTYPE);
        self
    }

    /// One occurrence of a repeatable annotation, grouped under `container`.
    pub fn declared_repeatable(mut self, container: &str, value: AnnotationValue) -> Self {
        self.add_repeatable(container, value, Presence::DECLARED);
        self
    }

    pub fn inherited_repeatable(mut self, container: &str, value: AnnotationValue) -> Self {
        self.add_repeatable(container, value, Presence::INHERITED);
        self
    }

    pub fn default_values(mut self, annotation: &str, values: MemberValues) -> Self {
        self.metadata
            .defaults
            .insert(annotation.to_string(), Arc::new(values));
        self
    }

    pub fn build(mut self) -> DefaultAnnotationMetadata {
        let metadata = &mut self.metadata;
        metadata.property_expressions = metadata
            .entries
            .values()
            .flat_map(|entry| entry.values.values())
            .chain(metadata.defaults.values().flat_map(|d| d.values()))
            .any(value_contains_placeholder);
        self.metadata
    }

    fn add(&mut self, value: AnnotationValue, presence: Presence) {
        let name = value.annotation_name().to_string();
        let entry = self.metadata.entries.entry(name).or_default();
        entry.presence |= presence;
        for (member, member_value) in value.values() {
            if !entry.values.contains_key(member) {
                entry.values.insert(member.clone(), member_value.clone());
            }
        }
    }

    fn add_repeatable(&mut self, container: &str, value: AnnotationValue, presence: Presence) {
        self.metadata
            .repeated
            .insert(value.annotation_name().to_string(), container.to_string());
        let entry = self.metadata.entries.entry(container.to_string()).or_default();
        entry.presence |= presence;
        let occurrences = entry
            .values
            .entry(VALUE_MEMBER.to_string())
            .or_insert_with(|| MemberValue::Array(Vec::new()));
        match occurrences {
            MemberValue::Array(items) => items.push(value.into()),
            other => {
                let previous = std::mem::replace(other, MemberValue::Array(Vec::new()));
                *other = MemberValue::Array(vec![previous, value.into()]);
            }
        }
    }
}

fn push_unique(map: &mut IndexMap<String, Vec<String>>, key: &str, name: &str) {
    let names = map.entry(key.to_string()).or_default();
    if !names.iter().any(|existing| existing == name) {
        names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_track_presence_flags() {
        let metadata = DefaultAnnotationMetadata::builder()
            .declared(AnnotationValue::marker("Singleton"))
            .inherited(AnnotationValue::marker("Transactional"))
            .declared_stereotype("Singleton", AnnotationValue::marker("Scope"))
            .build();

        assert!(metadata.has_declared_annotation("Singleton"));
        assert!(metadata.has_annotation("Transactional"));
        assert!(!metadata.has_declared_annotation("Transactional"));
        assert!(!metadata.has_annotation("Scope"));
        assert!(metadata.has_stereotype("Scope"));
        assert!(metadata.has_declared_stereotype("Scope"));
    }

    #[test]
    fn should_flag_property_expressions() {
        let plain = DefaultAnnotationMetadata::builder()
            .declared(AnnotationValue::builder("Value").value("static").build())
            .build();
        let templated = DefaultAnnotationMetadata::builder()
            .declared(AnnotationValue::builder("Value").value("${app.name}").build())
            .build();

        assert!(!plain.has_property_expressions());
        assert!(templated.has_property_expressions());
    }

    #[test]
    fn should_wrap_a_scalar_container_value_when_repeating() {
        let mut builder = DefaultAnnotationMetadata::builder();
        builder.add(
            AnnotationValue::builder("Tags").value("legacy").build(),
            Presence::DECLARED,
        );
        let metadata = builder
            .declared_repeatable("Tags", AnnotationValue::builder("Tag").value("x").build())
            .build();

        let occurrences = metadata.annotation_values_by_name("Tag");
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].string_value("value").as_deref(), Some("x"));
    }
}
