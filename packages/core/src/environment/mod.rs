//! Environment Coercion
//!
//! Optional per-level capability: lookups that run raw values through
//! placeholder expansion and a caller supplied mapper before coercion.

mod placeholder;

pub use placeholder::{
    contains_placeholder, value_contains_placeholder, MapPropertyResolver,
    PropertyPlaceholderResolver,
};

use crate::annotation_value::AnnotationValue;
use crate::convert::{self, FromMemberValue};
use crate::logging::{Logger, NullLogger};
use crate::metadata::{Accept, AnnotationMetadata, MetadataRef, ValueMapper};
use crate::synthesis::AnnotationProxy;
use crate::value::{ClassRef, MemberValue, MemberValues};
use indexmap::IndexSet;
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Environment aware overloads of the scalar and array lookups.
pub trait EnvironmentAnnotationMetadata: AnnotationMetadata {
    fn mapped_value_where(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
        accept: Accept<'_>,
    ) -> Option<MemberValue>;

    fn mapped_values_where(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
        accept: Accept<'_>,
    ) -> Vec<MemberValue>;

    fn string_value_mapped(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Option<String> {
        lookup_mapped(self, annotation, member, mapper)
    }

    fn string_values_mapped(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Vec<String> {
        lookup_all_mapped(self, annotation, member, mapper)
    }

    fn bool_value_mapped(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Option<bool> {
        lookup_mapped(self, annotation, member, mapper)
    }

    fn is_true_mapped(&self, annotation: &str, member: &str, mapper: Option<&dyn ValueMapper>) -> bool {
        self.bool_value_mapped(annotation, member, mapper).unwrap_or(false)
    }

    fn is_false_mapped(&self, annotation: &str, member: &str, mapper: Option<&dyn ValueMapper>) -> bool {
        !self.bool_value_mapped(annotation, member, mapper).unwrap_or(false)
    }

    fn int_value_mapped(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Option<i32> {
        lookup_mapped(self, annotation, member, mapper)
    }

    fn long_value_mapped(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Option<i64> {
        lookup_mapped(self, annotation, member, mapper)
    }

    fn double_value_mapped(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Option<f64> {
        lookup_mapped(self, annotation, member, mapper)
    }

    fn class_value_mapped(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Option<ClassRef> {
        lookup_mapped(self, annotation, member, mapper)
    }

    fn class_values_mapped(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Vec<ClassRef> {
        lookup_all_mapped(self, annotation, member, mapper)
    }
}

fn lookup_mapped<T, M>(
    metadata: &M,
    annotation: &str,
    member: &str,
    mapper: Option<&dyn ValueMapper>,
) -> Option<T>
where
    T: FromMemberValue,
    M: EnvironmentAnnotationMetadata + ?Sized,
{
    metadata
        .mapped_value_where(annotation, member, mapper, &convert::accepts::<T>)
        .and_then(|value| T::from_member_value(&value))
}

fn lookup_all_mapped<T, M>(
    metadata: &M,
    annotation: &str,
    member: &str,
    mapper: Option<&dyn ValueMapper>,
) -> Vec<T>
where
    T: FromMemberValue,
    M: EnvironmentAnnotationMetadata + ?Sized,
{
    metadata
        .mapped_values_where(annotation, member, mapper, &convert::accepts::<T>)
        .iter()
        .filter_map(T::from_member_value)
        .collect()
}

/// Generic environment aware lookups.
pub trait EnvironmentAnnotationMetadataExt: EnvironmentAnnotationMetadata {
    fn get_value_mapped<T: FromMemberValue>(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Option<T> {
        lookup_mapped(self, annotation, member, mapper)
    }

    fn enum_value_mapped<E: FromStr>(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Option<E> {
        self.mapped_value_where(annotation, member, mapper, &convert::accepts_enum::<E>)
            .and_then(|value| convert::to_enum(&value))
    }

    fn enum_values_mapped<E: FromStr>(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
    ) -> Vec<E> {
        self.mapped_values_where(annotation, member, mapper, &convert::accepts_enum::<E>)
            .iter()
            .filter_map(convert::to_enum::<E>)
            .collect()
    }
}

impl<M: EnvironmentAnnotationMetadata + ?Sized> EnvironmentAnnotationMetadataExt for M {}

/// A level whose values are expanded against the environment before they
/// are returned.
///
/// Plain lookups behave like mapped lookups without a caller mapper, so the
/// environment applies no matter which overload a caller uses.
pub struct EnvironmentMetadata {
    inner: MetadataRef,
    resolver: Arc<dyn PropertyPlaceholderResolver>,
    logger: Arc<dyn Logger>,
    ignore_unresolvable: bool,
}

impl EnvironmentMetadata {
    pub fn new(inner: MetadataRef, resolver: Arc<dyn PropertyPlaceholderResolver>) -> Self {
        Self {
            inner,
            resolver,
            logger: Arc::new(NullLogger::new()),
            ignore_unresolvable: false,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Keep unresolvable expressions as literal text instead of reporting
    /// the value as absent.
    pub fn ignore_unresolvable(mut self, ignore: bool) -> Self {
        self.ignore_unresolvable = ignore;
        self
    }

    pub fn inner(&self) -> &MetadataRef {
        &self.inner
    }

    fn transform(
        &self,
        annotation: &str,
        member: &str,
        raw: MemberValue,
        mapper: Option<&dyn ValueMapper>,
    ) -> Option<MemberValue> {
        let expanded = if !self.inner.has_property_expressions() {
            raw
        } else {
            match placeholder::expand(raw, self.resolver.as_ref(), self.ignore_unresolvable) {
                Ok(expanded) => {
                    if self.ignore_unresolvable && value_contains_placeholder(&expanded) {
                        self.logger.debug(&format!(
                            "Unresolvable placeholder in @{}.{}, kept as text: {}",
                            annotation, member, expanded
                        ));
                    }
                    expanded
                }
                Err(err) => {
                    self.logger.debug(&format!("{} in @{}.{}", err, annotation, member));
                    return None;
                }
            }
        };
        Some(match mapper {
            Some(mapper) => mapper.map_value(expanded),
            None => expanded,
        })
    }
}

impl fmt::Debug for EnvironmentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentMetadata")
            .field("inner", &self.inner)
            .field("ignore_unresolvable", &self.ignore_unresolvable)
            .finish_non_exhaustive()
    }
}

impl EnvironmentAnnotationMetadata for EnvironmentMetadata {
    fn mapped_value_where(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
        accept: Accept<'_>,
    ) -> Option<MemberValue> {
        let raw = self.inner.value(annotation, member)?;
        let value = self.transform(annotation, member, raw, mapper)?;
        if accept(&value) {
            Some(value)
        } else {
            self.logger.debug(&format!(
                "@{}.{} = {} cannot be converted to the requested type",
                annotation, member, value
            ));
            None
        }
    }

    fn mapped_values_where(
        &self,
        annotation: &str,
        member: &str,
        mapper: Option<&dyn ValueMapper>,
        accept: Accept<'_>,
    ) -> Vec<MemberValue> {
        self.inner
            .value(annotation, member)
            .and_then(|raw| self.transform(annotation, member, raw, mapper))
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
}

impl AnnotationMetadata for EnvironmentMetadata {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_environment(&self) -> Option<&dyn EnvironmentAnnotationMetadata> {
        Some(self)
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn has_property_expressions(&self) -> bool {
        self.inner.has_property_expressions()
    }

    fn has_annotation(&self, annotation: &str) -> bool {
        self.inner.has_annotation(annotation)
    }

    fn has_declared_annotation(&self, annotation: &str) -> bool {
        self.inner.has_declared_annotation(annotation)
    }

    fn has_stereotype(&self, annotation: &str) -> bool {
        self.inner.has_stereotype(annotation)
    }

    fn has_declared_stereotype(&self, annotation: &str) -> bool {
        self.inner.has_declared_stereotype(annotation)
    }

    fn annotation_names(&self) -> IndexSet<String> {
        self.inner.annotation_names()
    }

    fn declared_annotation_names(&self) -> IndexSet<String> {
        self.inner.declared_annotation_names()
    }

    fn annotation_names_by_stereotype(&self, stereotype: &str) -> Vec<String> {
        self.inner.annotation_names_by_stereotype(stereotype)
    }

    fn declared_annotation_names_by_stereotype(&self, stereotype: &str) -> Vec<String> {
        self.inner.declared_annotation_names_by_stereotype(stereotype)
    }

    fn find_annotation(&self, annotation: &str) -> Option<AnnotationValue> {
        self.inner.find_annotation(annotation)
    }

    fn find_declared_annotation(&self, annotation: &str) -> Option<AnnotationValue> {
        self.inner.find_declared_annotation(annotation)
    }

    fn annotation_values_by_name(&self, annotation: &str) -> Vec<AnnotationValue> {
        self.inner.annotation_values_by_name(annotation)
    }

    fn declared_annotation_values_by_name(&self, annotation: &str) -> Vec<AnnotationValue> {
        self.inner.declared_annotation_values_by_name(annotation)
    }

    fn default_values(&self, annotation: &str) -> Arc<MemberValues> {
        self.inner.default_values(annotation)
    }

    fn find_repeatable_annotation(&self, annotation: &str) -> Option<String> {
        self.inner.find_repeatable_annotation(annotation)
    }

    fn value_where(&self, annotation: &str, member: &str, accept: Accept<'_>) -> Option<MemberValue> {
        self.mapped_value_where(annotation, member, None, accept)
    }

    fn values_where(&self, annotation: &str, member: &str, accept: Accept<'_>) -> Vec<MemberValue> {
        self.mapped_values_where(annotation, member, None, accept)
    }

    fn member_values(&self, annotation: &str) -> MemberValues {
        self.inner.member_values(annotation)
    }

    fn is_present(&self, annotation: &str, member: &str) -> bool {
        self.inner.is_present(annotation, member)
    }

    fn default_value(&self, annotation: &str, member: &str) -> Option<MemberValue> {
        self.inner.default_value(annotation, member)
    }

    fn synthesize_all(&self) -> Vec<AnnotationProxy> {
        self.inner.synthesize_all()
    }

    fn synthesize_declared_all(&self) -> Vec<AnnotationProxy> {
        self.inner.synthesize_declared_all()
    }
}
