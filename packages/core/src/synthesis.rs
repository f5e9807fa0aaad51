//! Annotation Synthesis
//!
//! Builds annotation-like objects from annotation values, for callers that
//! want a typed view instead of a raw member map.

use crate::annotation_value::AnnotationValue;
use crate::convert::FromMemberValue;
use crate::error::{MetadataError, Result};
use crate::value::MemberValue;
use std::fmt;
use std::str::FromStr;

/// A typed annotation that can be synthesized from metadata.
///
/// ```ignore
/// struct Named { value: String }
///
/// impl Annotation for Named {
///     const NAME: &'static str = "javax.inject.Named";
///
///     fn synthesize(proxy: &AnnotationProxy) -> Result<Self> {
///         Ok(Named { value: proxy.required("value")? })
///     }
/// }
/// ```
pub trait Annotation: Sized {
    /// Annotation name, as used in metadata lookups.
    const NAME: &'static str;

    fn synthesize(proxy: &AnnotationProxy) -> Result<Self>;
}

/// Annotation-like view over one annotation value. Member reads fall back to
/// the annotation's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationProxy {
    value: AnnotationValue,
}

impl AnnotationProxy {
    pub fn new(value: AnnotationValue) -> Self {
        Self { value }
    }

    pub fn annotation_name(&self) -> &str {
        self.value.annotation_name()
    }

    pub fn annotation_value(&self) -> &AnnotationValue {
        &self.value
    }

    pub fn member<T: FromMemberValue>(&self, member: &str) -> Option<T> {
        self.value.get_as(member)
    }

    /// Member that must be set explicitly or through a default.
    pub fn required<T: FromMemberValue>(&self, member: &str) -> Result<T> {
        let raw = self.raw(member)?;
        T::from_member_value(raw).ok_or_else(|| self.invalid(member, T::EXPECTED))
    }

    /// Like [`required`](Self::required) but absent members yield `None`.
    /// Present members that do not convert are still an error.
    pub fn optional<T: FromMemberValue>(&self, member: &str) -> Result<Option<T>> {
        match self.value.get(member) {
            None => Ok(None),
            Some(raw) => T::from_member_value(raw)
                .map(Some)
                .ok_or_else(|| self.invalid(member, T::EXPECTED)),
        }
    }

    pub fn required_enum<E: FromStr>(&self, member: &str) -> Result<E> {
        let raw = self.raw(member)?;
        crate::convert::to_enum(raw).ok_or_else(|| self.invalid(member, "enum"))
    }

    fn raw(&self, member: &str) -> Result<&MemberValue> {
        self.value.get(member).ok_or_else(|| MetadataError::MissingMember {
            annotation: self.annotation_name().to_string(),
            member: member.to_string(),
        })
    }

    fn invalid(&self, member: &str, expected: &'static str) -> MetadataError {
        MetadataError::InvalidMember {
            annotation: self.annotation_name().to_string(),
            member: member.to_string(),
            expected,
        }
    }
}

impl fmt::Display for AnnotationProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<AnnotationValue> for AnnotationProxy {
    fn from(value: AnnotationValue) -> Self {
        Self::new(value)
    }
}

/// Synthesizes `A` from one occurrence.
pub fn build_annotation<A: Annotation>(value: &AnnotationValue) -> Result<A> {
    A::synthesize(&AnnotationProxy::new(value.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::MemberValues;
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    struct Retry {
        attempts: i32,
        delay: String,
        jitter: Option<f64>,
    }

    impl Annotation for Retry {
        const NAME: &'static str = "Retryable";

        fn synthesize(proxy: &AnnotationProxy) -> Result<Self> {
            Ok(Retry {
                attempts: proxy.required("attempts")?,
                delay: proxy.required("delay")?,
                jitter: proxy.optional("jitter")?,
            })
        }
    }

    fn retry_defaults() -> Arc<MemberValues> {
        let mut defaults = MemberValues::new();
        defaults.insert("attempts".to_string(), MemberValue::Int(3));
        defaults.insert("delay".to_string(), MemberValue::from("1s"));
        Arc::new(defaults)
    }

    #[test]
    fn should_synthesize_with_defaults() {
        let value = AnnotationValue::builder("Retryable")
            .member("attempts", 5)
            .defaults(retry_defaults())
            .build();

        let retry: Retry = build_annotation(&value).unwrap();
        assert_eq!(
            retry,
            Retry {
                attempts: 5,
                delay: "1s".to_string(),
                jitter: None,
            }
        );
    }

    #[test]
    fn should_report_missing_member() {
        let value = AnnotationValue::builder("Retryable").member("attempts", 1).build();
        let err = build_annotation::<Retry>(&value).unwrap_err();
        assert_eq!(
            err,
            MetadataError::MissingMember {
                annotation: "Retryable".to_string(),
                member: "delay".to_string(),
            }
        );
    }

    #[test]
    fn should_report_unconvertible_member() {
        let value = AnnotationValue::builder("Retryable")
            .member("attempts", "many")
            .member("delay", "1s")
            .build();
        let err = build_annotation::<Retry>(&value).unwrap_err();
        assert!(matches!(err, MetadataError::InvalidMember { expected: "int", .. }));
    }

    #[test]
    fn should_compare_proxies_structurally() {
        let a = AnnotationProxy::new(AnnotationValue::builder("Tag").value("x").build());
        let b = AnnotationProxy::new(AnnotationValue::builder("Tag").value("x").build());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "@Tag(value=\"x\")");
        assert_eq!(a.member::<String>("value").as_deref(), Some("x"));
        assert_eq!(a.annotation_value().string_value("value").as_deref(), Some("x"));
    }
}
