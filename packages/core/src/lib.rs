#![deny(clippy::all)]

/**
 * Annotation Core
 *
 * Value model, per-level query contract and environment coercion hook for
 * compile-time annotation metadata.
 */

// Value model
pub mod annotation_value;
pub mod convert;
pub mod value;

// Per-level metadata
pub mod default_metadata;
pub mod environment;
pub mod metadata;
pub mod synthesis;

// Ambient
pub mod config;
mod error;
pub mod logging;

// Re-exports
pub use annotation_value::{AnnotationValue, AnnotationValueBuilder};
pub use config::{MetadataConfig, PlaceholderOptions};
pub use convert::FromMemberValue;
pub use default_metadata::{DefaultAnnotationMetadata, DefaultAnnotationMetadataBuilder, Presence};
pub use environment::{
    EnvironmentAnnotationMetadata, EnvironmentAnnotationMetadataExt, EnvironmentMetadata,
    MapPropertyResolver, PropertyPlaceholderResolver,
};
pub use error::{MetadataError, Result};
pub use logging::{ConsoleLogger, LogLevel, Logger, NullLogger};
pub use metadata::{
    empty_metadata, Accept, AnnotationMetadata, AnnotationMetadataExt, EmptyAnnotationMetadata,
    MetadataRef, ValueMapper,
};
pub use synthesis::{Annotation, AnnotationProxy};
pub use value::{ClassRef, MemberValue, MemberValues};
