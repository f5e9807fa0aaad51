#![deny(clippy::all)]

/**
 * Annotation Inject
 *
 * Hierarchical view over annotation metadata: an element's own annotations
 * layered over those of its ancestors.
 */

pub mod annotation;

pub use annotation::hierarchy::AnnotationMetadataHierarchy;
