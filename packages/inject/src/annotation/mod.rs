pub mod hierarchy;

pub use hierarchy::AnnotationMetadataHierarchy;
