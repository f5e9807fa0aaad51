//! Metadata Errors
//!
//! Queries never fail: absence is the normal outcome. These errors only
//! surface from typed synthesis and configuration, or are raised internally
//! and degraded to absence at the query boundary.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Unresolvable placeholder: {expression}")]
    UnresolvablePlaceholder { expression: String },

    #[error("Annotation @{annotation} has no value or default for member '{member}'")]
    MissingMember { annotation: String, member: String },

    #[error("Member '{member}' of @{annotation} cannot be converted to {expected}")]
    InvalidMember {
        annotation: String,
        member: String,
        expected: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
