//! Placeholder Expressions
//!
//! Detection of `${...}` expressions and a map backed resolver for them.

use crate::error::{MetadataError, Result};
use crate::value::MemberValue;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// `${key}` or `${key:default}`.
static PLACEHOLDER_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

pub fn contains_placeholder(value: &str) -> bool {
    PLACEHOLDER_REGEXP.is_match(value)
}

pub fn value_contains_placeholder(value: &MemberValue) -> bool {
    value.any_string(&contains_placeholder)
}

/// Expands placeholder expressions found in member values.
///
/// Implemented by the property resolution engine of the host environment.
pub trait PropertyPlaceholderResolver: Send + Sync {
    /// Expands every expression in `value`, failing on the first expression
    /// that cannot be resolved.
    fn resolve_placeholders(&self, value: &str) -> Result<String>;

    /// Expands each expression on its own. Expressions that cannot be
    /// resolved are left as written.
    fn resolve_placeholders_lenient(&self, value: &str) -> String {
        PLACEHOLDER_REGEXP
            .replace_all(value, |caps: &Captures<'_>| {
                self.resolve_placeholders(&caps[0])
                    .unwrap_or_else(|_| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Resolver backed by a flat key to value map.
#[derive(Debug, Clone, Default)]
pub struct MapPropertyResolver {
    properties: HashMap<String, String>,
}

impl MapPropertyResolver {
    pub fn new(properties: HashMap<String, String>) -> Self {
        Self { properties }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

impl PropertyPlaceholderResolver for MapPropertyResolver {
    fn resolve_placeholders(&self, value: &str) -> Result<String> {
        let mut unresolved: Option<String> = None;
        let resolved = PLACEHOLDER_REGEXP.replace_all(value, |caps: &Captures<'_>| {
            let expression = &caps[1];
            let (key, default) = match expression.split_once(':') {
                Some((key, default)) => (key.trim(), Some(default)),
                None => (expression.trim(), None),
            };
            match self.get(key).or(default) {
                Some(found) => found.to_string(),
                None => {
                    unresolved.get_or_insert_with(|| caps[0].to_string());
                    caps[0].to_string()
                }
            }
        });
        match unresolved {
            Some(expression) => Err(MetadataError::UnresolvablePlaceholder { expression }),
            None => Ok(resolved.into_owned()),
        }
    }
}

/// Expands strings, and strings inside arrays, through `resolver`.
///
/// When `lenient`, unresolvable expressions stay as text and this never fails.
pub(crate) fn expand(
    value: MemberValue,
    resolver: &dyn PropertyPlaceholderResolver,
    lenient: bool,
) -> Result<MemberValue> {
    match value {
        MemberValue::String(s) if contains_placeholder(&s) => {
            if lenient {
                Ok(MemberValue::String(resolver.resolve_placeholders_lenient(&s)))
            } else {
                resolver.resolve_placeholders(&s).map(MemberValue::String)
            }
        }
        MemberValue::Array(items) => items
            .into_iter()
            .map(|item| expand(item, resolver, lenient))
            .collect::<Result<Vec<_>>>()
            .map(MemberValue::Array),
        other => Ok(other),
    }
}
