//! Metadata Configuration
//!
//! Settings for the environment layer, loaded from JSON.

use crate::environment::{EnvironmentMetadata, MapPropertyResolver};
use crate::error::{MetadataError, Result};
use crate::logging::{ConsoleLogger, LogLevel, Logger};
use crate::metadata::MetadataRef;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Values for `${key}` expressions.
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub placeholders: PlaceholderOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderOptions {
    /// Keep unresolvable expressions as text instead of treating the value
    /// as absent.
    #[serde(default)]
    pub ignore_unresolvable: bool,
}

impl MetadataConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|err| MetadataError::Config(err.to_string()))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        Ok(config)
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::new(ConsoleLogger::new(self.log_level))
    }

    pub fn property_resolver(&self) -> MapPropertyResolver {
        MapPropertyResolver::new(self.properties.clone())
    }

    /// Wraps `level` so that its values are expanded with these settings.
    pub fn environment(&self, level: MetadataRef) -> EnvironmentMetadata {
        EnvironmentMetadata::new(level, Arc::new(self.property_resolver()))
            .with_logger(self.logger())
            .ignore_unresolvable(self.placeholders.ignore_unresolvable)
    }
}
