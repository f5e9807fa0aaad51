//! Metadata Configuration Tests

use annotation_core::{
    AnnotationMetadata, AnnotationValue, DefaultAnnotationMetadata, LogLevel, Logger, MetadataConfig,
    MetadataError, MetadataRef, PropertyPlaceholderResolver,
};
use std::fs;
use std::sync::Arc;

const CONFIG: &str = r#"{
    "logLevel": "debug",
    "properties": {
        "datasource.url": "jdbc:h2:mem",
        "datasource.pool": "4"
    },
    "placeholders": {
        "ignoreUnresolvable": true
    }
}"#;

fn datasource() -> MetadataRef {
    Arc::new(
        DefaultAnnotationMetadata::builder()
            .declared(
                AnnotationValue::builder("DataSource")
                    .member("url", "${datasource.url}")
                    .member("pool", "${datasource.pool}")
                    .member("user", "${datasource.user}")
                    .build(),
            )
            .build(),
    )
}

#[test]
fn should_parse_camel_case_keys() {
    let config = MetadataConfig::from_json_str(CONFIG).unwrap();

    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.properties.len(), 2);
    assert!(config.placeholders.ignore_unresolvable);
    assert_eq!(config.logger().level(), LogLevel::Debug);
}

#[test]
fn should_build_resolver_from_properties() {
    let config = MetadataConfig::from_json_str(CONFIG).unwrap();
    let resolver = config.property_resolver();

    assert_eq!(
        resolver.resolve_placeholders("${datasource.url}?pool=${datasource.pool}").unwrap(),
        "jdbc:h2:mem?pool=4"
    );
}

#[test]
fn should_wrap_levels_with_configured_environment() {
    let config = MetadataConfig::from_json_str(CONFIG).unwrap();
    let environment = config.environment(datasource());

    assert_eq!(environment.string_value("DataSource", "url").as_deref(), Some("jdbc:h2:mem"));
    assert_eq!(environment.int_value("DataSource", "pool"), Some(4));
    assert_eq!(
        environment.string_value("DataSource", "user").as_deref(),
        Some("${datasource.user}")
    );
}

#[test]
fn should_drop_unresolvable_values_by_default() {
    let config = MetadataConfig::default();
    let environment = config.environment(datasource());
    assert_eq!(environment.string_value("DataSource", "url"), None);
}

#[test]
fn should_report_invalid_json_as_config_error() {
    let err = MetadataConfig::from_json_str("{\"properties\": [1, 2]}").unwrap_err();
    assert!(matches!(err, MetadataError::Config(_)));
}

#[test]
fn should_load_from_file() {
    let path = std::env::temp_dir().join(format!("annotation-config-{}.json", std::process::id()));
    fs::write(&path, CONFIG).unwrap();

    let config = MetadataConfig::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(config.properties.get("datasource.pool").map(String::as_str), Some("4"));
}

#[test]
fn should_fail_to_load_missing_file() {
    let path = std::env::temp_dir().join("annotation-config-does-not-exist.json");
    assert!(MetadataConfig::load(&path).is_err());
}
