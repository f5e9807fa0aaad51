//! Annotation Metadata Hierarchy Tests
//!
//! Construction, precedence and aggregation across levels.

use annotation_core::{
    AnnotationMetadata, AnnotationMetadataExt, AnnotationValue, DefaultAnnotationMetadata,
    EmptyAnnotationMetadata, MemberValue, MemberValues, MetadataRef,
};
use annotation_inject::AnnotationMetadataHierarchy;
use std::sync::Arc;
use std::thread;

fn level(annotations: Vec<AnnotationValue>) -> MetadataRef {
    let builder = annotations
        .into_iter()
        .fold(DefaultAnnotationMetadata::builder(), |builder, value| builder.declared(value));
    Arc::new(builder.build())
}

fn marker(name: &str) -> MetadataRef {
    level(vec![AnnotationValue::marker(name)])
}

fn foo(members: Vec<(&str, MemberValue)>) -> AnnotationValue {
    members
        .into_iter()
        .fold(AnnotationValue::builder("Foo"), |builder, (name, value)| builder.member(name, value))
        .build()
}

mod construction {
    use super::*;

    #[test]
    fn should_expose_last_supplied_level_as_declared() {
        let (a, b, c) = (marker("A"), marker("B"), marker("C"));
        let hierarchy = AnnotationMetadataHierarchy::new(vec![a.clone(), b.clone(), c.clone()]);

        assert!(Arc::ptr_eq(hierarchy.declared_metadata(), &c));
        assert!(Arc::ptr_eq(hierarchy.root_metadata(), &a));
        assert_eq!(hierarchy.len(), 3);
    }

    #[test]
    fn should_iterate_from_root_to_declared() {
        let (a, b, c) = (marker("A"), marker("B"), marker("C"));
        let hierarchy = AnnotationMetadataHierarchy::new(vec![a.clone(), b.clone(), c.clone()]);

        let order: Vec<_> = hierarchy.iter().cloned().collect();
        assert_eq!(order.len(), 3);
        assert!(Arc::ptr_eq(&order[0], &a));
        assert!(Arc::ptr_eq(&order[1], &b));
        assert!(Arc::ptr_eq(&order[2], &c));

        let mut names = Vec::new();
        for level in &hierarchy {
            names.extend(level.declared_annotation_names());
        }
        assert_eq!(names, vec!["A".to_string(), "B".to_string(), "C".to_string()]);
    }

    #[test]
    fn should_behave_as_empty_level_without_input() {
        let hierarchy = AnnotationMetadataHierarchy::new(Vec::new());

        assert_eq!(hierarchy.len(), 2);
        assert!(hierarchy.is_empty());
        assert!(hierarchy.declared_metadata().as_any().is::<EmptyAnnotationMetadata>());
        assert!(hierarchy.annotation_names().is_empty());
        assert!(!hierarchy.has_annotation("Foo"));
        assert!(!hierarchy.has_stereotype("Foo"));
        assert_eq!(hierarchy.find_annotation("Foo"), None);
        assert_eq!(hierarchy.string_value("Foo", "value"), None);
        assert!(hierarchy.string_values("Foo", "value").is_empty());
        assert!(hierarchy.annotation_values_by_name("Foo").is_empty());
        assert!(hierarchy.default_values("Foo").is_empty());
        assert!(!hierarchy.has_property_expressions());
        assert!(hierarchy.synthesize_all().is_empty());
    }

    #[test]
    fn should_share_ancestors_with_siblings() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![marker("A"), marker("B"), marker("C")]);
        let child = marker("D");

        let sibling = hierarchy.create_sibling(child.clone());
        let sibling = sibling
            .as_any()
            .downcast_ref::<AnnotationMetadataHierarchy>()
            .expect("sibling of a multi-level hierarchy is a hierarchy");

        assert_eq!(sibling.len(), 3);
        assert!(Arc::ptr_eq(sibling.declared_metadata(), &child));
        assert!(Arc::ptr_eq(sibling.get(1).unwrap(), hierarchy.get(1).unwrap()));
        assert!(Arc::ptr_eq(sibling.get(2).unwrap(), hierarchy.get(2).unwrap()));
        assert!(hierarchy.has_declared_annotation("C"));
        assert!(sibling.has_declared_annotation("D"));
    }

    #[test]
    fn should_return_child_unwrapped_for_single_level() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![marker("A")]);
        let child = marker("B");

        let sibling = hierarchy.create_sibling(child.clone());
        assert!(Arc::ptr_eq(&sibling, &child));
    }
}

mod scalar_lookups {
    use super::*;

    #[test]
    fn should_prefer_most_specific_value() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![
            level(vec![foo(vec![("value", "y".into())])]),
            level(vec![foo(vec![("value", "x".into())])]),
        ]);

        assert_eq!(hierarchy.string_value("Foo", "value").as_deref(), Some("x"));
        assert_eq!(hierarchy.value("Foo", "value"), Some(MemberValue::from("x")));
    }

    #[test]
    fn should_fall_back_to_ancestors() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![
            level(vec![foo(vec![("timeout", 30.into()), ("enabled", true.into())])]),
            level(vec![foo(vec![("value", "x".into())])]),
        ]);

        assert_eq!(hierarchy.int_value("Foo", "timeout"), Some(30));
        assert_eq!(hierarchy.long_value("Foo", "timeout"), Some(30));
        assert_eq!(hierarchy.double_value("Foo", "timeout"), Some(30.0));
        assert!(hierarchy.is_true("Foo", "enabled"));
        assert!(!hierarchy.is_false("Foo", "enabled"));
    }

    #[test]
    fn should_skip_levels_whose_value_does_not_convert() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![
            level(vec![foo(vec![("size", 5.into())])]),
            level(vec![foo(vec![("size", "large".into())])]),
        ]);

        assert_eq!(hierarchy.int_value("Foo", "size"), Some(5));
        assert_eq!(hierarchy.string_value("Foo", "size").as_deref(), Some("large"));
        assert_eq!(hierarchy.get_value::<i64>("Foo", "size"), Some(5));
    }

    #[test]
    fn should_treat_absent_boolean_as_false() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![marker("Foo"), marker("Bar")]);

        assert_eq!(hierarchy.bool_value("Foo", "enabled"), None);
        assert!(!hierarchy.is_true("Foo", "enabled"));
        assert!(hierarchy.is_false("Foo", "enabled"));
        assert!(hierarchy.is_false("Missing", "enabled"));
    }

    #[test]
    fn should_read_declared_level_only_for_declared_queries() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![
            level(vec![foo(vec![("value", "inherited".into())])]),
            marker("Bar"),
        ]);

        assert!(hierarchy.has_annotation("Foo"));
        assert!(!hierarchy.has_declared_annotation("Foo"));
        assert!(hierarchy.has_declared_annotation("Bar"));
        assert_eq!(hierarchy.find_declared_annotation("Foo"), None);
        assert!(hierarchy.declared_annotation_values_by_name("Foo").is_empty());
        assert_eq!(
            hierarchy.declared_annotation_names().into_iter().collect::<Vec<_>>(),
            vec!["Bar".to_string()]
        );
    }

    #[test]
    fn should_report_presence_and_defaults_from_any_level() {
        let mut defaults = MemberValues::new();
        defaults.insert("retries".to_string(), MemberValue::Int(3));
        let root: MetadataRef = Arc::new(
            DefaultAnnotationMetadata::builder()
                .declared(foo(vec![("value", "x".into())]))
                .default_values("Foo", defaults)
                .build(),
        );
        let hierarchy = AnnotationMetadataHierarchy::new(vec![root, marker("Foo")]);

        assert!(hierarchy.is_present("Foo", "value"));
        assert!(!hierarchy.is_present("Foo", "retries"));
        assert_eq!(hierarchy.default_value("Foo", "retries"), Some(MemberValue::Int(3)));
        assert_eq!(hierarchy.default_values("Foo").len(), 1);
        assert_eq!(hierarchy.int_value("Foo", "retries"), Some(3));
        assert_eq!(hierarchy.member_values("Foo").len(), 1);
    }
}

mod aggregation {
    use super::*;

    #[test]
    fn should_fill_in_missing_members_from_ancestors() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![
            level(vec![foo(vec![("a", 9.into()), ("b", 2.into())])]),
            level(vec![foo(vec![("a", 1.into())])]),
        ]);

        let merged = hierarchy.find_annotation("Foo").unwrap();
        assert_eq!(merged.int_value("a"), Some(1));
        assert_eq!(merged.int_value("b"), Some(2));
        assert_eq!(merged.values().len(), 2);
    }

    #[test]
    fn should_concatenate_array_values_keeping_duplicates() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![
            level(vec![foo(vec![("value", vec!["b", "c"].into())])]),
            level(vec![foo(vec![("other", 1.into())])]),
            level(vec![foo(vec![("value", vec!["a", "b"].into())])]),
        ]);

        assert_eq!(
            hierarchy.string_values("Foo", "value"),
            vec!["a", "b", "b", "c"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn should_concatenate_class_values() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![
            level(vec![foo(vec![("types", vec!["com.example.B"].into())])]),
            level(vec![foo(vec![("types", vec!["com.example.A"].into())])]),
        ]);

        let names: Vec<_> = hierarchy
            .class_values("Foo", "types")
            .iter()
            .map(|class| class.simple_name().to_string())
            .collect();
        assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn should_dedupe_repeated_occurrences() {
        let tag = |value: &str| AnnotationValue::builder("Tag").value(value).build();
        let tags = |values: &[&str]| -> MetadataRef {
            let builder = values.iter().fold(DefaultAnnotationMetadata::builder(), |builder, v| {
                builder.declared_repeatable("Tags", tag(v))
            });
            Arc::new(builder.build())
        };
        let hierarchy = AnnotationMetadataHierarchy::new(vec![tags(&["x", "z"]), tags(&["y", "x"])]);

        let values: Vec<_> = hierarchy
            .annotation_values_by_name("Tag")
            .iter()
            .filter_map(|value| value.string_value("value"))
            .collect();
        assert_eq!(values, vec!["y".to_string(), "x".to_string(), "z".to_string()]);
        assert_eq!(hierarchy.declared_annotation_values_by_name("Tag").len(), 2);
        assert!(hierarchy.is_repeatable_annotation("Tag"));
        assert_eq!(hierarchy.find_repeatable_annotation("Tag").as_deref(), Some("Tags"));
    }

    #[test]
    fn should_union_annotation_names() {
        let hierarchy = AnnotationMetadataHierarchy::new(vec![
            level(vec![AnnotationValue::marker("A"), AnnotationValue::marker("B")]),
            level(vec![AnnotationValue::marker("B"), AnnotationValue::marker("C")]),
        ]);

        let names = hierarchy.annotation_names();
        assert_eq!(names.len(), 3);
        assert!(["A", "B", "C"].iter().all(|name| names.contains(*name)));
    }

    #[test]
    fn should_concatenate_names_by_stereotype() {
        let stereotyped = |of: &str| -> MetadataRef {
            Arc::new(
                DefaultAnnotationMetadata::builder()
                    .declared(AnnotationValue::marker(of))
                    .declared_stereotype(of, AnnotationValue::marker("Scope"))
                    .build(),
            )
        };
        let hierarchy = AnnotationMetadataHierarchy::new(vec![stereotyped("Singleton"), stereotyped("Prototype")]);

        assert_eq!(
            hierarchy.annotation_names_by_stereotype("Scope"),
            vec!["Prototype".to_string(), "Singleton".to_string()]
        );
        assert_eq!(
            hierarchy.declared_annotation_names_by_stereotype("Scope"),
            vec!["Prototype".to_string()]
        );
        assert!(hierarchy.has_stereotype("Scope"));
        assert!(hierarchy.has_declared_stereotype("Scope"));
    }

    #[test]
    fn should_be_empty_only_when_every_level_is() {
        let partly = AnnotationMetadataHierarchy::new(vec![
            marker("A"),
            Arc::new(EmptyAnnotationMetadata) as MetadataRef,
        ]);
        assert!(!partly.is_empty());
        assert!(partly.has_annotation("A"));
    }
}

#[test]
fn should_answer_queries_from_many_threads() {
    let hierarchy: MetadataRef = Arc::new(AnnotationMetadataHierarchy::new(vec![
        level(vec![foo(vec![("value", "root".into()), ("size", 1.into())])]),
        level(vec![foo(vec![("value", "leaf".into())])]),
    ]));

    thread::scope(|scope| {
        for _ in 0..4 {
            let hierarchy = hierarchy.clone();
            scope.spawn(move || {
                assert_eq!(hierarchy.string_value("Foo", "value").as_deref(), Some("leaf"));
                assert_eq!(hierarchy.int_value("Foo", "size"), Some(1));
            });
        }
    });
}
