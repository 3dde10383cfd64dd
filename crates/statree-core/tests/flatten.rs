//! Definition tree flattening.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeSet;

use statree_core::{flatten, Definition, MetricType, MetricValue};

fn names(tree: &Definition) -> BTreeSet<String> {
    flatten(tree).unwrap().into_iter().map(|m| m.name).collect()
}

#[test]
fn nested_keys_join_with_slash() {
    let tree = Definition::group()
        .with("a", Definition::group().with("b", Definition::leaf(MetricType::Counter)))
        .with("c", Definition::leaf(MetricType::Gauge));

    let flat = flatten(&tree).unwrap();
    let got: Vec<(&str, MetricType)> = flat.iter().map(|m| (m.name.as_str(), m.ty)).collect();
    assert_eq!(got, vec![("a/b", MetricType::Counter), ("c", MetricType::Gauge)]);
    assert!(flat.iter().all(|m| m.callback.is_none()));
}

#[test]
fn deep_tree_yields_every_root_to_leaf_path() {
    let tree = Definition::group()
        .with(
            "users",
            Definition::group().with(
                "total",
                Definition::group()
                    .with("active", Definition::leaf(MetricType::Gauge))
                    .with("banned", Definition::leaf(MetricType::Counter))
                    .with("by", Definition::group().with("region", Definition::leaf(MetricType::String))),
            ),
        )
        .with("up", Definition::leaf(MetricType::Boolean));

    let expected: BTreeSet<String> = [
        "users/total/active",
        "users/total/banned",
        "users/total/by/region",
        "up",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(names(&tree), expected);
}

#[test]
fn callback_leaf_carries_callable() {
    let tree = Definition::group().with(
        "queue",
        Definition::group().with("depth", Definition::callback(|| Ok(MetricValue::Integer(7)))),
    );
    let flat = flatten(&tree).unwrap();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].name, "queue/depth");
    assert_eq!(flat[0].ty, MetricType::Callback);
    let f = flat[0].callback.as_ref().expect("callable kept");
    assert_eq!(f().unwrap(), MetricValue::Integer(7));
}

#[test]
fn empty_group_produces_nothing() {
    let tree = Definition::group()
        .with("empty", Definition::group())
        .with("x", Definition::leaf(MetricType::Timestamp));
    assert_eq!(names(&tree), BTreeSet::from(["x".to_string()]));
    assert!(flatten(&Definition::group()).unwrap().is_empty());
}

#[test]
fn key_with_separator_is_rejected() {
    let tree = Definition::group().with("a/b", Definition::leaf(MetricType::Counter));
    let err = flatten(&tree).expect_err("must fail");
    assert_eq!(err.to_string(), "invalid metric name: \"a/b\"");

    let tree = Definition::group().with("/", Definition::leaf(MetricType::Counter));
    assert!(flatten(&tree).is_err());

    let tree = Definition::group().with("a", Definition::group().with("", Definition::leaf(MetricType::Gauge)));
    let err = flatten(&tree).expect_err("empty segment");
    assert!(matches!(err, statree_core::StatreeError::InvalidMetricName(n) if n == "a/"));
}

#[test]
fn unknown_tag_and_bare_callback_fail() {
    let tree = Definition::group().with("x", Definition::Leaf("histogram".into()));
    let err = flatten(&tree).expect_err("unknown tag");
    assert!(matches!(err, statree_core::StatreeError::UnknownType { ref tag, .. } if tag == "histogram"));

    let tree = Definition::group().with("x", Definition::Leaf("callback".into()));
    let err = flatten(&tree).expect_err("no callable");
    assert!(matches!(err, statree_core::StatreeError::MissingCallback(ref n) if n == "x"));
}

#[test]
fn leaf_root_is_not_a_tree() {
    assert!(flatten(&Definition::leaf(MetricType::Counter)).is_err());
}

#[test]
fn deserializes_from_yaml() {
    let yaml = r#"
messages:
  outgoing:
    total: counter
    suppressed: counter
  incoming:
    total: counter
started: timestamp
spare: {}
"#;
    let tree: Definition = serde_yaml::from_str(yaml).unwrap();
    let expected: BTreeSet<String> = [
        "messages/outgoing/total",
        "messages/outgoing/suppressed",
        "messages/incoming/total",
        "started",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(names(&tree), expected);
}
