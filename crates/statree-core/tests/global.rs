//! Process-wide default registry. Kept in its own test binary so no other
//! test constructs a registry first.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use statree_core::{Definition, MetricType, QueryEngine, QueryStatus, Registry};

#[test]
fn first_registry_becomes_global() {
    assert!(Registry::global().is_none());
    assert_eq!(QueryEngine::global().get_all().status, QueryStatus::CollectorFail);

    // A failed construction never installs anything.
    let bad = Definition::group().with("a/b", Definition::leaf(MetricType::Counter));
    assert!(Registry::new(&bad).is_err());
    assert!(Registry::global().is_none());

    let first = Registry::new(&Definition::group().with("up", Definition::leaf(MetricType::Boolean))).unwrap();
    let second = Registry::empty();

    let global = Registry::global().expect("installed");
    assert!(Arc::ptr_eq(&global, &first));
    assert!(first.is_global());
    assert!(!second.is_global());

    // Second registry stays an ordinary, independent instance.
    second.add_metric("only/here", MetricType::Gauge, None).unwrap();
    assert!(global.metric("only/here").is_err());

    global.metric("up").unwrap().set_bool(true).unwrap();
    let resp = QueryEngine::global().get_one("up");
    assert!(resp.is_ok());
    assert_eq!(
        serde_json::to_value(resp.metrics.unwrap()).unwrap(),
        serde_json::json!({ "up": true })
    );
}
