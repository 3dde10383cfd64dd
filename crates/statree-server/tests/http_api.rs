#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use statree_core::{Definition, MetricType, MetricValue, Registry};
use statree_server::{app_state::AppState, config, router::build_router};

const CONFIG: &str = r#"
version: 1
server:
  callback_timeout_ms: 50
  self_metrics: false
metrics:
  messages:
    outgoing:
      total: counter
      suppressed: counter
    incoming:
      total: counter
"#;

fn state() -> AppState {
    AppState::new(config::load_from_str(CONFIG).unwrap()).unwrap()
}

async fn get(state: AppState, uri: &str, accept: Option<&str>) -> (StatusCode, String, String) {
    let mut req = Request::builder().uri(uri);
    if let Some(a) = accept {
        req = req.header(header::ACCEPT, a);
    }
    let resp = build_router(state)
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let ctype = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, ctype, String::from_utf8(body.to_vec()).unwrap())
}

async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(state, uri, None).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn healthz() {
    let (status, _, body) = get(state(), "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn full_dump() {
    let s = state();
    s.registry().metric("messages/outgoing/total").unwrap().add(3).unwrap();

    let (status, v) = get_json(s, "/v1/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        v,
        json!({
            "status": "ok",
            "message": "3 metrics",
            "metrics": {
                "messages/incoming/total": 0,
                "messages/outgoing/suppressed": 0,
                "messages/outgoing/total": 3
            }
        })
    );
}

#[tokio::test]
async fn single_metric_and_not_found() {
    let s = state();
    let (status, v) = get_json(s.clone(), "/v1/metrics/one/messages/incoming/total").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["metrics"], json!({ "messages/incoming/total": 0 }));

    let (status, v) = get_json(s, "/v1/metrics/one/messages/incoming").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["status"], "not_found");
    assert!(v.get("metrics").is_none());
}

#[tokio::test]
async fn group_queries() {
    let s = state();
    let (status, v) = get_json(s.clone(), "/v1/metrics/group/messages/outgoing").await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&String> = v["metrics"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["messages/outgoing/suppressed", "messages/outgoing/total"]);

    let (status, v) = get_json(s.clone(), "/v1/metrics/group/messages/out").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["status"], "not_found");

    let (status, v) = get_json(s, "/v1/metrics/group").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["status"], "no_group");
}

#[tokio::test]
async fn group_with_empty_prefix_and_unknown_routes() {
    let s = state();
    let (status, v) = get_json(s.clone(), "/v1/metrics/group/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v, json!({ "status": "no_group", "message": "group prefix required" }));

    let (status, _, body) = get(s, "/v2/nothing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "not found");
}

#[tokio::test]
async fn empty_registry_has_no_metrics() {
    let cfg = config::load_from_str("version: 1\nserver:\n  self_metrics: false\n").unwrap();
    let (status, v) = get_json(AppState::new(cfg).unwrap(), "/v1/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v, json!({ "status": "no_metrics", "message": "no metrics registered" }));
}

#[tokio::test]
async fn callbacks_fail_in_isolation() {
    let tree = Definition::group()
        .with("queue", Definition::group().with("depth", Definition::callback(|| Ok(MetricValue::Integer(12)))))
        .with("broken", Definition::callback(|| Err("db down".into())))
        .with(
            "slow",
            Definition::callback(|| {
                std::thread::sleep(Duration::from_millis(1000));
                Ok(MetricValue::Integer(1))
            }),
        );
    let registry = Registry::new(&tree).unwrap();
    let cfg = config::load_from_str(&CONFIG.replace("callback_timeout_ms: 50", "callback_timeout_ms: 200")).unwrap();
    let s = AppState::with_registry(cfg, registry).unwrap();

    let (status, v) = get_json(s, "/v1/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let m = &v["metrics"];
    assert_eq!(m["queue/depth"], 12);
    assert_eq!(m["broken"], json!({ "error": "callback failed: db down" }));
    assert_eq!(m["slow"], json!({ "error": "callback timed out after 200ms" }));
    assert_eq!(m["messages/outgoing/total"], 0);
}

#[tokio::test]
async fn yaml_output() {
    let s = state();
    let (status, ctype, body) = get(s.clone(), "/v1/metrics/one/messages/incoming/total?format=yaml", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctype, "application/yaml");
    let v: serde_yaml::Value = serde_yaml::from_str(&body).unwrap();
    assert_eq!(v["status"].as_str(), Some("ok"));
    assert_eq!(v["metrics"]["messages/incoming/total"].as_i64(), Some(0));

    let (_, ctype, _) = get(s.clone(), "/v1/metrics", Some("text/html, application/x-yaml;q=0.9")).await;
    assert_eq!(ctype, "application/yaml");

    let (_, ctype, _) = get(s, "/v1/metrics?format=json", Some("application/yaml")).await;
    assert_eq!(ctype, "application/json");
}

#[tokio::test]
async fn self_metrics_count_requests() {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let s = AppState::new(cfg).unwrap();
    let registry: Arc<Registry> = s.registry();
    assert_eq!(registry.metric("statree/started").unwrap().metric_type(), MetricType::Timestamp);

    get(s.clone(), "/v1/metrics", None).await;
    get(s.clone(), "/v1/metrics/group/statree", None).await;
    let (_, v) = get_json(s, "/v1/metrics/group/statree/requests").await;
    assert_eq!(
        v["metrics"],
        json!({ "statree/requests/all": 1, "statree/requests/group": 2, "statree/requests/one": 0 })
    );
    assert!(registry.metric("statree/uptime_seconds").unwrap().value() != MetricValue::Unknown);
}
