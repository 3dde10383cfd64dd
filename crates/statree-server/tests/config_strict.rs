#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use statree_server::config::{self, OutputFormat};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "0.0.0.0:9100"
  callback_timeout: 10 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.status().as_str(), "bad_request");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:9100");
    assert_eq!(cfg.server.callback_timeout_ms, 2000);
    assert_eq!(cfg.server.default_format, OutputFormat::Json);
    assert!(cfg.server.self_metrics);
}

#[test]
fn full_config_with_tree() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9200"
  callback_timeout_ms: 250
  default_format: yaml
  self_metrics: false
metrics:
  messages:
    outgoing:
      total: counter
      suppressed: counter
  online: boolean
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.server.default_format, OutputFormat::Yaml);
    let names: Vec<String> = statree_core::flatten(&cfg.metrics)
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["messages/outgoing/suppressed", "messages/outgoing/total", "online"]);
}

#[test]
fn rejects_bad_values() {
    for bad in [
        "version: 2\n",
        "version: 1\nserver:\n  listen: nowhere\n",
        "version: 1\nserver:\n  callback_timeout_ms: 0\n",
        "version: 1\nmetrics:\n  a: histogram\n",
        "version: 1\nmetrics:\n  a: callback\n",
        "version: 1\nmetrics:\n  \"a/b\": counter\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.status().as_str(), "bad_request", "config={bad:?}");
    }
}

#[test]
fn config_path_search_order() {
    let some = |s: &str| Some(s.to_string());
    assert_eq!(config::resolve_path(some("cli.yaml"), some("env.yaml")), "cli.yaml");
    assert_eq!(config::resolve_path(None, some("env.yaml")), "env.yaml");
    assert_eq!(config::resolve_path(some(""), some("env.yaml")), "env.yaml");
    assert_eq!(config::resolve_path(None, some("")), config::DEFAULT_PATH);
    assert_eq!(config::resolve_path(None, None), "statree.yaml");
}

#[test]
fn missing_file_is_internal() {
    let err = config::load_from_file("/nonexistent/statree.yaml").expect_err("no such file");
    assert_eq!(err.status().as_str(), "internal");
}
