//! statree server library entry.
//!
//! Wires configuration, the metric registry, and the HTTP query routes into
//! an axum application. It is consumed by the binary (`main.rs`) and by
//! integration tests; applications embedding statree can also build the
//! router around a registry they populated themselves.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
