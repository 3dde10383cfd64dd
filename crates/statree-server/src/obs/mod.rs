//! The server's own metrics, kept in the registry it serves.
//!
//! Registered under `statree/` so they show up in full dumps and can be
//! queried like any application metric.

pub mod self_metrics;

pub use self_metrics::{QueryKind, SelfMetrics};
