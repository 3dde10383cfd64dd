//! statree core: hierarchical metric registry and query engine.
//!
//! Applications describe their metrics as a nested definition tree, which is
//! flattened into slash-delimited names (`messages/outgoing/total`). Each name
//! owns one typed [`Metric`] cell that can be mutated from any thread and read
//! back through the [`QueryEngine`] as a single metric, a prefix group, or a
//! full dump. This crate carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Callback metrics
//! run application code, so their failures (including panics) are caught and
//! reported as a per-metric sentinel value instead of unwinding into the
//! caller.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod definition;
pub mod error;
pub mod metric;
pub mod query;
pub mod registry;

/// Shared result type.
pub use error::{QueryStatus, Result, StatreeError};

pub use definition::{flatten, Definition, FlatMetric, SEPARATOR};
pub use metric::{Callback, CallbackResult, Metric, MetricType, MetricValue};
pub use query::{QueryEngine, QueryResponse};
pub use registry::Registry;
