//! Shared error type across statree crates.

use thiserror::Error;

use crate::metric::MetricType;

/// Boundary status codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Query answered.
    Ok,
    /// Unknown metric or empty group.
    NotFound,
    /// Full dump against an empty registry.
    NoMetrics,
    /// Group query without a prefix.
    NoGroup,
    /// No registry reachable.
    CollectorFail,
    /// Invalid input or configuration.
    BadRequest,
    /// Internal error.
    Internal,
}

impl QueryStatus {
    /// String representation used in response envelopes.
    pub fn as_str(self) -> &'static str {
        match self {
            QueryStatus::Ok => "ok",
            QueryStatus::NotFound => "not_found",
            QueryStatus::NoMetrics => "no_metrics",
            QueryStatus::NoGroup => "no_group",
            QueryStatus::CollectorFail => "collector_fail",
            QueryStatus::BadRequest => "bad_request",
            QueryStatus::Internal => "internal",
        }
    }
}

impl serde::Serialize for QueryStatus {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, StatreeError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum StatreeError {
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),
    #[error("unknown metric type {tag:?} for {name}")]
    UnknownType { name: String, tag: String },
    #[error("callback metric {0} has no callback")]
    MissingCallback(String),
    #[error("metric {name} already exists as {existing}, not {requested}")]
    TypeConflict {
        name: String,
        existing: MetricType,
        requested: MetricType,
    },
    #[error("metric {name} is a {actual}, cannot {op}")]
    WrongType {
        name: String,
        actual: MetricType,
        op: &'static str,
    },
    #[error("counter {0} would overflow")]
    Overflow(String),
    #[error("no such metric: {0}")]
    NotFound(String),
    #[error("no metrics registered")]
    NoMetrics,
    #[error("group prefix required")]
    NoGroupPrefix,
    #[error("callback for {name} failed: {reason}")]
    CallbackFailure { name: String, reason: String },
    #[error("collector unavailable: {0}")]
    CollectorFail(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl StatreeError {
    /// Map internal error to a stable boundary status.
    pub fn status(&self) -> QueryStatus {
        match self {
            StatreeError::NotFound(_) => QueryStatus::NotFound,
            StatreeError::NoMetrics => QueryStatus::NoMetrics,
            StatreeError::NoGroupPrefix => QueryStatus::NoGroup,
            StatreeError::CollectorFail(_) => QueryStatus::CollectorFail,
            StatreeError::InvalidMetricName(_)
            | StatreeError::UnknownType { .. }
            | StatreeError::MissingCallback(_)
            | StatreeError::TypeConflict { .. }
            | StatreeError::WrongType { .. }
            | StatreeError::Overflow(_)
            | StatreeError::BadRequest(_) => QueryStatus::BadRequest,
            StatreeError::CallbackFailure { .. } | StatreeError::Internal(_) => {
                QueryStatus::Internal
            }
        }
    }
}
