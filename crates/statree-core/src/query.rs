//! Query engine: single metric, prefix group, and full dump.
//!
//! Every query answers with a [`QueryResponse`] envelope; errors never escape
//! as `Err`. Selection and evaluation are separate steps so a caller can
//! evaluate callback metrics under its own deadline and then build the
//! envelope with [`QueryResponse::from_values`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::definition::SEPARATOR;
use crate::error::{QueryStatus, Result, StatreeError};
use crate::metric::{Metric, MetricValue};
use crate::registry::Registry;

/// Boundary response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub status: QueryStatus,
    pub message: String,
    /// Present only when `status` is `ok`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, MetricValue>>,
}

impl QueryResponse {
    /// Build an `ok` envelope from already-evaluated values.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (String, MetricValue)>,
    {
        let metrics: BTreeMap<String, MetricValue> = values.into_iter().collect();
        let message = match metrics.len() {
            1 => "1 metric".to_string(),
            n => format!("{n} metrics"),
        };
        Self {
            status: QueryStatus::Ok,
            message,
            metrics: Some(metrics),
        }
    }

    /// Evaluate each metric independently. A failing callback only affects
    /// its own entry.
    pub fn evaluate(metrics: &[Arc<Metric>]) -> Self {
        Self::from_values(metrics.iter().map(|m| (m.name().to_string(), m.value())))
    }

    pub fn error(err: &StatreeError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
            metrics: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == QueryStatus::Ok
    }
}

/// Read side of a registry.
#[derive(Clone)]
pub struct QueryEngine {
    registry: Option<Arc<Registry>>,
}

impl QueryEngine {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    /// Engine over the process-wide default registry. If none has been
    /// constructed every query reports `collector_fail`.
    pub fn global() -> Self {
        Self {
            registry: Registry::global(),
        }
    }

    fn registry(&self) -> Result<&Arc<Registry>> {
        self.registry
            .as_ref()
            .ok_or_else(|| StatreeError::CollectorFail("no registry constructed".into()))
    }

    /// Exact-name selection. Group names are not metrics.
    pub fn select_one(&self, name: &str) -> Result<Arc<Metric>> {
        self.registry()?.metric(name)
    }

    /// Whole-segment prefix selection. Trailing separators are ignored.
    pub fn select_group(&self, prefix: &str) -> Result<Vec<Arc<Metric>>> {
        let registry = self.registry()?;
        let prefix = prefix.trim_end_matches(SEPARATOR);
        if prefix.is_empty() {
            return Err(StatreeError::NoGroupPrefix);
        }
        let found: Vec<Arc<Metric>> = registry.with_prefix(prefix).into_values().collect();
        if found.is_empty() {
            return Err(StatreeError::NotFound(prefix.to_string()));
        }
        Ok(found)
    }

    pub fn select_all(&self) -> Result<Vec<Arc<Metric>>> {
        let registry = self.registry()?;
        let all: Vec<Arc<Metric>> = registry.all_metrics().into_values().collect();
        if all.is_empty() {
            return Err(StatreeError::NoMetrics);
        }
        Ok(all)
    }

    pub fn get_one(&self, name: &str) -> QueryResponse {
        match self.select_one(name) {
            Ok(m) => QueryResponse::evaluate(&[m]),
            Err(e) => QueryResponse::error(&e),
        }
    }

    pub fn get_group(&self, prefix: &str) -> QueryResponse {
        match self.select_group(prefix) {
            Ok(found) => QueryResponse::evaluate(&found),
            Err(e) => QueryResponse::error(&e),
        }
    }

    pub fn get_all(&self) -> QueryResponse {
        match self.select_all() {
            Ok(all) => QueryResponse::evaluate(&all),
            Err(e) => QueryResponse::error(&e),
        }
    }
}
