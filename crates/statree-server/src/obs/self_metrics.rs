use std::sync::Arc;

use chrono::Utc;
use statree_core::{Definition, Metric, MetricType, MetricValue, Registry, Result};

/// Namespace for server self-metrics.
pub const PREFIX: &str = "statree";

/// Which read pattern a request used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    All,
    Group,
    One,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::All => "all",
            QueryKind::Group => "group",
            QueryKind::One => "one",
        }
    }
}

pub struct SelfMetrics {
    requests_all: Arc<Metric>,
    requests_group: Arc<Metric>,
    requests_one: Arc<Metric>,
}

impl SelfMetrics {
    /// Register `statree/started`, `statree/uptime_seconds` and the
    /// `statree/requests/*` counters.
    pub fn register(registry: &Registry) -> Result<Self> {
        let started_at = Utc::now();
        let tree = Definition::group()
            .with("started", Definition::leaf(MetricType::Timestamp))
            .with(
                "uptime_seconds",
                Definition::callback(move || {
                    Ok(MetricValue::Integer((Utc::now() - started_at).num_seconds()))
                }),
            )
            .with(
                "requests",
                Definition::group()
                    .with(QueryKind::All.as_str(), Definition::leaf(MetricType::Counter))
                    .with(QueryKind::Group.as_str(), Definition::leaf(MetricType::Counter))
                    .with(QueryKind::One.as_str(), Definition::leaf(MetricType::Counter)),
            );
        registry.extend(PREFIX, &tree)?;
        registry.metric(&format!("{PREFIX}/started"))?.set_time(started_at)?;

        let counter = |kind: QueryKind| registry.metric(&format!("{PREFIX}/requests/{}", kind.as_str()));
        Ok(Self {
            requests_all: counter(QueryKind::All)?,
            requests_group: counter(QueryKind::Group)?,
            requests_one: counter(QueryKind::One)?,
        })
    }

    pub fn record(&self, kind: QueryKind) {
        let m = match kind {
            QueryKind::All => &self.requests_all,
            QueryKind::Group => &self.requests_group,
            QueryKind::One => &self.requests_one,
        };
        if let Err(e) = m.inc() {
            tracing::warn!(error = %e, "self-metric update failed");
        }
    }
}
