//! Deadline-bounded evaluation of selected metrics.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use statree_core::{Metric, MetricType, MetricValue, QueryResponse};

/// Runs callback metrics on the blocking pool, at most one invocation per
/// metric at a time.
///
/// A callback that misses its deadline keeps its thread until it returns.
/// Until then, later requests get a sentinel for that metric immediately
/// instead of starting another copy, so a hung callback holds one blocking
/// thread no matter how often it is polled.
#[derive(Clone, Default)]
pub struct Evaluator {
    running: Arc<DashSet<String>>,
}

/// Releases a metric's in-flight slot when the callback returns.
struct RunningGuard {
    running: Arc<DashSet<String>>,
    name: String,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.running.remove(&self.name);
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a callback for `name` is still executing.
    pub fn is_running(&self, name: &str) -> bool {
        self.running.contains(name)
    }

    /// Evaluate `metrics`, running each callback under a shared deadline of
    /// `timeout` from now. Plain metrics are read inline.
    pub async fn evaluate(&self, metrics: Vec<Arc<Metric>>, timeout: Duration) -> QueryResponse {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut values = Vec::with_capacity(metrics.len());
        let mut pending = Vec::new();

        for m in metrics {
            let name = m.name().to_string();
            if m.metric_type() != MetricType::Callback {
                values.push((name, m.value()));
                continue;
            }
            if !self.running.insert(name.clone()) {
                tracing::debug!(metric = %name, "callback still running, skipped");
                values.push((
                    name,
                    MetricValue::Failed {
                        error: "callback still running from an earlier request".into(),
                    },
                ));
                continue;
            }
            let guard = RunningGuard {
                running: Arc::clone(&self.running),
                name: name.clone(),
            };
            pending.push((
                name,
                tokio::task::spawn_blocking(move || {
                    let _guard = guard;
                    m.value()
                }),
            ));
        }

        for (name, task) in pending {
            let v = match tokio::time::timeout_at(deadline, task).await {
                Ok(Ok(v)) => v,
                Ok(Err(e)) => MetricValue::Failed {
                    error: format!("callback task failed: {e}"),
                },
                Err(_) => {
                    tracing::warn!(metric = %name, timeout_ms = timeout.as_millis() as u64, "callback timed out");
                    MetricValue::Failed {
                        error: format!("callback timed out after {}ms", timeout.as_millis()),
                    }
                }
            };
            values.push((name, v));
        }

        QueryResponse::from_values(values)
    }
}
