//! Shared application state for the statree server.
//!
//! Holds the registry, its query engine and the parsed config behind one
//! `Arc` so axum can clone the state per request.

use std::sync::Arc;
use std::time::Duration;

use statree_core::{QueryEngine, Registry, Result};

use crate::api::eval::Evaluator;
use crate::config::{OutputFormat, StatreeConfig};
use crate::obs::{QueryKind, SelfMetrics};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: StatreeConfig,
    registry: Arc<Registry>,
    engine: QueryEngine,
    evaluator: Evaluator,
    self_metrics: Option<SelfMetrics>,
}

impl AppState {
    /// Build the registry from the config's metric tree.
    pub fn new(cfg: StatreeConfig) -> Result<Self> {
        let registry = Registry::new(&cfg.metrics)?;
        Self::assemble(cfg, registry)
    }

    /// Serve a registry the application already populated (for example
    /// with callback metrics). The config's metric tree is merged into it.
    pub fn with_registry(cfg: StatreeConfig, registry: Arc<Registry>) -> Result<Self> {
        registry.extend("", &cfg.metrics)?;
        Self::assemble(cfg, registry)
    }

    fn assemble(cfg: StatreeConfig, registry: Arc<Registry>) -> Result<Self> {
        let self_metrics = if cfg.server.self_metrics {
            Some(SelfMetrics::register(&registry)?)
        } else {
            None
        };
        tracing::info!(metrics = registry.len(), global = registry.is_global(), "registry ready");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                engine: QueryEngine::new(Arc::clone(&registry)),
                evaluator: Evaluator::new(),
                cfg,
                registry,
                self_metrics,
            }),
        })
    }

    pub fn cfg(&self) -> &StatreeConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.inner.engine
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.inner.evaluator
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.cfg.server.callback_timeout_ms)
    }

    pub fn default_format(&self) -> OutputFormat {
        self.inner.cfg.server.default_format
    }

    pub fn record(&self, kind: QueryKind) {
        if let Some(m) = &self.inner.self_metrics {
            m.record(kind);
        }
    }
}
