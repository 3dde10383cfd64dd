//! Metric registry.
//!
//! Maps flattened names to shared [`Metric`] handles. The map is a `DashMap`
//! (sharded read/write locks), so lookups from query handlers run alongside
//! registrations from application code. Handles are `Arc`s: a mutation made
//! through one is visible to every reader. Guards are released before a
//! handle is returned, so callback evaluation never runs under a map lock.
//!
//! The first registry constructed in a process becomes the process-wide
//! default, reachable through [`Registry::global`].

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::definition::{flatten, validate_name, Definition, SEPARATOR};
use crate::error::{Result, StatreeError};
use crate::metric::{Callback, Metric, MetricType};

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Owner of all metrics in a process (or sub-scope).
pub struct Registry {
    metrics: DashMap<String, Arc<Metric>>,
}

impl Registry {
    /// Build a registry from a definition tree.
    ///
    /// Fails fast on the first structural problem in the tree. On success the
    /// registry becomes the process-wide default if none exists yet.
    pub fn new(tree: &Definition) -> Result<Arc<Self>> {
        let flat = flatten(tree)?;
        let metrics = DashMap::with_capacity(flat.len());
        for m in flat {
            let metric = Metric::new(m.name.clone(), m.ty, m.callback)?;
            tracing::debug!(metric = %m.name, ty = %m.ty, "metric created");
            metrics.insert(m.name, Arc::new(metric));
        }
        Ok(Self::install(Self { metrics }))
    }

    /// Registry with no metrics. Also eligible to become the default.
    pub fn empty() -> Arc<Self> {
        Self::install(Self {
            metrics: DashMap::new(),
        })
    }

    fn install(reg: Self) -> Arc<Self> {
        let reg = Arc::new(reg);
        if GLOBAL.set(Arc::clone(&reg)).is_ok() {
            tracing::info!(metrics = reg.len(), "process-wide default registry installed");
        }
        reg
    }

    /// The process-wide default registry, if one has been constructed.
    pub fn global() -> Option<Arc<Registry>> {
        GLOBAL.get().cloned()
    }

    /// Whether this instance is the process-wide default.
    pub fn is_global(self: &Arc<Self>) -> bool {
        GLOBAL.get().is_some_and(|g| Arc::ptr_eq(g, self))
    }

    /// Exact-name lookup.
    pub fn metric(&self, name: &str) -> Result<Arc<Metric>> {
        self.metrics
            .get(name)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| StatreeError::NotFound(name.to_string()))
    }

    /// Register a metric at runtime.
    ///
    /// Re-registering an existing name with the same type returns the
    /// existing metric. A different type fails with `TypeConflict` and leaves
    /// the existing metric untouched.
    pub fn add_metric(
        &self,
        name: &str,
        ty: MetricType,
        callback: Option<Callback>,
    ) -> Result<Arc<Metric>> {
        validate_name(name)?;
        if ty == MetricType::Callback && callback.is_none() {
            return Err(StatreeError::MissingCallback(name.to_string()));
        }

        match self.metrics.entry(name.to_string()) {
            Entry::Occupied(e) => {
                let existing = e.get();
                if existing.metric_type() == ty {
                    return Ok(Arc::clone(existing));
                }
                tracing::warn!(
                    metric = %name,
                    existing = %existing.metric_type(),
                    requested = %ty,
                    "metric type conflict"
                );
                Err(StatreeError::TypeConflict {
                    name: name.to_string(),
                    existing: existing.metric_type(),
                    requested: ty,
                })
            }
            Entry::Vacant(e) => {
                let metric = Arc::new(Metric::new(name, ty, callback)?);
                e.insert(Arc::clone(&metric));
                tracing::debug!(metric = %name, ty = %ty, "metric created");
                Ok(metric)
            }
        }
    }

    /// [`add_metric`](Self::add_metric) with the type given as a tag.
    pub fn add_metric_tagged(
        &self,
        name: &str,
        tag: &str,
        callback: Option<Callback>,
    ) -> Result<Arc<Metric>> {
        let ty = MetricType::from_tag(tag).ok_or_else(|| StatreeError::UnknownType {
            name: name.to_string(),
            tag: tag.to_string(),
        })?;
        self.add_metric(name, ty, callback)
    }

    /// Register every leaf of `tree` under `prefix` (empty for the root).
    ///
    /// The tree is validated before anything is inserted; a type conflict on
    /// one leaf stops registration there, and leaves added before it remain.
    pub fn extend(&self, prefix: &str, tree: &Definition) -> Result<Vec<Arc<Metric>>> {
        if !prefix.is_empty() {
            validate_name(prefix)?;
        }
        let flat = flatten(tree)?;
        flat.into_iter()
            .map(|m| {
                let name = if prefix.is_empty() {
                    m.name
                } else {
                    format!("{prefix}{SEPARATOR}{}", m.name)
                };
                self.add_metric(&name, m.ty, m.callback)
            })
            .collect()
    }

    /// Snapshot of every registered metric.
    pub fn all_metrics(&self) -> BTreeMap<String, Arc<Metric>> {
        self.metrics
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect()
    }

    /// Metrics whose name equals `prefix` or lies below it.
    pub fn with_prefix(&self, prefix: &str) -> BTreeMap<String, Arc<Metric>> {
        self.metrics
            .iter()
            .filter(|r| in_group(r.key(), prefix))
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Whole-segment prefix match: `a/b` is in group `a` but `ab` is not.
pub fn in_group(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATOR),
        None => false,
    }
}
