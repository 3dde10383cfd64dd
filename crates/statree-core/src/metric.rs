//! Typed metric cells.
//!
//! A [`Metric`] is a closed variant over six kinds. Numeric kinds are plain
//! atomics so concurrent increments never lose updates; text and timestamp
//! kinds sit behind a `RwLock`. Callback metrics store no value and invoke
//! their function on every read.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, StatreeError};

/// Metric kind. Fixed for the lifetime of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Counter,
    Gauge,
    Boolean,
    String,
    Timestamp,
    Callback,
}

impl MetricType {
    /// Tag used in definition trees and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Boolean => "boolean",
            MetricType::String => "string",
            MetricType::Timestamp => "timestamp",
            MetricType::Callback => "callback",
        }
    }

    /// Parse a type tag. Returns `None` for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "counter" => Some(MetricType::Counter),
            "gauge" => Some(MetricType::Gauge),
            "boolean" => Some(MetricType::Boolean),
            "string" => Some(MetricType::String),
            "timestamp" => Some(MetricType::Timestamp),
            "callback" => Some(MetricType::Callback),
            _ => None,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MetricType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Current value of a metric as seen by readers.
///
/// Serialized untagged: numbers, booleans and strings map to their natural
/// representation, timestamps to RFC 3339, `Unknown` to `null`, and a failed
/// callback to `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Boolean never set, or timestamp never stamped.
    Unknown,
    /// Callback failure sentinel.
    Failed { error: String },
}

impl MetricValue {
    pub fn is_failed(&self) -> bool {
        matches!(self, MetricValue::Failed { .. })
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Integer(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Bool(v)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for MetricValue {
    fn from(v: DateTime<Utc>) -> Self {
        MetricValue::Timestamp(v)
    }
}

/// What a callback returns.
pub type CallbackResult =
    std::result::Result<MetricValue, Box<dyn std::error::Error + Send + Sync>>;

/// Zero-argument function computing a callback metric's value.
pub type Callback = Arc<dyn Fn() -> CallbackResult + Send + Sync>;

const BOOL_UNKNOWN: u8 = 0;
const BOOL_FALSE: u8 = 1;
const BOOL_TRUE: u8 = 2;

enum Cell {
    Counter(AtomicI64),
    /// `f64` bit pattern.
    Gauge(AtomicU64),
    Boolean(AtomicU8),
    Text(RwLock<String>),
    Timestamp(RwLock<Option<DateTime<Utc>>>),
    Callback(Callback),
}

/// A single named, typed value cell.
pub struct Metric {
    name: String,
    cell: Cell,
}

impl Metric {
    /// Build a metric. `callback` is required for [`MetricType::Callback`]
    /// and ignored for every other kind.
    pub fn new(name: impl Into<String>, ty: MetricType, callback: Option<Callback>) -> Result<Self> {
        let name = name.into();
        let cell = match ty {
            MetricType::Counter => Cell::Counter(AtomicI64::new(0)),
            MetricType::Gauge => Cell::Gauge(AtomicU64::new(0f64.to_bits())),
            MetricType::Boolean => Cell::Boolean(AtomicU8::new(BOOL_UNKNOWN)),
            MetricType::String => Cell::Text(RwLock::new(String::new())),
            MetricType::Timestamp => Cell::Timestamp(RwLock::new(None)),
            MetricType::Callback => match callback {
                Some(f) => Cell::Callback(f),
                None => return Err(StatreeError::MissingCallback(name)),
            },
        };
        Ok(Self { name, cell })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metric_type(&self) -> MetricType {
        match self.cell {
            Cell::Counter(_) => MetricType::Counter,
            Cell::Gauge(_) => MetricType::Gauge,
            Cell::Boolean(_) => MetricType::Boolean,
            Cell::Text(_) => MetricType::String,
            Cell::Timestamp(_) => MetricType::Timestamp,
            Cell::Callback(_) => MetricType::Callback,
        }
    }

    fn wrong_type(&self, op: &'static str) -> StatreeError {
        StatreeError::WrongType {
            name: self.name.clone(),
            actual: self.metric_type(),
            op,
        }
    }

    /// Increment a counter (or gauge) by one.
    pub fn inc(&self) -> Result<()> {
        self.add(1)
    }

    /// Add an integer delta to a counter or gauge. Negative deltas are accepted.
    ///
    /// A counter update that would leave the `i64` range fails with
    /// `Overflow` and leaves the counter unchanged.
    pub fn add(&self, delta: i64) -> Result<()> {
        match &self.cell {
            Cell::Counter(v) => v
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| cur.checked_add(delta))
                .map(|_| ())
                .map_err(|_| StatreeError::Overflow(self.name.clone())),
            Cell::Gauge(_) => self.add_f64(delta as f64),
            _ => Err(self.wrong_type("add")),
        }
    }

    /// Add a fractional delta to a gauge.
    pub fn add_f64(&self, delta: f64) -> Result<()> {
        let Cell::Gauge(bits) = &self.cell else {
            return Err(self.wrong_type("add_f64"));
        };
        // CAS loop; the closure never declines so this cannot fail.
        let _ = bits.fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
            Some((f64::from_bits(cur) + delta).to_bits())
        });
        Ok(())
    }

    /// Set a gauge to an absolute value.
    pub fn set_gauge(&self, v: f64) -> Result<()> {
        let Cell::Gauge(bits) = &self.cell else {
            return Err(self.wrong_type("set_gauge"));
        };
        bits.store(v.to_bits(), Ordering::Release);
        Ok(())
    }

    pub fn set_bool(&self, v: bool) -> Result<()> {
        let Cell::Boolean(state) = &self.cell else {
            return Err(self.wrong_type("set_bool"));
        };
        state.store(if v { BOOL_TRUE } else { BOOL_FALSE }, Ordering::Release);
        Ok(())
    }

    pub fn set_text(&self, v: impl Into<String>) -> Result<()> {
        let Cell::Text(text) = &self.cell else {
            return Err(self.wrong_type("set_text"));
        };
        *text.write().unwrap_or_else(PoisonError::into_inner) = v.into();
        Ok(())
    }

    pub fn set_time(&self, t: DateTime<Utc>) -> Result<()> {
        let Cell::Timestamp(ts) = &self.cell else {
            return Err(self.wrong_type("set_time"));
        };
        *ts.write().unwrap_or_else(PoisonError::into_inner) = Some(t);
        Ok(())
    }

    /// Stamp a timestamp metric with the current time.
    pub fn now(&self) -> Result<()> {
        self.set_time(Utc::now())
    }

    /// Read the value, surfacing a callback failure as an error.
    ///
    /// Callbacks run on the caller's thread with no registry lock held.
    /// Callers that need a deadline should wrap this call themselves.
    pub fn try_value(&self) -> Result<MetricValue> {
        let v = match &self.cell {
            Cell::Counter(v) => MetricValue::Integer(v.load(Ordering::Acquire)),
            Cell::Gauge(bits) => MetricValue::Float(f64::from_bits(bits.load(Ordering::Acquire))),
            Cell::Boolean(state) => match state.load(Ordering::Acquire) {
                BOOL_TRUE => MetricValue::Bool(true),
                BOOL_FALSE => MetricValue::Bool(false),
                _ => MetricValue::Unknown,
            },
            Cell::Text(text) => {
                MetricValue::Text(text.read().unwrap_or_else(PoisonError::into_inner).clone())
            }
            Cell::Timestamp(ts) => match *ts.read().unwrap_or_else(PoisonError::into_inner) {
                Some(t) => MetricValue::Timestamp(t),
                None => MetricValue::Unknown,
            },
            Cell::Callback(f) => return self.invoke(f),
        };
        Ok(v)
    }

    /// Read the value. A failing callback yields [`MetricValue::Failed`].
    pub fn value(&self) -> MetricValue {
        match self.try_value() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(metric = %self.name, error = %e, "callback metric failed");
                MetricValue::Failed {
                    error: failure_message(&e),
                }
            }
        }
    }

    fn invoke(&self, f: &Callback) -> Result<MetricValue> {
        match catch_unwind(AssertUnwindSafe(|| f())) {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(StatreeError::CallbackFailure {
                name: self.name.clone(),
                reason: e.to_string(),
            }),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(StatreeError::CallbackFailure {
                    name: self.name.clone(),
                    reason: format!("panicked: {reason}"),
                })
            }
        }
    }
}

fn failure_message(e: &StatreeError) -> String {
    match e {
        StatreeError::CallbackFailure { reason, .. } => format!("callback failed: {reason}"),
        other => other.to_string(),
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("type", &self.metric_type())
            .finish()
    }
}
