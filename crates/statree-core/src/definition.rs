//! Definition trees and the namespace flattener.
//!
//! A definition tree is a nested mapping whose leaves are type tags or
//! callbacks. Flattening walks it depth-first and joins keys with `/`:
//! `{a: {b: counter}, c: gauge}` becomes `a/b` and `c`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::{Result, StatreeError};
use crate::metric::{Callback, CallbackResult, MetricType};

/// Separator between name segments.
pub const SEPARATOR: char = '/';

/// One node of a definition tree.
#[derive(Clone)]
pub enum Definition {
    /// Leaf metric named by its type tag (`"counter"`, `"gauge"`, ...).
    Leaf(String),
    /// Leaf callback metric.
    Callback(Callback),
    /// Namespace group. Not a metric itself.
    Group(BTreeMap<String, Definition>),
}

impl Default for Definition {
    fn default() -> Self {
        Definition::group()
    }
}

impl Definition {
    /// Empty group.
    pub fn group() -> Self {
        Definition::Group(BTreeMap::new())
    }

    pub fn leaf(ty: MetricType) -> Self {
        Definition::Leaf(ty.as_str().to_string())
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn() -> CallbackResult + Send + Sync + 'static,
    {
        Definition::Callback(std::sync::Arc::new(f))
    }

    /// Add a child under `key`. On a non-group node this turns the node into
    /// a group holding only the new child.
    pub fn with(self, key: impl Into<String>, child: Definition) -> Self {
        let mut map = match self {
            Definition::Group(map) => map,
            _ => BTreeMap::new(),
        };
        map.insert(key.into(), child);
        Definition::Group(map)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definition::Leaf(tag) => write!(f, "Leaf({tag})"),
            Definition::Callback(_) => f.write_str("Callback(..)"),
            Definition::Group(map) => f.debug_map().entries(map.iter()).finish(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDefinition {
    Tag(String),
    Group(BTreeMap<String, RawDefinition>),
}

impl From<RawDefinition> for Definition {
    fn from(raw: RawDefinition) -> Self {
        match raw {
            RawDefinition::Tag(tag) => Definition::Leaf(tag),
            RawDefinition::Group(map) => {
                Definition::Group(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for Definition {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        RawDefinition::deserialize(d).map(Into::into)
    }
}

/// A flattened leaf: full name, type, and the callable for callback metrics.
#[derive(Clone)]
pub struct FlatMetric {
    pub name: String,
    pub ty: MetricType,
    pub callback: Option<Callback>,
}

impl fmt::Debug for FlatMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMetric")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

/// Flatten a definition tree into `(name, type, callback)` leaves.
///
/// The root must be a group. Fails on the first structural problem: an empty
/// key or one containing `/`, an unknown type tag, or a `callback` tag
/// without a callable.
pub fn flatten(root: &Definition) -> Result<Vec<FlatMetric>> {
    let Definition::Group(map) = root else {
        return Err(StatreeError::InvalidMetricName(String::new()));
    };
    let mut out = Vec::new();
    walk("", map, &mut out)?;
    Ok(out)
}

fn walk(prefix: &str, map: &BTreeMap<String, Definition>, out: &mut Vec<FlatMetric>) -> Result<()> {
    for (key, child) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{SEPARATOR}{key}")
        };
        if key.is_empty() || key.contains(SEPARATOR) {
            return Err(StatreeError::InvalidMetricName(name));
        }

        match child {
            Definition::Leaf(tag) => {
                let ty = MetricType::from_tag(tag).ok_or_else(|| StatreeError::UnknownType {
                    name: name.clone(),
                    tag: tag.clone(),
                })?;
                if ty == MetricType::Callback {
                    return Err(StatreeError::MissingCallback(name));
                }
                out.push(FlatMetric { name, ty, callback: None });
            }
            Definition::Callback(f) => out.push(FlatMetric {
                name,
                ty: MetricType::Callback,
                callback: Some(f.clone()),
            }),
            Definition::Group(inner) => walk(&name, inner, out)?,
        }
    }
    Ok(())
}

/// Check a full flattened name: non-empty segments separated by `/`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.split(SEPARATOR).any(str::is_empty) {
        return Err(StatreeError::InvalidMetricName(name.to_string()));
    }
    Ok(())
}
