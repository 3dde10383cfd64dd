//! statree config: location and strict parsing.
//!
//! The file is looked up in this order: the first CLI argument, then the
//! `STATREE_CONFIG` environment variable, then `statree.yaml` in the working
//! directory. Every section denies unknown fields, and the `metrics` tree is
//! flattened once at load time so structural mistakes surface before the
//! server binds.

pub mod schema;

use std::fs;

use statree_core::error::{Result, StatreeError};

pub use schema::{OutputFormat, ServerSection, StatreeConfig};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "STATREE_CONFIG";
/// Fallback config path.
pub const DEFAULT_PATH: &str = "statree.yaml";

/// Pick the config path from a CLI argument and the `STATREE_CONFIG` value.
/// Empty values count as unset.
pub fn resolve_path(cli_arg: Option<String>, env_value: Option<String>) -> String {
    cli_arg
        .filter(|s| !s.is_empty())
        .or_else(|| env_value.filter(|s| !s.is_empty()))
        .unwrap_or_else(|| DEFAULT_PATH.to_string())
}

pub fn load_from_file(path: &str) -> Result<StatreeConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| StatreeError::Internal(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<StatreeConfig> {
    let cfg: StatreeConfig = serde_yaml::from_str(s)
        .map_err(|e| StatreeError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    tracing::debug!(
        listen = %cfg.server.listen,
        callback_timeout_ms = cfg.server.callback_timeout_ms,
        "config loaded"
    );
    Ok(cfg)
}
