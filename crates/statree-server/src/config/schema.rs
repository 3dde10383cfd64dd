use std::net::SocketAddr;

use serde::Deserialize;
use statree_core::error::{Result, StatreeError};
use statree_core::{flatten, Definition};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatreeConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    /// Definition tree: type tags or nested groups.
    #[serde(default)]
    pub metrics: Definition,
}

impl StatreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(StatreeError::BadRequest(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        flatten(&self.metrics)?;

        Ok(())
    }
}

/// Response encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_param(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::Yaml => "application/yaml",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_callback_timeout_ms")]
    pub callback_timeout_ms: u64,

    #[serde(default)]
    pub default_format: OutputFormat,

    #[serde(default = "default_self_metrics")]
    pub self_metrics: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            callback_timeout_ms: default_callback_timeout_ms(),
            default_format: OutputFormat::default(),
            self_metrics: default_self_metrics(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(StatreeError::BadRequest(format!(
                "server.listen must be a socket address, got {:?}",
                self.listen
            )));
        }
        if !(1..=60000).contains(&self.callback_timeout_ms) {
            return Err(StatreeError::BadRequest(
                "server.callback_timeout_ms must be between 1 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:9100".into()
}
fn default_callback_timeout_ms() -> u64 {
    2000
}
fn default_self_metrics() -> bool {
    true
}
