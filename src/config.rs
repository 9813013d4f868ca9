use crate::error::ExporterError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub casadm: CasadmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CasadmConfig {
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Upper bound for a single casadm call; unbounded when unset
    #[serde(default)]
    pub command_timeout_seconds: Option<u64>,
    #[serde(default = "default_true")]
    pub probe_on_startup: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_requests_in_flight")]
    pub max_requests_in_flight: usize,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_extraction_interval")]
    pub extraction_interval_seconds: u64,
    /// Only sample these cache IDs; empty means every active cache
    #[serde(default)]
    pub cache_ids: Vec<u16>,
}

fn default_binary() -> String {
    "casadm".to_string()
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2114
}

fn default_max_requests_in_flight() -> usize {
    40
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_extraction_interval() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for CasadmConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            command_timeout_seconds: None,
            probe_on_startup: default_true(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            max_requests_in_flight: default_max_requests_in_flight(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            extraction_interval_seconds: default_extraction_interval(),
            cache_ids: Vec::new(),
        }
    }
}

impl CasadmConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_seconds.map(Duration::from_secs)
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

impl MetricsConfig {
    pub fn extraction_interval(&self) -> Duration {
        Duration::from_secs(self.extraction_interval_seconds)
    }

    /// Whether the cache-id filter lets `id` through
    pub fn includes(&self, id: u16) -> bool {
        self.cache_ids.is_empty() || self.cache_ids.contains(&id)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CAS_EXPORTER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("metrics.cache_ids")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Reject settings the exporter cannot run with
    pub fn validate(&self) -> std::result::Result<(), ExporterError> {
        if self.casadm.binary.trim().is_empty() {
            return Err(ExporterError::Config(
                "casadm.binary must not be empty".to_string(),
            ));
        }
        if self.casadm.command_timeout_seconds == Some(0) {
            return Err(ExporterError::Config(
                "casadm.command_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.metrics.extraction_interval_seconds == 0 {
            return Err(ExporterError::Config(
                "metrics.extraction_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.server.max_requests_in_flight == 0 {
            return Err(ExporterError::Config(
                "server.max_requests_in_flight must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
