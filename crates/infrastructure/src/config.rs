use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use domain::connection::DEFAULT_PORT;
use domain::network::InterfaceFilter;
use serde::{Deserialize, Serialize};

use crate::connection::TcpConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConnectionConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ConnectionConfig {
    pub fn tcp(&self, host: impl Into<String>) -> TcpConfig {
        TcpConfig {
            host: host.into(),
            port: self.port,
            timeout_ms: self.timeout_ms,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DiscoveryConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,
    #[serde(default = "default_max_hosts_per_range")]
    pub max_hosts_per_range: u64,
    /// `"all"` or an interface name
    #[serde(default = "default_interface")]
    pub interface: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            probe_timeout_ms: default_timeout_ms(),
            max_concurrent_probes: default_max_concurrent_probes(),
            max_hosts_per_range: default_max_hosts_per_range(),
            interface: default_interface(),
        }
    }
}

impl DiscoveryConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn interface_filter(&self) -> InterfaceFilter {
        InterfaceFilter::from(self.interface.as_str())
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_timeout_ms() -> u64 {
    2000
}
fn default_max_concurrent_probes() -> usize {
    64
}
fn default_max_hosts_per_range() -> u64 {
    4096
}
fn default_interface() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ToolConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl ToolConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("connection.port", i64::from(DEFAULT_PORT))?
            .set_default("discovery.port", i64::from(DEFAULT_PORT))?
            // Shared settings, e.g. config/default.toml
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Per run mode overrides, e.g. config/lab.toml
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. ICL__DISCOVERY__MAX_CONCURRENT_PROBES=16)
            .add_source(Environment::with_prefix("ICL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
