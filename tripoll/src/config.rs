use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::net::Ipv6Addr;
use std::path::Path;
use std::time::Duration;

use tripoll_common::{Format, LoggingConfig, ZenohConfig};

use crate::error::ConfigError;
use crate::mib::{Metric, MetricTable};
use crate::resolver::InterfaceMatcher;

/// Root configuration for tripoll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripollConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// SNMP defaults shared by all hosts.
    #[serde(default)]
    pub snmp: SnmpSettings,

    /// Polling loop settings.
    #[serde(default)]
    pub polling: PollingSettings,

    /// Extra counter columns by name, in addition to the built-in IF-MIB ones.
    #[serde(default)]
    pub metric_oids: BTreeMap<String, String>,

    /// Where samples are written.
    pub sink: SinkConfig,

    /// Hosts to poll, in order.
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
}

/// SNMP settings shared by all hosts unless overridden per host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpSettings {
    /// Community string (v2c).
    #[serde(default = "default_community")]
    pub community: String,

    /// Agent UDP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_community() -> String {
    "public".to_string()
}

fn default_port() -> u16 {
    161
}

fn default_timeout() -> u64 {
    5
}

impl Default for SnmpSettings {
    fn default() -> Self {
        Self {
            community: default_community(),
            port: default_port(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SnmpSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Polling loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// Delay between the end of one round and the start of the next.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Liveness log period.
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,

    /// Counter columns sampled for every interface.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,

    /// Log every emitted sample at debug level.
    #[serde(default)]
    pub log_points: bool,
}

fn default_interval() -> u64 {
    10
}

fn default_heartbeat() -> u64 {
    60
}

fn default_metrics() -> Vec<String> {
    vec!["ifHCInOctets".to_string(), "ifHCOutOctets".to_string()]
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            heartbeat_secs: default_heartbeat(),
            metrics: default_metrics(),
            log_points: false,
        }
    }
}

/// Point sink selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// InfluxDB 1.x HTTP write API.
    Influxdb(InfluxConfig),
    /// Publish samples on Zenoh key expressions.
    Zenoh(ZenohSinkConfig),
}

/// InfluxDB connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    /// Base URL, e.g. "http://localhost:8086".
    #[serde(default = "default_influx_url")]
    pub url: String,

    /// Target database.
    pub database: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_influx_url() -> String {
    "http://localhost:8086".to_string()
}

/// Zenoh publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZenohSinkConfig {
    /// Zenoh connection settings.
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Key expression prefix (default: "tripoll").
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Payload encoding.
    #[serde(default)]
    pub serialization: Format,
}

fn default_key_prefix() -> String {
    "tripoll".to_string()
}

/// Configuration for a single host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Hostname or IP address; also used as the `host` tag of every sample.
    pub address: String,

    /// Community override.
    #[serde(default)]
    pub community: Option<String>,

    /// Port override.
    #[serde(default)]
    pub port: Option<u16>,

    /// Polling interval override in seconds.
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Interface name patterns, matched against the end of `ifDescr`.
    #[serde(default)]
    pub interfaces: Vec<String>,
}

/// A host with every setting resolved against the global defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    pub address: String,
    pub community: String,
    pub port: u16,
    pub interval: Duration,
    pub patterns: Vec<String>,
}

impl HostTarget {
    /// `host:port` form suitable for a UDP socket; IPv6 literals are bracketed.
    pub fn socket_addr(&self) -> String {
        if self.address.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

impl HostConfig {
    /// Resolve this host's settings against the global defaults.
    pub fn target(&self, snmp: &SnmpSettings, polling: &PollingSettings) -> HostTarget {
        HostTarget {
            address: self.address.clone(),
            community: self
                .community
                .clone()
                .unwrap_or_else(|| snmp.community.clone()),
            port: self.port.unwrap_or(snmp.port),
            interval: Duration::from_secs(self.interval_secs.unwrap_or(polling.interval_secs)),
            patterns: self.interfaces.clone(),
        }
    }
}

impl TripollConfig {
    /// Load and validate configuration from a JSON5 file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        let config: Self = tripoll_common::load_config(path)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse and validate configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = tripoll_common::parse_config(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that would otherwise fail after pollers start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::validation("At least one host is required"));
        }

        if self.polling.interval_secs == 0 {
            return Err(ConfigError::validation("Polling interval must be positive"));
        }
        if self.polling.heartbeat_secs == 0 {
            return Err(ConfigError::validation("Heartbeat interval must be positive"));
        }
        if self.polling.metrics.is_empty() {
            return Err(ConfigError::validation("At least one metric is required"));
        }

        self.metrics()?;

        let mut seen = HashSet::new();
        for host in &self.hosts {
            if host.address.is_empty() {
                return Err(ConfigError::validation("Host address cannot be empty"));
            }
            if !seen.insert(host.address.as_str()) {
                return Err(ConfigError::validation(format!(
                    "Host '{}' is configured more than once",
                    host.address
                )));
            }
            if host.interval_secs == Some(0) {
                return Err(ConfigError::validation(format!(
                    "Host '{}' has a zero polling interval",
                    host.address
                )));
            }
            InterfaceMatcher::new(&host.interfaces).map_err(|e| {
                ConfigError::validation(format!(
                    "Host '{}' has an invalid interface pattern: {}",
                    host.address, e
                ))
            })?;
        }

        if let SinkConfig::Influxdb(influx) = &self.sink {
            if influx.url.is_empty() {
                return Err(ConfigError::validation("InfluxDB url cannot be empty"));
            }
            if influx.database.is_empty() {
                return Err(ConfigError::validation("InfluxDB database cannot be empty"));
            }
        }

        Ok(())
    }

    /// Metric columns to poll, in configured order.
    pub fn metrics(&self) -> Result<Vec<Metric>, ConfigError> {
        MetricTable::builtin()
            .with_custom(&self.metric_oids)?
            .resolve(&self.polling.metrics)
    }

    /// Every host with its settings resolved.
    pub fn targets(&self) -> Vec<HostTarget> {
        self.hosts
            .iter()
            .map(|host| host.target(&self.snmp, &self.polling))
            .collect()
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.polling.heartbeat_secs)
    }
}
