//! Device and sink configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for talking to the PVS supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvsConfig {
    /// Hostname or IP address of the PVS (optionally with `:port`)
    pub host: String,
    /// URL scheme used for device requests
    pub scheme: String,
    /// Serial number to fall back on when the device does not report one
    pub default_serial: Option<String>,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Request timeout in seconds
    pub read_timeout_secs: u64,
}

impl Default for PvsConfig {
    fn default() -> Self {
        Self {
            host: "172.27.153.1".to_string(),
            scheme: "https".to_string(),
            default_serial: None,
            connect_timeout_secs: crate::DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: crate::DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl PvsConfig {
    /// Create a device configuration for the given host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Set the URL scheme (`https` for real hardware).
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the fallback serial number.
    pub fn with_default_serial(mut self, serial: Option<String>) -> Self {
        self.default_serial = serial.filter(|s| !s.is_empty());
        self
    }

    /// Set connect and request timeouts in seconds.
    pub fn with_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.read_timeout_secs = read_secs;
        self
    }

    /// Base URL of the device, e.g. `https://172.27.153.1`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Configuration for the InfluxDB sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Full write endpoint, e.g. `http://127.0.0.1:8086/write`
    pub url: String,
    /// Target database name
    pub database: String,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Request timeout in seconds
    pub read_timeout_secs: u64,
    /// Log every record before writing and failed payloads afterwards
    pub verbose: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: crate::DEFAULT_INFLUX_URL.to_string(),
            database: crate::DEFAULT_INFLUX_DB.to_string(),
            connect_timeout_secs: crate::DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: crate::DEFAULT_READ_TIMEOUT_SECS,
            verbose: false,
        }
    }
}

impl SinkConfig {
    /// Create a sink configuration with custom URL and database.
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    /// Enable or disable verbose record logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set connect and request timeouts in seconds.
    pub fn with_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.read_timeout_secs = read_secs;
        self
    }

    /// Sibling endpoint of the write URL, e.g. `ping` or `query`.
    pub fn endpoint(&self, name: &str) -> String {
        self.url.replace("/write", &format!("/{name}"))
    }

    pub fn ping_url(&self) -> String {
        self.endpoint("ping")
    }

    pub fn query_url(&self) -> String {
        self.endpoint("query")
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}
