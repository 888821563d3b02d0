//! Application configuration.
//!
//! Loaded by the binary from defaults, the TOML config file and
//! `SLIDECAST__*` environment variables, in that order.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub hub: HubConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            hub: HubConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file. Defaults to `<data_dir>/slidecast.db`.
    pub path: Option<String>,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Upper bound for a single repository operation, in seconds.
    pub timeout_secs: u64,
    /// SQLite busy timeout, in seconds.
    pub busy_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
            timeout_secs: 10,
            busy_timeout_secs: 30,
        }
    }
}

/// Room hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Capacity of the channel feeding the hub loop.
    pub command_buffer: usize,
    /// Outbound queue capacity per connected client. A client whose queue
    /// is full when a broadcast arrives is evicted.
    pub client_queue_capacity: usize,
    /// Interval between keepalive pings on each socket, in seconds.
    pub ping_interval_secs: u64,
}

impl HubConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            command_buffer: 256,
            client_queue_capacity: 64,
            ping_interval_secs: 30,
        }
    }
}
