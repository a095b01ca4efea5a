//! Configuration management for the Arbor service.
//!
//! Settings come from defaults, an optional `arbor.toml` file, `ARBOR_*`
//! environment variables and finally command line overrides, in that order.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,

    /// Maximum concurrent connections
    pub max_connections: usize,

    /// Number of worker threads (0 = auto-detect)
    pub worker_threads: usize,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bounded number of internal retries for transient storage failures
    /// before a request surfaces an internal error
    pub max_write_retries: u32,

    /// Soft cap on nodes per tenant (0 = unlimited)
    pub max_nodes_per_tenant: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:10321".parse().unwrap(),
            max_connections: 10_000,
            worker_threads: 0, // Auto-detect
            request_timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_write_retries: 3,
            max_nodes_per_tenant: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default file and environment variables
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file first
        if let Ok(file_config) = Self::from_file("arbor.toml") {
            config = file_config;
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(addr) = env::var("ARBOR_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Ok(max_conn) = env::var("ARBOR_MAX_CONNECTIONS") {
            self.server.max_connections = max_conn
                .parse()
                .map_err(|e| Error::config(format!("Invalid max connections: {}", e)))?;
        }

        if let Ok(workers) = env::var("ARBOR_WORKER_THREADS") {
            self.server.worker_threads = workers
                .parse()
                .map_err(|e| Error::config(format!("Invalid worker threads: {}", e)))?;
        }

        if let Ok(retries) = env::var("ARBOR_MAX_WRITE_RETRIES") {
            self.storage.max_write_retries = retries
                .parse()
                .map_err(|e| Error::config(format!("Invalid retry count: {}", e)))?;
        }

        if let Ok(level) = env::var("ARBOR_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("ARBOR_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.worker_threads > 1024 {
            return Err(Error::config("Too many worker threads (maximum 1024)"));
        }

        if self.server.max_connections == 0 {
            return Err(Error::config("max_connections must be positive"));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            _ => return Err(Error::config("Invalid log format")),
        }

        Ok(())
    }

    /// Get optimal number of worker threads
    pub fn optimal_worker_threads(&self) -> usize {
        if self.server.worker_threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.server.worker_threads
        }
    }
}
