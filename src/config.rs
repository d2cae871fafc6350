//! Configuration loaded once at startup from a TOML file and the environment.
//!
//! Priority: `LIBRARY_*` environment variables > TOML file > defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use library_db::DbConfig;
use library_telemetry::TelemetryConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "LIBRARY_";

/// Command line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "library-service", about = "Book catalog gRPC + REST service")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short, env = "LIBRARY_CONFIG", default_value = "config/library.toml")]
    pub config: PathBuf,
}

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// PostgreSQL connection string
    pub database_url: SecretString,

    /// Log level name or numeric severity (-4 debug, 0 info, 4 warn, 8 error)
    #[serde(default = "defaults::log_level", deserialize_with = "log_level")]
    pub log_level: String,

    /// Use JSON log format
    #[serde(default)]
    pub json_logs: bool,

    /// REST listen address
    #[serde(default = "defaults::rest_address")]
    pub rest_address: String,

    /// gRPC listen address
    #[serde(default = "defaults::grpc_address")]
    pub grpc_address: String,

    /// Enable gRPC reflection API
    #[serde(default)]
    pub grpc_reflection: bool,

    /// Apply embedded migrations at startup
    #[serde(default = "defaults::run_migrations")]
    pub run_migrations: bool,

    /// Database pool minimum connections
    #[serde(default = "defaults::db_pool_min")]
    pub db_pool_min: u32,

    /// Database pool maximum connections
    #[serde(default = "defaults::db_pool_max")]
    pub db_pool_max: u32,

    /// Database connection acquire timeout in seconds
    #[serde(default = "defaults::db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// Upper bound for a single storage operation in seconds
    #[serde(default = "defaults::storage_timeout_secs")]
    pub storage_timeout_secs: u64,

    /// REST request timeout in seconds
    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: u64,
}

mod defaults {
    pub fn log_level() -> String {
        "INFO".to_string()
    }

    pub fn rest_address() -> String {
        "127.0.0.1:8080".to_string()
    }

    pub fn grpc_address() -> String {
        "127.0.0.1:50051".to_string()
    }

    pub const fn run_migrations() -> bool {
        true
    }

    pub const fn db_pool_min() -> u32 {
        1
    }

    pub const fn db_pool_max() -> u32 {
        10
    }

    pub const fn db_connect_timeout_secs() -> u64 {
        5
    }

    pub const fn storage_timeout_secs() -> u64 {
        10
    }

    pub const fn request_timeout_secs() -> u64 {
        30
    }
}

/// Accept the log level as a name or as a numeric severity.
fn log_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Name(String),
        Severity(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Name(name) => name,
        Raw::Severity(severity) => severity.to_string(),
    })
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Database URL must not be empty")]
    MissingDatabaseUrl,
    #[error("Database pool max ({max}) must be >= min ({min})")]
    InvalidPoolSize { min: u32, max: u32 },
    #[error("{0} must be > 0")]
    ZeroTimeout(&'static str),
    #[error("Invalid {field} address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

impl Config {
    /// Parse CLI arguments, then load and validate configuration.
    pub fn init() -> anyhow::Result<Self> {
        let cli = Cli::parse();
        Ok(Self::load(&cli.config)?)
    }

    /// Load configuration from `path` layered under the environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.expose_secret().trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.db_pool_max < self.db_pool_min {
            return Err(ConfigError::InvalidPoolSize {
                min: self.db_pool_min,
                max: self.db_pool_max,
            });
        }
        if self.db_connect_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("db_connect_timeout_secs"));
        }
        if self.storage_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("storage_timeout_secs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("request_timeout_secs"));
        }
        Self::parse_address("rest_address", &self.rest_address)?;
        Self::parse_address("grpc_address", &self.grpc_address)?;
        Ok(())
    }

    fn parse_address(field: &'static str, value: &str) -> Result<SocketAddr, ConfigError> {
        value.parse().map_err(|_| ConfigError::InvalidAddress {
            field,
            value: value.to_string(),
        })
    }

    /// REST listen address.
    pub fn rest_addr(&self) -> Result<SocketAddr, ConfigError> {
        Self::parse_address("rest_address", &self.rest_address)
    }

    /// gRPC listen address.
    pub fn grpc_addr(&self) -> Result<SocketAddr, ConfigError> {
        Self::parse_address("grpc_address", &self.grpc_address)
    }

    /// Pool settings for the database crate.
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.database_url.expose_secret().to_string(),
            pool_min: self.db_pool_min,
            pool_max: self.db_pool_max,
            connect_timeout: Duration::from_secs(self.db_connect_timeout_secs),
        }
    }

    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
        }
    }

    #[inline]
    #[must_use]
    pub const fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }

    #[inline]
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
