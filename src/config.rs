//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::consumer::RetryPolicy;
use crate::logging::DEFAULT_QUEUE_CAPACITY;

/// Where transactions are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process memory; contents are lost on exit
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::InvalidValue("STORAGE_BACKEND")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name attached to every log entry
    pub app_name: String,

    /// Environment (development, production)
    pub environment: String,

    pub storage_backend: StorageBackend,

    /// Database connection URL (required for the postgres backend)
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Per-request timeout for the HTTP surface
    pub request_timeout_secs: u64,

    /// Comma-separated Kafka bootstrap servers
    pub kafka_brokers: String,
    pub kafka_topic: String,
    pub kafka_group_id: String,

    /// Total process attempts per message on connectivity failures
    pub consumer_max_attempts: u32,
    pub consumer_retry_delay_ms: u64,

    /// Bounded log queue size
    pub log_queue_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage_backend: StorageBackend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        Ok(Self {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "casino".to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            storage_backend,
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080)?,
            request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 1)?,
            kafka_brokers: env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string()),
            kafka_topic: env::var("KAFKA_TOPIC")
                .unwrap_or_else(|_| "casino-transactions".to_string()),
            kafka_group_id: env::var("KAFKA_GROUP_ID")
                .unwrap_or_else(|_| "casino-transaction-consumer".to_string()),
            consumer_max_attempts: parse_or("CONSUMER_MAX_ATTEMPTS", 3)?,
            consumer_retry_delay_ms: parse_or("CONSUMER_RETRY_DELAY_MS", 3000)?,
            log_queue_capacity: parse_or("LOG_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY)?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy for the message consumer
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.consumer_max_attempts,
            Duration::from_millis(self.consumer_retry_delay_ms),
        )
    }
}

/// Read `key`, falling back to `default` when unset
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
