use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::{TableLoader, TableWriter, DEFAULT_NULL_VALUES};

pub const ENV_PREFIX: &str = "CSV_DEDUP_";
pub const ENV_CONFIG_PATH: &str = "CSV_DEDUP_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "csv-dedup.toml";

/// Runtime configuration: defaults, then `csv-dedup.toml`, then
/// `CSV_DEDUP_*` environment variables (`__` separates nested keys).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub upload: UploadConfig,
    #[validate(nested)]
    pub session: SessionConfig,
    #[validate(nested)]
    pub csv: CsvConfig,
    #[validate(nested)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6161,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadConfig {
    /// Largest accepted upload body in bytes
    #[validate(range(min = 1))]
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 16 * 1024 * 1024, // 16MB
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Idle time after which a caller's stored duplicates are dropped
    #[validate(range(min = 1))]
    pub ttl_minutes: u64,
    #[validate(length(min = 1))]
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 60,
            cookie_name: "csv_dedup_session".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CsvConfig {
    pub delimiter: char,
    pub null_values: Vec<String>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            null_values: DEFAULT_NULL_VALUES.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl CsvConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() && !matches!(self.delimiter, '"' | '\n' | '\r') {
            Ok(self.delimiter as u8)
        } else {
            Err(AppError::ConfigError(format!(
                "csv.delimiter must be a single ASCII character other than a quote, carriage return or newline, got {:?}",
                self.delimiter
            )))
        }
    }

    pub fn loader(&self) -> Result<TableLoader> {
        Ok(TableLoader::new()
            .with_delimiter(self.delimiter_byte()?)
            .with_null_values(self.null_values.iter().cloned()))
    }

    pub fn writer(&self) -> Result<TableWriter> {
        Ok(TableWriter::new().with_delimiter(self.delimiter_byte()?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set
    #[validate(length(min = 1))]
    pub filter: String,
    /// Entries kept for `GET /api/logs`
    #[validate(range(min = 1))]
    pub buffer_capacity: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            buffer_capacity: 100,
        }
    }
}

impl AppConfig {
    pub fn figment() -> Figment {
        let path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
    }

    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;

        config
            .validate()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        config.csv.delimiter_byte()?;

        Ok(config)
    }
}
