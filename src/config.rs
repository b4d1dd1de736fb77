//! Configuration types for parallel-ingest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Batch executor settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExecutorConfig {
    /// Maximum concurrent item invocations per batch (default: 4)
    ///
    /// Must be at least 1. A value of 0 is rejected by [`Config::validate`]
    /// and by [`ParallelExecutor::new`](crate::ParallelExecutor::new) rather
    /// than silently clamped.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-item timeout in seconds (None = wait indefinitely)
    ///
    /// An item that exceeds the timeout is reported as failed. An async item
    /// is dropped and its worker slot released at once; a blocking item keeps
    /// its slot until its thread returns.
    #[serde(default, with = "optional_duration_serde")]
    #[schema(value_type = Option<u64>)]
    pub item_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            item_timeout: None,
        }
    }
}

/// Upload staging settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestConfig {
    /// Directory for staged upload files (default: OS temp directory)
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub temp_dir: Option<PathBuf>,

    /// Suffix given to staged files so ingesters can sniff the type (default: ".pdf")
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,

    /// Maximum accepted request body size in bytes for upload endpoints (default: 50 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            file_suffix: default_file_suffix(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:7864)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration
///
/// Every section has defaults, so `Config::default()` and an empty JSON
/// object both produce a working configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Batch executor settings
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Upload staging settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Check the configuration for values that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.executor.max_workers == 0 {
            return Err(Error::config(
                "max_workers",
                "max_workers must be at least 1",
            ));
        }

        if self.executor.item_timeout == Some(Duration::ZERO) {
            return Err(Error::config(
                "item_timeout",
                "item_timeout must be greater than zero when set",
            ));
        }

        if self.ingest.max_upload_bytes == 0 {
            return Err(Error::config(
                "max_upload_bytes",
                "max_upload_bytes must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_max_workers() -> usize {
    4
}

fn default_file_suffix() -> String {
    ".pdf".into()
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 7864))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
