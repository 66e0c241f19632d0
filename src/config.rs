//! Configuration loaded from the environment.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} env var required")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Database REST endpoint receiving one row per processed video.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub api_key: String,
    pub table: String,
}

/// S3-compatible blob store holding the model artifact and the results.
#[derive(Clone, Debug)]
pub struct BlobConfig {
    pub account_id: String,
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: String,
    /// Public base URL under which uploaded results are served
    pub public_url: String,
    pub video_bucket: String,
    pub model_bucket: String,
}

/// Where the model artifact is published.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub public_url: String,
    pub file_name: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: u16,
    /// Directory for the model artifact and per-job temp videos
    pub scratch_dir: PathBuf,
    /// Upper bound on jobs running at the same time
    pub max_concurrent_jobs: usize,
    pub database: DatabaseConfig,
    pub blob: BlobConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let max_concurrent_jobs = match lookup("MAX_CONCURRENT_JOBS") {
            Some(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAX_CONCURRENT_JOBS",
                        value,
                    })
                }
            },
            None => DEFAULT_MAX_CONCURRENT_JOBS,
        };

        Ok(Self {
            addr: lookup("ADDR").unwrap_or_else(|| String::from(DEFAULT_ADDR)),
            port,
            scratch_dir: lookup("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            max_concurrent_jobs,
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                api_key: required("DATABASE_API_KEY")?,
                table: required("DATABASE_TABLE")?,
            },
            blob: BlobConfig {
                account_id: required("BLOB_ACCOUNT_ID")?,
                access_key: required("BLOB_ACCESS_KEY")?,
                secret_key: required("BLOB_SECRET_KEY")?,
                endpoint: required("BLOB_ENDPOINT")?,
                public_url: required("BLOB_PUBLIC_URL")?,
                video_bucket: required("VIDEO_BUCKET")?,
                model_bucket: required("MODEL_BUCKET")?,
            },
            model: ModelConfig {
                public_url: required("MODEL_PUBLIC_URL")?,
                file_name: required("MODEL_FILE")?,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}
