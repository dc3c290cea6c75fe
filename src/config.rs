//! # Configuration System
//!
//! Typed configuration for the sentiment batch core. Defaults mirror the
//! documented behavior (3 classification attempts, 50 concurrent calls,
//! batches of 100, checkpoint every 1000 processed rows) and everything can
//! be overridden from a YAML file.
//!
//! ```rust,no_run
//! use sentiment_core::config::SentimentConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SentimentConfig::from_yaml_file("config/sentiment.yaml".as_ref())?;
//! println!("batch size: {}", config.execution.batch_size);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration file {path}: {source}")]
    FileParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A configuration value is outside its valid range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigurationError {
    fn invalid_value(field: &str, reason: &str) -> Self {
        ConfigurationError::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Root configuration for a sentiment analysis run
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Classifier adapter settings (model, retries, delays)
    pub classifier: ClassifierConfig,

    /// Batch execution and checkpoint cadence settings
    pub execution: ExecutionConfig,

    /// Checkpoint and output artifact locations
    pub storage: StorageConfig,
}

/// Settings for the classifier adapter and its external capability
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Model identifier sent to the chat-completion capability
    pub model: String,

    /// Classification attempts per row before giving up with `Unknown`
    pub max_attempts: u32,

    /// Pause after an unparsable or field-less response
    pub parse_retry_delay_ms: u64,

    /// Pause after a transport failure (longer: the capability may be
    /// rate-limiting)
    pub transport_retry_delay_ms: u64,

    /// Per-call ceiling on a single capability request. Generous on purpose;
    /// a timed-out call is retried like any other transport failure.
    pub request_timeout_seconds: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_attempts: 3,
            parse_retry_delay_ms: 1000,
            transport_retry_delay_ms: 2000,
            request_timeout_seconds: 120,
        }
    }
}

impl ClassifierConfig {
    pub fn parse_retry_delay(&self) -> Duration {
        Duration::from_millis(self.parse_retry_delay_ms)
    }

    pub fn transport_retry_delay(&self) -> Duration {
        Duration::from_millis(self.transport_retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Batch sizing, concurrency ceiling and checkpoint cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Rows per batch; batches are processed strictly in order
    pub batch_size: usize,

    /// Maximum in-flight classifications, regardless of batch size
    pub max_concurrent: usize,

    /// Checkpoint cadence in processed rows. The trigger is the best-effort
    /// check `processed % save_interval < batch_size`, evaluated once per
    /// batch; it can skip or double-fire depending on the ratio of the two
    /// values, and that behavior is deliberate.
    pub save_interval: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_concurrent: 50,
            save_interval: 1000,
        }
    }
}

/// Locations of the checkpoint and final output artifacts
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Periodically overwritten mid-run snapshot
    pub checkpoint_path: PathBuf,

    /// Final complete output, written once at run completion
    pub output_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: PathBuf::from("backups/reviews_sentiment_backup.csv"),
            output_path: PathBuf::from("reviews_sample_w_sentiment.csv"),
        }
    }
}

impl SentimentConfig {
    /// Load configuration from a YAML file and validate it
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            ConfigurationError::FileRead {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let config: SentimentConfig =
            serde_yaml::from_str(&contents).map_err(|source| ConfigurationError::FileParse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;

        debug!(
            path = %path.display(),
            batch_size = config.execution.batch_size,
            max_concurrent = config.execution.max_concurrent,
            save_interval = config.execution.save_interval,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate value ranges and path consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.classifier.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "classifier.max_attempts",
                "must be at least 1",
            ));
        }
        if self.execution.batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "execution.batch_size",
                "must be at least 1",
            ));
        }
        if self.execution.max_concurrent == 0 {
            return Err(ConfigurationError::invalid_value(
                "execution.max_concurrent",
                "must be at least 1",
            ));
        }
        if self.execution.save_interval == 0 {
            return Err(ConfigurationError::invalid_value(
                "execution.save_interval",
                "must be at least 1",
            ));
        }
        if self.storage.checkpoint_path == self.storage.output_path {
            return Err(ConfigurationError::invalid_value(
                "storage.output_path",
                "must differ from storage.checkpoint_path",
            ));
        }
        Ok(())
    }
}
