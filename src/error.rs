use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SentimentError {
    TableError(String),
    StorageError(String),
    CapabilityError(String),
    ConfigurationError(String),
}

impl fmt::Display for SentimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentError::TableError(msg) => write!(f, "Table error: {msg}"),
            SentimentError::StorageError(msg) => write!(f, "Storage error: {msg}"),
            SentimentError::CapabilityError(msg) => write!(f, "Capability error: {msg}"),
            SentimentError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for SentimentError {}

pub type Result<T> = std::result::Result<T, SentimentError>;
