use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Storage hand-off failed: {message}")]
    StorageHandoffError { message: String },

    #[error("Run cancelled at the {stage} stage boundary")]
    Cancelled { stage: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, EtlError>;

/// Failure modes of a single extraction-service call. All of these are
/// retryable up to the configured budget; none of them fail the run.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("extraction service timed out")]
    Timeout,

    #[error("extraction service quota exceeded")]
    QuotaExceeded,

    #[error("malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("extraction service returned status {0}")]
    Status(u16),

    #[error("extraction request failed: {0}")]
    Transport(reqwest::Error),
}
