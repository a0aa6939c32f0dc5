//! Error types for Vigil

use thiserror::Error;

/// Main error type for Vigil operations
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Navigation to {url} failed: {reason}")]
    NavigationError { url: String, reason: String },

    #[error("Navigation to {url} timed out after {timeout_ms} ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("LLM engine unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Scanner unavailable: {0}")]
    ScannerUnavailable(String),

    #[error("Scan timeout after {0} seconds")]
    ScanTimeout(u64),

    #[error("Scanner error: {0}")]
    ScanError(String),

    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

impl VigilError {
    /// True for error kinds caused by a page load exceeding its time budget
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            VigilError::NavigationTimeout { .. } | VigilError::ScanTimeout(_)
        )
    }
}

/// Result type alias for Vigil operations
pub type Result<T> = std::result::Result<T, VigilError>;
