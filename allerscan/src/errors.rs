/// Error types for allerscan.
///
/// The matching core itself never fails: blank terms, empty term sets and empty
/// documents are normalized rather than rejected. Every variant below belongs to
/// one of the collaborators around the core (recognition, the term store,
/// configuration, the terminal).
///
/// ```rust,ignore
/// match session.recognize(&recognizer, &image) {
///     Ok(analysis) => // render and navigate,
///     Err(ScanError::Recognition(reason)) => // report, keep previous state,
///     Err(e) => // other failure
/// }
/// ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type for allerscan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur around a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),
    #[error("Recognition failed: {0}")]
    Recognition(String),
    #[error("Term store error: {0}")]
    StoreError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Terminal error: {0}")]
    TerminalError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ScanError {
    pub fn image_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ImageNotFound(path.into())
    }

    pub fn recognition(reason: impl Into<String>) -> Self {
        Self::Recognition(reason.into())
    }

    pub fn store_error(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn terminal_error(msg: impl Into<String>) -> Self {
        Self::TerminalError(msg.into())
    }
}

impl From<config::ConfigError> for ScanError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
