//! Error types for the converter

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the converter
#[derive(Error, Debug)]
pub enum CameoError {
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("Input document has no '{section}' section")]
    MissingSection { section: &'static str },

    #[error("Failed to parse {file}: {message}")]
    ParseError { file: PathBuf, message: String },

    #[error("Code-system abbreviation space exhausted while abbreviating '{identifier}'")]
    AbbreviationSpaceExhausted { identifier: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CameoError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CameoError::IoError {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, CameoError>;
