//! Error types for bench-board

use thiserror::Error;

/// Result type alias for bench-board operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the leaderboard engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to parse leaderboard payload: {0}")]
    ParseError(String),

    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("Invalid filter expression: {0}")]
    FilterError(String),

    #[error("{0}")]
    Other(String),
}
