use thiserror::Error;
use std::io;
use std::string::FromUtf8Error;

#[derive(Error, Debug)]
pub enum RegressionError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to invoke test helper for module {module}: {source}")]
    Spawn {
        module: String,
        #[source]
        source: io::Error,
    },

    #[error("Test helper for module {module} wrote output that is not UTF-8: {source}")]
    Decode {
        module: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Worker pool error: {0}")]
    Pool(String),
}

impl RegressionError {
    /// Returns `true` for errors caused by bad arguments or configuration.
    pub fn is_usage(&self) -> bool {
        matches!(self, RegressionError::Usage(_) | RegressionError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, RegressionError>;
