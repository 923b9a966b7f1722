//! Error types and handling for the POI sweep
//!
//! [`SweepError`] is the crate-level error used by configuration, validation and
//! output. [`QueryError`] is what a [`crate::search::QueryClient`] reports for a
//! single failed region query; the searcher logs it and keeps going.

use thiserror::Error;

/// Main error type for the POI sweep
#[derive(Error, Debug)]
pub enum SweepError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Output rendering errors
    #[error("Output error: {message}")]
    Output { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON encoding errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl SweepError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new output error
    pub fn output<S: Into<String>>(message: S) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SweepError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            SweepError::Validation { message } => format!("Invalid input: {message}"),
            SweepError::Output { message } => format!("Could not write results: {message}"),
            SweepError::Io { .. } => {
                "File operation failed. Please check the output directory permissions.".to_string()
            }
            SweepError::Json { .. } => "Could not encode results as JSON.".to_string(),
        }
    }
}

/// Failure of a single region query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit error: {0}")]
    RateLimited(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
