//! Error handling module for bc-stats.
//!
//! Every failure in the scraper, the snapshot store and the cache sync is funnelled
//! into [`AppError`]. None of them are retried: a batch run aborts on the first error.

use reqwest::StatusCode;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const FETCH_ERROR: &str = "FETCH_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
    pub const IO_ERROR: &str = "IO_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Non-success HTTP status for a request
    Fetch { url: String, status: u16 },
    /// The request never produced a response
    Network { url: String, message: String },
    /// Malformed compressed payload or JSON
    Decode(String),
    /// Filesystem error
    Io(String),
    /// Local cache database error
    Database(String),
    /// Invalid configuration value
    Config(String),
    /// Internal error
    Internal(String),
}

impl AppError {
    pub fn fetch(url: &str, status: StatusCode) -> Self {
        AppError::Fetch {
            url: url.to_string(),
            status: status.as_u16(),
        }
    }

    pub fn network(url: &str, err: reqwest::Error) -> Self {
        tracing::error!("Request to {} failed: {:?}", url, err);
        AppError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Fetch { .. } => codes::FETCH_ERROR,
            AppError::Network { .. } => codes::NETWORK_ERROR,
            AppError::Decode(_) => codes::DECODE_ERROR,
            AppError::Io(_) => codes::IO_ERROR,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Config(_) => codes::CONFIG_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Fetch { url, status } => format!("GET {} -> HTTP {}", url, status),
            AppError::Network { url, message } => format!("GET {} failed: {}", url, message),
            AppError::Decode(msg) => msg.clone(),
            AppError::Io(msg) => msg.clone(),
            AppError::Database(msg) => msg.clone(),
            AppError::Config(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Decode(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("I/O error: {:?}", err);
        AppError::Io(format!("I/O error: {}", err))
    }
}
