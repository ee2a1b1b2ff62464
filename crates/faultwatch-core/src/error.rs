//! Error types for Faultwatch

use thiserror::Error;

/// Result type alias using Faultwatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Faultwatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport or decoding failure inside the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Terminal error
    #[error("Terminal error: {0}")]
    Tui(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Coarse classification of a failure, for display next to a fixed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never produced a usable response
    Network,
    /// The backend answered with this status code
    Server(u16),
    /// Input was rejected before anything was sent
    Validation,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Server(status) => write!(f, "server {status}"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Status { status, .. } => FailureKind::Server(*status),
            Self::Http(e) => match e.status() {
                Some(status) => FailureKind::Server(status.as_u16()),
                None => FailureKind::Network,
            },
            Self::Validation(_) | Self::Url(_) => FailureKind::Validation,
            Self::Config(_) | Self::Tui(_) | Self::Io(_) | Self::Serialization(_) => {
                FailureKind::Network
            }
        }
    }
}
