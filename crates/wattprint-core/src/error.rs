//! Error types for WattPrint

/// Result type alias using WattPrint's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for WattPrint operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request validation errors (the only user-visible variant)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upstream lookup errors (geolocation, time, carbon intensity)
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Classification service errors
    #[error("classification error: {0}")]
    Classification(String),

    /// Credential acquisition errors
    #[error("credential error: {0}")]
    Credential(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new input validation error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a new classification error
    pub fn classification(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }

    /// Create a new credential error
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
