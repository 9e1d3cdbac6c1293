//! Error types for counter sources

use thiserror::Error;

/// Errors raised while opening, registering or polling a counter source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Host name does not resolve to a source this build can sample
    #[error("host '{host}' is not supported: only the local machine can be monitored")]
    UnsupportedHost { host: String },

    /// Category is not available on the host
    #[error("category '{category}' is not available on host '{host}'")]
    UnknownCategory { host: String, category: String },

    /// Sampling failed for a host
    #[error("failed to sample host '{host}': {message}")]
    Sampling { host: String, message: String },
}

impl SourceError {
    /// Create an unknown-category error
    pub fn unknown_category(host: impl Into<String>, category: impl Into<String>) -> Self {
        Self::UnknownCategory {
            host: host.into(),
            category: category.into(),
        }
    }

    /// Create a sampling error
    pub fn sampling(host: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Sampling {
            host: host.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for source operations
pub type Result<T> = std::result::Result<T, SourceError>;
