//! Error types for the tap crate

use std::io;
use std::time::Duration;

use perftap_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur in the tap system
#[derive(Error, Debug)]
pub enum TapError {
    /// I/O error (socket operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Event could not be encoded (out-of-order stream)
    #[error("encode error: {0}")]
    Encode(#[from] ProtocolError),

    /// A subscriber write did not complete in time
    #[error("write timed out after {timeout:?}")]
    WriteTimeout { timeout: Duration },

    /// The subscriber's writer has already been shut down
    #[error("writer closed")]
    WriterClosed,

    /// A filter command carried a regex that does not compile
    #[error("invalid {field} pattern '{pattern}': {source}")]
    InvalidFilterPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The bus no longer accepts listeners
    #[error("broadcast bus closed")]
    BusClosed,

    /// Failed to bind the listening socket
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Result type for tap operations
pub type Result<T> = std::result::Result<T, TapError>;
