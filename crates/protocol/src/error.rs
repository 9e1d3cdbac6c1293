//! Protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding the wire protocol
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A data event arrived before any category event
    #[error("data event for counter '{counter}' without a preceding category")]
    NoActiveCategory { counter: String },

    /// Data event shape does not match the current category
    #[error("category '{category}' {expected} instances but the sample {actual}")]
    InstanceMismatch {
        category: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Line could not be parsed
    #[error("malformed line: {0}")]
    MalformedLine(String),

    /// Data line references an id-path that was never declared
    #[error("undeclared id-path: {0}")]
    UndeclaredId(String),
}

impl ProtocolError {
    /// Create a malformed line error
    #[inline]
    pub fn malformed(line: impl Into<String>) -> Self {
        Self::MalformedLine(line.into())
    }

    pub(crate) fn instance_mismatch(category: &str, has_instances: bool) -> Self {
        if has_instances {
            Self::InstanceMismatch {
                category: category.to_string(),
                expected: "has",
                actual: "has none",
            }
        } else {
            Self::InstanceMismatch {
                category: category.to_string(),
                expected: "has no",
                actual: "names one",
            }
        }
    }
}
