//! Error types for the UPS bridge
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the UPS bridge
#[derive(Error, Debug)]
pub enum Error {
    /// The status source could not produce a readable dump this cycle
    ///
    /// Covers spawn failures, non-zero exit statuses, empty output and
    /// output that does not decode as UTF-8. The cycle is abandoned;
    /// the next one starts fresh.
    #[error("Status source unavailable: {0}")]
    SourceUnavailable(String),

    /// The status output carried no `ups.model` line
    ///
    /// Without a model there is no topic to publish under, so the
    /// cycle publishes nothing.
    #[error("Status output has no ups.model line")]
    MissingModel,

    /// A single field failed to publish
    ///
    /// The field stays out of the cache and is re-reported on the next
    /// cycle; sibling fields are unaffected.
    #[error("Publish to {topic} failed: {message}")]
    Publish {
        /// Full topic path of the failed publish
        topic: String,
        /// Transport error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a status source error
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a per-field publish error
    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_topic_and_message() {
        let err = Error::publish("ups/north/ups/Test/battery_charge", "broker gone");
        let text = err.to_string();
        assert!(text.contains("ups/north/ups/Test/battery_charge"));
        assert!(text.contains("broker gone"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
