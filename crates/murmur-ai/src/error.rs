//! Error types for murmur-ai

use thiserror::Error;

/// Result type alias using murmur-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised before an update stream has started.
///
/// Once a stream is returned, failures are reported in-band as a terminal
/// `Status` update instead.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint answered with a non-success status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The caller cancelled before a response arrived
    #[error("Request aborted")]
    Aborted,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a rejection error from a status code and message
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code of a rejection, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Rejected { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is the result of cancellation
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_displays_bare_message() {
        let e = Error::rejected(500, "bad");
        assert_eq!(e.to_string(), "bad");
        assert_eq!(e.status(), Some(500));
    }

    #[test]
    fn test_aborted() {
        assert!(Error::Aborted.is_aborted());
        assert!(!Error::rejected(404, "missing").is_aborted());
        assert_eq!(Error::Aborted.status(), None);
    }

    #[test]
    fn test_invalid_config_message() {
        let e = Error::InvalidConfig("endpoint is empty".into());
        assert_eq!(e.to_string(), "Invalid configuration: endpoint is empty");
    }
}
