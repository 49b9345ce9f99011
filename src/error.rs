// src/error.rs

//! Unified error handling for the notice subscription core.

use std::fmt;

use thiserror::Error;

use crate::models::Source;

/// Result type alias for notice operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport-level failure: the host could not be reached at all
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Any other HTTP/transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// The anti-bot handshake did not yield a client id
    #[error("Challenge unsolved for {0}")]
    ChallengeUnsolved(String),

    /// A persisted source string has no registry entry
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// The notification cache could not be decoded
    #[error("Corrupt notification cache: {0}")]
    CorruptCache(String),

    /// The manager was asked to operate on a source that is not subscribed
    #[error("Source {0} is not subscribed")]
    NotSubscribed(Source),

    /// The requested ruleset is not registered for the source
    #[error("Ruleset not found for source {0}")]
    RulesetNotFound(Source),

    /// A listing row lacked an optional field
    #[error("Optional field '{field}' missing in {context}")]
    OptionalFieldMissing { field: String, context: String },

    /// A blob already exists and overwriting was not allowed
    #[error("Blob '{0}' already exists")]
    BlobExists(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Crawling error
    #[error("Crawl error for {context}: {message}")]
    Crawl { context: String, message: String },
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::NetworkUnavailable(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a crawl error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a corrupt cache error.
    pub fn corrupt(message: impl fmt::Display) -> Self {
        Self::CorruptCache(message.to_string())
    }

    /// Create a missing optional field error.
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::OptionalFieldMissing {
            field: field.into(),
            context: context.into(),
        }
    }

    /// Whether the error came from the network layer.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable(_) | Self::Network(_) | Self::ChallengeUnsolved(_)
        )
    }

    /// Short message suitable for a status line or toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkUnavailable(_) => "No network connection".to_string(),
            Self::Network(message) => format!("Network error: {message}"),
            Self::ChallengeUnsolved(_) => {
                "Cannot pass site verification, please retry later".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_network_kinds() {
        assert_eq!(
            AppError::NetworkUnavailable("dns".into()).user_message(),
            "No network connection"
        );
        assert_eq!(
            AppError::Network("502 Bad Gateway".into()).user_message(),
            "Network error: 502 Bad Gateway"
        );
        assert!(AppError::ChallengeUnsolved("x".into()).is_network());
        assert!(!AppError::UnknownSource("x".into()).is_network());
    }

    #[test]
    fn test_manager_errors_name_source() {
        let err = AppError::NotSubscribed(Source::Jwc);
        assert_eq!(err.to_string(), "Source 教务处 is not subscribed");
    }
}
