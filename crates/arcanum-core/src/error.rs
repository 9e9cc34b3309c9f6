//! Error types for the Arcanum client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole client layer.
///
/// Variants mirror the failure taxonomy of the data layer: validation
/// failures are rejected before any network call, upstream failures carry
/// the application code and message from the response envelope, and
/// timeout/abort are produced by the conversation manager's cancellation
/// machinery.
///
/// The type is `Clone` (and serializable) so that a single settlement can be
/// broadcast to every caller attached to an in-flight request.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ArcanumError {
    /// Malformed input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid credentials, or a 401 response
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-200 application code or malformed/empty response body
    #[error("Upstream error ({code}): {message}")]
    Upstream { code: i64, message: String },

    /// The request exceeded its deadline and was aborted
    #[error("Request timed out")]
    Timeout,

    /// The request was cancelled before settling
    #[error("Request aborted")]
    Aborted,

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ArcanumError {
    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates an Upstream error from an envelope code and message
    pub fn upstream(code: i64, message: impl Into<String>) -> Self {
        Self::Upstream {
            code,
            message: message.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is an authentication error
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if this error came from cancellation (timeout or abort)
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Timeout | Self::Aborted)
    }

    /// The message shown to users when this error reaches a notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream { message, .. } if !message.is_empty() => message.clone(),
            Self::Auth(message) if !message.is_empty() => message.clone(),
            Self::Network(_) => "网络异常，请稍后再试".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ArcanumError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Conversion from anyhow::Error (transitional, should be removed eventually)
impl From<anyhow::Error> for ArcanumError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, ArcanumError>`.
pub type Result<T> = std::result::Result<T, ArcanumError>;
