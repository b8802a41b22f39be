//! Error types for rollcall.
//!
//! This module defines all error types used throughout the rollcall crate.
//! The board and the refresh loop catch remote failures and log them rather
//! than surfacing them; these variants exist for the layers below.

use thiserror::Error;

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Remote Store Errors ===
    /// An HTTP request to the remote store failed outright.
    #[error("remote request failed: {0}")]
    RemoteRequest(#[from] reqwest::Error),

    /// The remote store answered with a non-success status.
    #[error("remote API error ({status}): {message}")]
    RemoteApi {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        message: String,
    },

    /// A remote row could not be decoded into a canonical record.
    #[error("malformed remote row: {message}")]
    MalformedRow {
        /// What was wrong with the row.
        message: String,
    },

    /// A write was attempted without an authenticated session.
    #[error("no authenticated session; write aborted")]
    SessionMissing,

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Parameter Errors ===
    /// A navigation parameter (date or month string) was invalid.
    #[error("invalid parameter: {message}")]
    InvalidParam {
        /// Description of the bad parameter.
        message: String,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a remote API error from a status code and body.
    #[must_use]
    pub fn remote_api(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed-row error.
    #[must_use]
    pub fn malformed_row(message: impl Into<String>) -> Self {
        Self::MalformedRow {
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the write path lacked a session.
    #[must_use]
    pub fn is_session_missing(&self) -> bool {
        matches!(self, Self::SessionMissing)
    }

    /// Check if this error came from the remote store (network or API).
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteRequest(_) | Self::RemoteApi { .. })
    }
}
