//! Shared error type across Hashi crates.

use thiserror::Error;

/// Stable error codes, handy for matching without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Real-time channel could not be opened or used.
    Network,
    /// Outbound action call failed.
    Api,
    /// Inbound envelope did not match its schema.
    Validation,
    /// Invalid construction parameters.
    Config,
    /// Internal invariant broken.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Network => "NETWORK",
            ErrorCode::Api => "API",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Config => "CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Structural mismatch between an envelope and a message schema.
///
/// `path` is dotted from the envelope root, e.g. `Data.EventMsg.FromUin`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed at `{path}`: {reason}")]
pub struct ValidationFailure {
    pub path: String,
    pub reason: String,
}

impl ValidationFailure {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, HashiError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum HashiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("api error: {0}")]
    Api(String),
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl HashiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            HashiError::Network(_) => ErrorCode::Network,
            HashiError::Api(_) => ErrorCode::Api,
            HashiError::Validation(_) => ErrorCode::Validation,
            HashiError::Config(_) => ErrorCode::Config,
            HashiError::Internal(_) => ErrorCode::Internal,
        }
    }
}
