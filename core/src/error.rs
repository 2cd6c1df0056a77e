//! Error types and HTTP status mapping
//!
//! Every verification failure surfaces as its own variant so callers can tell
//! a malformed token from an unreachable key source without parsing messages.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for verification operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Verification and adapter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("malformed token: {message}")]
    MalformedToken { message: String },

    #[error("unsupported algorithm: {message}")]
    UnsupportedAlgorithm { message: String },

    #[error("unsupported key type: {message}")]
    UnsupportedKeyType { message: String },

    #[error("malformed key: {message}")]
    MalformedKey { message: String },

    #[error("key not found: {message}")]
    KeyNotFound { message: String },

    #[error("key source unavailable: {message}")]
    KeySourceUnavailable { message: String },

    #[error("invalid signature: {message}")]
    InvalidSignature { message: String },

    #[error("token expired: {message}")]
    TokenExpired { message: String },

    #[error("invalid issuer: {message}")]
    InvalidIssuer { message: String },

    #[error("invalid audience: {message}")]
    InvalidAudience { message: String },

    #[error("code exchange failed: {message}")]
    CodeExchangeFailed { message: String },

    #[error("upstream error: {message}")]
    UpstreamError { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::MalformedToken {
            message: message.into(),
        }
    }

    pub fn unsupported_algorithm(message: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm {
            message: message.into(),
        }
    }

    pub fn unsupported_key_type(message: impl Into<String>) -> Self {
        Self::UnsupportedKeyType {
            message: message.into(),
        }
    }

    pub fn malformed_key(message: impl Into<String>) -> Self {
        Self::MalformedKey {
            message: message.into(),
        }
    }

    pub fn key_not_found(message: impl Into<String>) -> Self {
        Self::KeyNotFound {
            message: message.into(),
        }
    }

    pub fn key_source_unavailable(message: impl Into<String>) -> Self {
        Self::KeySourceUnavailable {
            message: message.into(),
        }
    }

    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::InvalidSignature {
            message: message.into(),
        }
    }

    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::TokenExpired {
            message: message.into(),
        }
    }

    pub fn invalid_issuer(message: impl Into<String>) -> Self {
        Self::InvalidIssuer {
            message: message.into(),
        }
    }

    pub fn invalid_audience(message: impl Into<String>) -> Self {
        Self::InvalidAudience {
            message: message.into(),
        }
    }

    pub fn code_exchange_failed(message: impl Into<String>) -> Self {
        Self::CodeExchangeFailed {
            message: message.into(),
        }
    }

    pub fn upstream_error(message: impl Into<String>) -> Self {
        Self::UpstreamError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } => 400,
            Self::MalformedToken { .. }
            | Self::UnsupportedAlgorithm { .. }
            | Self::KeyNotFound { .. }
            | Self::InvalidSignature { .. }
            | Self::TokenExpired { .. }
            | Self::InvalidIssuer { .. }
            | Self::InvalidAudience { .. } => 401,
            Self::UnsupportedKeyType { .. }
            | Self::MalformedKey { .. }
            | Self::CodeExchangeFailed { .. }
            | Self::UpstreamError { .. } => 502,
            Self::KeySourceUnavailable { .. } => 503,
            Self::Internal { .. } => 500,
        }
    }

    /// Get the error key for this error
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::MalformedToken { .. } => "malformed_token",
            Self::UnsupportedAlgorithm { .. } => "unsupported_algorithm",
            Self::UnsupportedKeyType { .. } => "unsupported_key_type",
            Self::MalformedKey { .. } => "malformed_key",
            Self::KeyNotFound { .. } => "key_not_found",
            Self::KeySourceUnavailable { .. } => "key_source_unavailable",
            Self::InvalidSignature { .. } => "invalid_signature",
            Self::TokenExpired { .. } => "token_expired",
            Self::InvalidIssuer { .. } => "invalid_issuer",
            Self::InvalidAudience { .. } => "invalid_audience",
            Self::CodeExchangeFailed { .. } => "code_exchange_failed",
            Self::UpstreamError { .. } => "upstream_error",
            Self::Internal { .. } => "internal_error",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            success: false,
            error: err.error_key().to_string(),
            message: err.to_string(),
        }
    }
}
