//! Error types for the bullhorn-auth library.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authorization, downstream-API, and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for bullhorn-auth operations.
///
/// Covers all failure modes in the library, with explicit variants to
/// allow callers to handle specific cases.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authorization flow errors (login rejected, no grant code issued).
    #[error("authorization error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success responses from the downstream service.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Input validation errors (bad policy numbers, unusable URLs,
    /// insufficient credentials or tokens).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The URL is stripped from the message so that query-string
        // credentials never reach logs or diagnostics.
        if err.is_timeout() {
            TransportError::Timeout { duration_ms: 0 }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.without_url().to_string(),
            }
        } else {
            TransportError::Http {
                message: err.without_url().to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Authorization flow errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The authorize endpoint did not redirect with a `code` query
    /// parameter. The usual cause is a rejected username/password pair.
    #[error("authorization did not yield a grant code (check username and password)")]
    NoAuthorizationCode,
}

/// A non-success HTTP response from the downstream service.
///
/// Carries the status line, the OAuth error code and message when the body
/// provided them, and the two rate-limit headers when they were present.
/// Nothing else from the exchange is retained.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// OAuth error code (e.g. `invalid_grant`) or canonical status text.
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
    /// `X-RateLimit-Remaining-Minute` response header, if present.
    pub rate_limit_remaining: Option<String>,
    /// `X-RateLimit-Limit-Minute` response header, if present.
    pub rate_limit_limit: Option<String>,
}

impl ApiError {
    /// Create a new API error from a status line and parsed body fields.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
            rate_limit_remaining: None,
            rate_limit_limit: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        if let Some(ref remaining) = self.rate_limit_remaining {
            write!(f, " (rate limit remaining: {}", remaining)?;
            if let Some(ref limit) = self.rate_limit_limit {
                write!(f, "/{}", limit)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Input validation errors.
///
/// These are raised before any network activity takes place.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// A policy number is out of range.
    #[error("invalid {field}: {reason}")]
    Policy { field: &'static str, reason: String },

    /// A URL string could not be parsed or does not meet requirements.
    #[error("invalid URL '{value}': {reason}")]
    Url { value: String, reason: String },

    /// An environment variable was set but carried an unusable value.
    #[error("invalid environment value for {key}: {reason}")]
    EnvVar { key: String, reason: String },

    /// An access token was supplied but no REST base URL can be derived.
    #[error(
        "access token provided but no REST URL could be resolved; \
         supply tokens.rest_url or credentials with a username"
    )]
    NoRestUrl,

    /// No viable authentication path was available from the given input.
    #[error(
        "insufficient input: provide a complete credential set (client id, client secret, \
         username, password), or tokens.rest_url together with tokens.rest_token, \
         or tokens.refresh_token together with client credentials, \
         or tokens.access_token together with tokens.rest_url or a username"
    )]
    Insufficient,
}
