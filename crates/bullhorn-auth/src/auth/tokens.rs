//! Token types and the caller-supplied token snapshot.

use std::collections::HashMap;
use std::fmt;

/// An OAuth access token, tradable for a REST session.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap an access token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in requests or for caller-side
    /// persistence.
    ///
    /// # Security
    ///
    /// Never log or display this value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the inner value.
    pub fn into_string(self) -> String {
        self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// An OAuth refresh token, usable to obtain new access tokens without
/// re-authentication.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Wrap a refresh token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh requests or for
    /// caller-side persistence.
    ///
    /// # Security
    ///
    /// Never log or display this value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the inner value.
    pub fn into_string(self) -> String {
        self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// A `BhRestToken` REST session token.
#[derive(Clone, PartialEq, Eq)]
pub struct RestToken(String);

impl RestToken {
    /// Wrap a REST session token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for the `BhRestToken` request header or
    /// for caller-side persistence.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the inner value.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for RestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RestToken").field(&"[REDACTED]").finish()
    }
}

/// Environment key for a previously obtained REST base URL.
pub const ENV_REST_URL: &str = "BULLHORN_REST_URL";

/// Environment key for a previously obtained REST session token.
pub const ENV_REST_TOKEN: &str = "BULLHORN_REST_TOKEN";

/// Environment key for a previously obtained refresh token.
pub const ENV_REFRESH_TOKEN: &str = "BULLHORN_REFRESH_TOKEN";

/// Environment key for a previously obtained access token.
pub const ENV_ACCESS_TOKEN: &str = "BULLHORN_ACCESS_TOKEN";

/// A partial, caller-supplied snapshot of previously obtained credentials.
///
/// Any subset of the fields may be present; no combination is required.
/// The acquisition engine picks the cheapest viable path from whatever is
/// available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenBundle {
    /// REST base URL from a previous session, paired with `rest_token`.
    pub rest_url: Option<String>,
    /// REST session token from a previous session.
    pub rest_token: Option<RestToken>,
    /// Refresh token from a previous token grant.
    pub refresh_token: Option<RefreshToken>,
    /// Access token from a previous token grant.
    pub access_token: Option<AccessToken>,
}

impl TokenBundle {
    /// Extract whatever token material an environment snapshot holds.
    ///
    /// Unset and empty keys are omitted from the result, never
    /// represented as empty strings.
    pub fn from_env_map(env: &HashMap<String, String>) -> Self {
        let get = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();
        Self {
            rest_url: get(ENV_REST_URL),
            rest_token: get(ENV_REST_TOKEN).map(RestToken::new),
            refresh_token: get(ENV_REFRESH_TOKEN).map(RefreshToken::new),
            access_token: get(ENV_ACCESS_TOKEN).map(AccessToken::new),
        }
    }

    /// Extract token material from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_map(&std::env::vars().collect())
    }
}
