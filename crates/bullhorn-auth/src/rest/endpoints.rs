//! Endpoint definitions and request/response types.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};

// ============================================================================
// Header Names
// ============================================================================

/// Request header carrying the REST session token.
pub(crate) const REST_TOKEN_HEADER: &str = "BhRestToken";

/// Response header reporting the remaining per-minute request quota.
pub(crate) const RATE_LIMIT_REMAINING_HEADER: &str = "X-RateLimit-Remaining-Minute";

/// Response header reporting the per-minute request quota ceiling.
pub(crate) const RATE_LIMIT_LIMIT_HEADER: &str = "X-RateLimit-Limit-Minute";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for the loginInfo discovery endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct LoginInfoQuery<'a> {
    pub username: &'a str,
}

/// Per-user service endpoints from loginInfo.
///
/// The response carries a dozen more URLs (ATS, CORE, documentation);
/// only the two needed to obtain a session are read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginInfoResponse {
    pub oauth_url: String,
    pub rest_url: String,
}

/// Query parameters for the non-interactive authorization request.
#[derive(Serialize)]
pub(crate) struct AuthorizeQuery<'a> {
    pub client_id: &'a str,
    pub response_type: &'a str,
    pub action: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Query parameters for the authorization-code token exchange.
#[derive(Serialize)]
pub(crate) struct CodeExchangeQuery<'a> {
    pub grant_type: &'a str,
    pub code: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// Query parameters for the refresh-token exchange.
#[derive(Serialize)]
pub(crate) struct RefreshExchangeQuery<'a> {
    pub grant_type: &'a str,
    pub refresh_token: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

/// Token pair issued by both exchange grants.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Query parameters for the REST login.
#[derive(Serialize)]
pub(crate) struct RestLoginQuery<'a> {
    pub version: &'a str,
    pub access_token: &'a str,
    /// Requested session lifetime in minutes.
    pub ttl: u32,
}

/// Response from the REST login.
#[derive(Debug, Deserialize)]
pub(crate) struct RestLoginResponse {
    #[serde(rename = "BhRestToken")]
    pub bh_rest_token: String,
    #[serde(rename = "restUrl")]
    pub rest_url: String,
}

/// OAuth error response format.
///
/// The authorization server uses `error`/`error_description`; the REST
/// layer uses `errorMessage`. All spellings are accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct OauthErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(
        default,
        alias = "error_description",
        alias = "errorMessage",
        alias = "message"
    )]
    pub error_description: Option<String>,
}
