//! Session acquisition.
//!
//! The engine evaluates four authentication paths in fixed order and
//! short-circuits at the first one that yields a session:
//!
//! 1. validate an existing session (ping),
//! 2. exchange a refresh token,
//! 3. spend a bare access token,
//! 4. full password-grant login.
//!
//! A failed ping and a failed refresh exchange are path-unavailable
//! signals, not errors; the engine logs them and moves on. Everything
//! else propagates to the caller.

use tracing::{debug, info, instrument, warn};

use crate::config::AcquireConfig;
use crate::error::{Error, InvalidInputError};
use crate::rest::RestClient;
use crate::types::ApiUrl;

use super::credentials::Credentials;
use super::tokens::{AccessToken, RefreshToken, RestToken, TokenBundle};

/// Everything a caller can hand the engine: an optional credential set
/// and an optional snapshot of previously obtained tokens.
#[derive(Debug, Clone, Default)]
pub struct AcquireInput {
    /// Registered application identity plus end-user identity.
    pub credentials: Option<Credentials>,
    /// Previously obtained token material, any subset.
    pub tokens: TokenBundle,
}

impl AcquireInput {
    /// Assemble an input bundle from the process environment.
    pub fn from_env() -> Self {
        Self {
            credentials: Credentials::from_env(),
            tokens: TokenBundle::from_env(),
        }
    }
}

/// Which authentication path produced a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMethod {
    /// The caller-supplied session was still valid and was reused.
    Existing,
    /// A refresh token was exchanged for a fresh session.
    Refresh,
    /// A caller-supplied access token was spent on a REST login.
    Access,
    /// A full password-grant login was performed.
    Full,
}

impl AcquireMethod {
    /// Stable lowercase name of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquireMethod::Existing => "existing",
            AcquireMethod::Refresh => "refresh",
            AcquireMethod::Access => "access",
            AcquireMethod::Full => "full",
        }
    }
}

impl std::fmt::Display for AcquireMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An acquired REST session.
///
/// `rest_url` and `rest_token` always come from the downstream service's
/// own response, except on the [`AcquireMethod::Existing`] path, where
/// the caller's values are echoed back after positive validation.
///
/// This is a terminal value; the engine holds no state across calls, so
/// each acquisition is independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestSession {
    /// Base URL for subsequent REST requests.
    pub rest_url: String,
    /// Session token for the `BhRestToken` request header.
    pub rest_token: RestToken,
    /// Refresh token to persist for the next acquisition, when one is
    /// known.
    pub refresh_token: Option<RefreshToken>,
    /// Access token backing this session, when one is known.
    pub access_token: Option<AccessToken>,
    /// Remaining per-minute request quota observed during validation
    /// (Existing path only).
    pub min_remaining: Option<u32>,
    /// Which authentication path produced this session.
    pub method: AcquireMethod,
}

impl RestSession {
    /// Acquire a REST session from whatever input is available.
    ///
    /// The configuration is validated before any network activity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] without touching the network when
    /// the policy numbers are out of range or no authentication path is
    /// viable; transport and downstream failures from the attempted
    /// paths otherwise propagate as described in the module docs.
    #[instrument(skip_all)]
    pub async fn acquire(input: AcquireInput, config: &AcquireConfig) -> Result<Self, Error> {
        config.validate()?;

        let client = RestClient::new(config.http.clone(), config.login_info_url.clone());

        if let Some(session) = try_existing(&client, &input, config).await {
            return Ok(session);
        }
        if let Some(session) = try_refresh(&client, &input, config).await? {
            return Ok(session);
        }
        if let Some(session) = try_access(&client, &input, config).await? {
            return Ok(session);
        }
        full_login(&client, &input, config).await
    }
}

/// Path 1: reuse a supplied session if it pings healthy with quota to
/// spare. Every failure here is soft.
async fn try_existing(
    client: &RestClient,
    input: &AcquireInput,
    config: &AcquireConfig,
) -> Option<RestSession> {
    let tokens = &input.tokens;
    let (rest_url, rest_token) = match (&tokens.rest_url, &tokens.rest_token) {
        (Some(url), Some(token)) => (url, token),
        _ => return None,
    };

    let url = match ApiUrl::new(rest_url) {
        Ok(url) => url,
        Err(err) => {
            debug!(%err, "supplied rest_url is not usable, skipping existing-session path");
            return None;
        }
    };

    match client.ping(&url, rest_token).await {
        Ok(remaining) if remaining > config.min_remaining => {
            info!(remaining, "existing session is still valid");
            Some(RestSession {
                rest_url: rest_url.clone(),
                rest_token: rest_token.clone(),
                refresh_token: tokens.refresh_token.clone(),
                access_token: tokens.access_token.clone(),
                min_remaining: Some(remaining),
                method: AcquireMethod::Existing,
            })
        }
        Ok(remaining) => {
            debug!(
                remaining,
                threshold = config.min_remaining,
                "existing session too close to its rate limit"
            );
            None
        }
        Err(err) => {
            debug!(%err, "existing session did not validate");
            None
        }
    }
}

/// Path 2: exchange a refresh token. A rejected exchange is soft;
/// discovery and REST-login failures propagate.
async fn try_refresh(
    client: &RestClient,
    input: &AcquireInput,
    config: &AcquireConfig,
) -> Result<Option<RestSession>, Error> {
    let (credentials, refresh_token) = match (&input.credentials, &input.tokens.refresh_token) {
        (Some(credentials), Some(token)) => (credentials, token),
        _ => return Ok(None),
    };

    let info = client.login_info(credentials.username()).await?;

    let pair = match client
        .refresh_exchange(&info.oauth_url, credentials, refresh_token)
        .await
    {
        Ok(pair) => pair,
        Err(err) => {
            warn!(%err, "refresh token exchange failed, falling back");
            return Ok(None);
        }
    };

    let access_token = AccessToken::new(pair.access_token);
    let login = client
        .rest_login(&info.rest_url, &access_token, config.ttl_days)
        .await?;

    Ok(Some(RestSession {
        rest_url: login.rest_url,
        rest_token: RestToken::new(login.bh_rest_token),
        refresh_token: Some(RefreshToken::new(pair.refresh_token)),
        access_token: Some(access_token),
        min_remaining: None,
        method: AcquireMethod::Refresh,
    }))
}

/// Path 3: spend a supplied access token. Unlike the refresh path,
/// failures here propagate: a caller holding only an access token has no
/// cheaper alternative left, and an unresolvable REST URL is an input
/// error, not a transient condition.
async fn try_access(
    client: &RestClient,
    input: &AcquireInput,
    config: &AcquireConfig,
) -> Result<Option<RestSession>, Error> {
    let access_token = match &input.tokens.access_token {
        Some(token) => token,
        None => return Ok(None),
    };

    let rest_url = match &input.tokens.rest_url {
        Some(url) => ApiUrl::new(url)?,
        None => match &input.credentials {
            Some(credentials) => client.login_info(credentials.username()).await?.rest_url,
            None => return Err(InvalidInputError::NoRestUrl.into()),
        },
    };

    let login = client
        .rest_login(&rest_url, access_token, config.ttl_days)
        .await?;

    Ok(Some(RestSession {
        rest_url: login.rest_url,
        rest_token: RestToken::new(login.bh_rest_token),
        refresh_token: input.tokens.refresh_token.clone(),
        access_token: Some(access_token.clone()),
        min_remaining: None,
        method: AcquireMethod::Access,
    }))
}

/// Path 4: full password-grant login.
async fn full_login(
    client: &RestClient,
    input: &AcquireInput,
    config: &AcquireConfig,
) -> Result<RestSession, Error> {
    let credentials = input
        .credentials
        .as_ref()
        .ok_or(InvalidInputError::Insufficient)?;

    info!("performing full password-grant login");

    let info = client.login_info(credentials.username()).await?;
    let code = client.authorize(&info.oauth_url, credentials).await?;
    let pair = client.code_exchange(&info.oauth_url, credentials, &code).await?;

    let access_token = AccessToken::new(pair.access_token);
    let login = client
        .rest_login(&info.rest_url, &access_token, config.ttl_days)
        .await?;

    Ok(RestSession {
        rest_url: login.rest_url,
        rest_token: RestToken::new(login.bh_rest_token),
        refresh_token: Some(RefreshToken::new(pair.refresh_token)),
        access_token: Some(access_token),
        min_remaining: None,
        method: AcquireMethod::Full,
    })
}
