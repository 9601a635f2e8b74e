//! The six endpoint operations used to obtain a REST session.

use reqwest::Method;
use reqwest::header::LOCATION;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::auth::{AccessToken, Credentials, RefreshToken, RestToken};
use crate::config::HttpPolicy;
use crate::error::{ApiError, AuthError, Error};
use crate::types::ApiUrl;

use super::endpoints::{
    AuthorizeQuery, CodeExchangeQuery, LoginInfoQuery, LoginInfoResponse, OauthErrorResponse,
    RATE_LIMIT_REMAINING_HEADER, REST_TOKEN_HEADER, RefreshExchangeQuery, RestLoginQuery,
    RestLoginResponse, TokenPairResponse,
};
use super::transport::Transport;

/// Per-user OAuth and REST base URLs resolved by discovery.
#[derive(Debug, Clone)]
pub(crate) struct LoginInfo {
    pub oauth_url: ApiUrl,
    pub rest_url: ApiUrl,
}

/// Client for the Bullhorn authentication endpoints.
///
/// Each method is a thin, single-purpose request built on the retrying
/// transport; the path-selection logic lives in `auth::session`.
pub(crate) struct RestClient {
    transport: Transport,
    login_info_url: ApiUrl,
}

impl RestClient {
    pub fn new(policy: HttpPolicy, login_info_url: ApiUrl) -> Self {
        Self {
            transport: Transport::new(policy),
            login_info_url,
        }
    }

    /// Resolve the per-user OAuth and REST base URLs.
    #[instrument(skip_all)]
    pub async fn login_info(&self, username: &str) -> Result<LoginInfo, Error> {
        debug!("resolving per-user service endpoints");

        let request = self
            .transport
            .request(Method::GET, self.login_info_url.as_str())
            .query(&LoginInfoQuery { username })
            .build()?;
        let response = self.transport.execute(request).await?;
        let body: LoginInfoResponse = handle_json(response).await?;

        Ok(LoginInfo {
            oauth_url: ApiUrl::new(&body.oauth_url)?,
            rest_url: ApiUrl::new(&body.rest_url)?,
        })
    }

    /// Obtain a short-lived authorization code via a non-interactive
    /// login submission.
    ///
    /// Redirect following is suppressed; the grant code rides on the
    /// `Location` response header.
    #[instrument(skip(self, credentials), fields(oauth = %oauth_url))]
    pub async fn authorize(
        &self,
        oauth_url: &ApiUrl,
        credentials: &Credentials,
    ) -> Result<String, Error> {
        debug!("requesting authorization code");

        let request = self
            .transport
            .request(Method::GET, &oauth_url.join("authorize"))
            .query(&AuthorizeQuery {
                client_id: credentials.client_id(),
                response_type: "code",
                action: "Login",
                username: credentials.username(),
                password: credentials.password(),
            })
            .build()?;
        let response = self.transport.execute(request).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());

        location
            .and_then(extract_code)
            .ok_or_else(|| AuthError::NoAuthorizationCode.into())
    }

    /// Trade an authorization code for access/refresh tokens.
    #[instrument(skip(self, credentials, code), fields(oauth = %oauth_url))]
    pub async fn code_exchange(
        &self,
        oauth_url: &ApiUrl,
        credentials: &Credentials,
        code: &str,
    ) -> Result<TokenPairResponse, Error> {
        debug!("exchanging authorization code for tokens");

        let request = self
            .transport
            .request(Method::POST, &oauth_url.join("token"))
            .query(&CodeExchangeQuery {
                grant_type: "authorization_code",
                code,
                client_id: credentials.client_id(),
                client_secret: credentials.client_secret(),
            })
            .build()?;
        let response = self.transport.execute(request).await?;
        handle_json(response).await
    }

    /// Trade a refresh token for new access/refresh tokens.
    #[instrument(skip(self, credentials, refresh_token), fields(oauth = %oauth_url))]
    pub async fn refresh_exchange(
        &self,
        oauth_url: &ApiUrl,
        credentials: &Credentials,
        refresh_token: &RefreshToken,
    ) -> Result<TokenPairResponse, Error> {
        debug!("exchanging refresh token");

        let request = self
            .transport
            .request(Method::POST, &oauth_url.join("token"))
            .query(&RefreshExchangeQuery {
                grant_type: "refresh_token",
                refresh_token: refresh_token.as_str(),
                client_id: credentials.client_id(),
                client_secret: credentials.client_secret(),
            })
            .build()?;
        let response = self.transport.execute(request).await?;
        handle_json(response).await
    }

    /// Trade an access token for a REST session.
    #[instrument(skip(self, access_token), fields(rest = %rest_url))]
    pub async fn rest_login(
        &self,
        rest_url: &ApiUrl,
        access_token: &AccessToken,
        ttl_days: u32,
    ) -> Result<RestLoginResponse, Error> {
        debug!(ttl_days, "logging in to REST");

        // The downstream ttl parameter is expressed in minutes.
        let ttl = ttl_days.saturating_mul(24 * 60);

        let request = self
            .transport
            .request(Method::POST, &rest_url.join("login"))
            .query(&RestLoginQuery {
                version: "*",
                access_token: access_token.as_str(),
                ttl,
            })
            .build()?;
        let response = self.transport.execute(request).await?;
        handle_json(response).await
    }

    /// Validate an existing REST session and read the remaining
    /// per-minute request quota.
    #[instrument(skip(self, rest_token), fields(rest = %rest_url))]
    pub async fn ping(&self, rest_url: &ApiUrl, rest_token: &RestToken) -> Result<u32, Error> {
        debug!("validating existing session");

        let request = self
            .transport
            .request(Method::GET, &rest_url.join("ping"))
            .header(REST_TOKEN_HEADER, rest_token.as_str())
            .build()?;
        let response = self.transport.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api(parse_error_response(response).await));
        }

        response
            .headers()
            .get(RATE_LIMIT_REMAINING_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u32>().ok())
            .ok_or_else(|| {
                Error::Api(ApiError::new(
                    status.as_u16(),
                    None,
                    Some(format!(
                        "missing or unparsable {} header",
                        RATE_LIMIT_REMAINING_HEADER
                    )),
                ))
            })
    }
}

/// Pull the `code` query parameter out of a redirect target.
///
/// The authorization server may issue a relative `Location`; both forms
/// are accepted.
fn extract_code(location: &str) -> Option<String> {
    let url = Url::parse(location)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(location)))
        .ok()?;

    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
}

/// Parse the body on success, or the error format otherwise.
async fn handle_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, Error> {
    let status = response.status();
    trace!(status = %status, "handling response");

    if status.is_success() {
        let body = response.json::<R>().await?;
        Ok(body)
    } else {
        Err(Error::Api(parse_error_response(response).await))
    }
}

/// Parse a non-success response body into an [`ApiError`].
async fn parse_error_response(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();

    match response.json::<OauthErrorResponse>().await {
        Ok(body) => ApiError::new(status, body.error, body.error_description),
        Err(_) => ApiError::new(status, None, None),
    }
}
