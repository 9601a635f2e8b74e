//! Client credential type.

use std::collections::HashMap;
use std::fmt;

/// The registered application identity plus end-user identity required
/// for the OAuth password grant and the refresh-token exchange.
///
/// All four fields are required together; a partial set is no set at all
/// (see [`Credentials::from_env_map`]).
///
/// # Security
///
/// The client secret and password are never exposed in Debug output to
/// prevent accidental logging.
pub struct Credentials {
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
}

/// Environment key for the registered client id.
pub const ENV_CLIENT_ID: &str = "BULLHORN_CLIENT_ID";

/// Environment key for the registered client secret.
pub const ENV_CLIENT_SECRET: &str = "BULLHORN_CLIENT_SECRET";

/// Environment key for the API username.
pub const ENV_USERNAME: &str = "BULLHORN_USERNAME";

/// Environment key for the API password.
pub const ENV_PASSWORD: &str = "BULLHORN_PASSWORD";

impl Credentials {
    /// Create a new credential set.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Extract credentials from an environment snapshot.
    ///
    /// Returns `Some` only when all four keys are set and non-empty;
    /// anything less yields `None` rather than a partial credential set.
    pub fn from_env_map(env: &HashMap<String, String>) -> Option<Self> {
        let get = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();
        Some(Self {
            client_id: get(ENV_CLIENT_ID)?,
            client_secret: get(ENV_CLIENT_SECRET)?,
            username: get(ENV_USERNAME)?,
            password: get(ENV_PASSWORD)?,
        })
    }

    /// Extract credentials from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_env_map(&std::env::vars().collect())
    }

    /// Returns the registered client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the API username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the client secret.
    ///
    /// # Security
    ///
    /// Use this only when constructing token exchange requests.
    /// Never log or display this value.
    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing the authorization request.
    /// Never log or display this value.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

// Intentionally hide the secret-bearing fields in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// Clone is intentionally implemented to allow credentials to be reused,
// but the type is not Copy to make credential passing explicit.
impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}
