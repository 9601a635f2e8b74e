//! Acquisition configuration and HTTP policy.
//!
//! Defaults resolve in three steps, independently per knob: an explicit
//! config value wins, then an environment-sourced fallback, then the
//! hardcoded default. Resolution takes an injectable environment snapshot
//! so tests never touch process-wide state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, InvalidInputError};
use crate::types::ApiUrl;

/// Default discovery endpoint for production Bullhorn clusters.
pub const DEFAULT_LOGIN_INFO_URL: &str =
    "https://rest.bullhornstaffing.com/rest-services/loginInfo";

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default number of retries for transient failures.
pub const DEFAULT_RETRIES: u32 = 0;

/// Default rate-limit threshold under which an existing session is
/// considered too depleted to reuse.
pub const DEFAULT_MIN_REMAINING: u32 = 100;

/// Default requested session lifetime, in days.
pub const DEFAULT_TTL_DAYS: u32 = 30;

/// Environment key overriding the requested session lifetime.
pub const ENV_TTL_DAYS: &str = "BULLHORN_TTL_DAYS";

/// Environment key overriding the rate-limit reuse threshold.
pub const ENV_MIN_REMAINING: &str = "BULLHORN_MIN_REMAINING";

/// Environment key overriding the discovery endpoint, for deployments
/// pinned to a regional cluster.
pub const ENV_LOGIN_INFO_URL: &str = "BULLHORN_LOGIN_INFO_URL";

/// Details passed to a [`RetryObserver`] before each retry.
#[derive(Debug, Clone)]
pub struct RetryAttempt {
    /// The attempt that just failed, counting from 1.
    pub attempt: u32,
    /// HTTP status of the failed attempt, when one was received.
    pub status: Option<u16>,
    /// Transport failure description, when no response arrived.
    pub error: Option<String>,
}

/// Callback invoked between retry attempts.
///
/// Panics raised by the observer are swallowed and never interrupt the
/// retry loop.
pub type RetryObserver = Arc<dyn Fn(&RetryAttempt) + Send + Sync>;

/// Policy governing every HTTP request of one acquisition attempt.
///
/// Immutable once constructed; validated before any network activity.
#[derive(Clone)]
pub struct HttpPolicy {
    /// Per-request timeout in milliseconds. Must be positive.
    pub timeout_ms: u64,
    /// Number of retries after the first attempt, for 429/5xx responses
    /// and transport failures.
    pub retries: u32,
    /// `User-Agent` header sent on every request.
    pub user_agent: String,
    /// Observer invoked between retry attempts.
    pub on_retry: Option<RetryObserver>,
}

impl HttpPolicy {
    /// The per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.timeout_ms == 0 {
            return Err(InvalidInputError::Policy {
                field: "timeout_ms",
                reason: "must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
            user_agent: concat!("bullhorn-auth/", env!("CARGO_PKG_VERSION")).to_string(),
            on_retry: None,
        }
    }
}

// The observer is not Debug; show only whether one is set.
impl fmt::Debug for HttpPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPolicy")
            .field("timeout_ms", &self.timeout_ms)
            .field("retries", &self.retries)
            .field("user_agent", &self.user_agent)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

/// Configuration for one session acquisition.
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    /// Requested session lifetime in days. Must be positive.
    pub ttl_days: u32,
    /// An existing session is reused only while its remaining per-minute
    /// request quota strictly exceeds this threshold.
    pub min_remaining: u32,
    /// Discovery endpoint resolving per-user OAuth and REST base URLs.
    pub login_info_url: ApiUrl,
    /// HTTP policy applied to every request.
    pub http: HttpPolicy,
}

impl AcquireConfig {
    /// Resolve a configuration from an environment snapshot, applying
    /// hardcoded defaults for anything the snapshot does not set.
    ///
    /// # Errors
    ///
    /// Returns an error if a set key carries an unparsable or
    /// out-of-range value. Validation happens here, before any network
    /// activity.
    pub fn resolve(env: &HashMap<String, String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(ttl_days) = env_u32(env, ENV_TTL_DAYS)? {
            config.ttl_days = ttl_days;
        }
        if let Some(min_remaining) = env_u32(env, ENV_MIN_REMAINING)? {
            config.min_remaining = min_remaining;
        }
        if let Some(raw) = non_empty(env, ENV_LOGIN_INFO_URL) {
            config.login_info_url = ApiUrl::new(raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolve a configuration from the process environment.
    pub fn resolve_from_env() -> Result<Self, Error> {
        Self::resolve(&std::env::vars().collect())
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.ttl_days == 0 {
            return Err(InvalidInputError::Policy {
                field: "ttl_days",
                reason: "must be positive".to_string(),
            }
            .into());
        }
        self.http.validate()
    }
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            ttl_days: DEFAULT_TTL_DAYS,
            min_remaining: DEFAULT_MIN_REMAINING,
            login_info_url: ApiUrl::new(DEFAULT_LOGIN_INFO_URL)
                .expect("default login info URL is valid"),
            http: HttpPolicy::default(),
        }
    }
}

fn non_empty<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn env_u32(env: &HashMap<String, String>, key: &str) -> Result<Option<u32>, Error> {
    match non_empty(env, key) {
        None => Ok(None),
        Some(raw) => raw.parse::<u32>().map(Some).map_err(|_| {
            InvalidInputError::EnvVar {
                key: key.to_string(),
                reason: "expected an unsigned integer".to_string(),
            }
            .into()
        }),
    }
}
