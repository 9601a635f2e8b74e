//! HTTP execution with per-request timeout and bounded retry.
//!
//! A 429 or 5xx response is treated as a transient failure and retried
//! with capped exponential backoff; every other status is handed back to
//! the operation layer to interpret.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::Method;
use tracing::{debug, trace, warn};

use crate::config::{HttpPolicy, RetryAttempt};
use crate::error::{ApiError, Error, TransportError};

use super::endpoints::{RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER};

const BACKOFF_BASE_MS: u64 = 1_000;
const BACKOFF_CAP_MS: u64 = 4_000;

/// HTTP executor shared by all protocol operations of one acquisition.
pub(crate) struct Transport {
    client: reqwest::Client,
    policy: HttpPolicy,
}

impl Transport {
    /// Build an executor for the given policy.
    ///
    /// Redirect following is disabled on the underlying client: the
    /// authorization operation's success signal is the redirect itself.
    pub fn new(policy: HttpPolicy) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(policy.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build HTTP client");

        Self { client, policy }
    }

    /// Start building a request against the shared client.
    pub fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        self.client.request(method, url)
    }

    /// Execute a request, retrying transient failures per the policy.
    ///
    /// Attempts run `retries + 1` times total. Once attempts are
    /// exhausted, the last failure is returned unchanged in kind.
    pub async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, Error> {
        let attempts = self.policy.retries.saturating_add(1);
        let mut attempt = 1u32;

        loop {
            let req = request.try_clone().ok_or_else(|| {
                Error::Transport(TransportError::Http {
                    message: "request body cannot be cloned for retry".to_string(),
                })
            })?;

            match self.attempt(req).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt < attempts => {
                    let (status, error) = describe(&err);
                    warn!(attempt, status = ?status, "transient request failure, retrying");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    self.notify(&RetryAttempt {
                        attempt,
                        status,
                        error,
                    });
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Run a single attempt under the policy timeout.
    async fn attempt(&self, request: reqwest::Request) -> Result<reqwest::Response, Error> {
        let send = self.client.execute(request);
        let response = match tokio::time::timeout(self.policy.timeout(), send).await {
            Err(_) => {
                return Err(TransportError::Timeout {
                    duration_ms: self.policy.timeout_ms,
                }
                .into());
            }
            Ok(Err(err)) => return Err(err.into()),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        trace!(status = %status, "response received");

        if status.as_u16() == 429 || status.is_server_error() {
            // A well-formed response, but treated as a transient failure.
            return Err(Error::Api(retryable_status_error(&response)));
        }

        Ok(response)
    }

    fn notify(&self, info: &RetryAttempt) {
        let Some(observer) = &self.policy.on_retry else {
            return;
        };
        // Observer failures must never interrupt the retry loop.
        if catch_unwind(AssertUnwindSafe(|| observer(info))).is_err() {
            debug!(attempt = info.attempt, "retry observer panicked, ignoring");
        }
    }
}

/// Delay before retrying after the given failed attempt (counting from 1).
///
/// Doubles from one second per attempt, capped at four seconds (reached
/// on the third attempt).
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(2);
    Duration::from_millis((BACKOFF_BASE_MS << exp).min(BACKOFF_CAP_MS))
}

/// Status line and the two rate-limit headers; nothing else is retained.
fn retryable_status_error(response: &reqwest::Response) -> ApiError {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let status = response.status();
    ApiError {
        status: status.as_u16(),
        error: status.canonical_reason().map(str::to_string),
        message: None,
        rate_limit_remaining: header(RATE_LIMIT_REMAINING_HEADER),
        rate_limit_limit: header(RATE_LIMIT_LIMIT_HEADER),
    }
}

fn describe(err: &Error) -> (Option<u16>, Option<String>) {
    match err {
        Error::Api(api) => (Some(api.status), None),
        other => (None, Some(other.to_string())),
    }
}
