//! bullhorn-auth - Session acquisition for the Bullhorn REST API.
//!
//! This library obtains a short-lived `BhRestToken` session on behalf of a
//! server-side caller, choosing the cheapest authentication path that
//! works: an existing session is validated first, then a refresh-token
//! exchange, then a bare access token, and finally a full password-grant
//! login. The result records which path succeeded so callers can persist
//! the returned tokens for the next run.
//!
//! # Example
//!
//! ```no_run
//! use bullhorn_auth::{AcquireConfig, AcquireInput, Credentials, RestSession, TokenBundle};
//!
//! # async fn example() -> Result<(), bullhorn_auth::Error> {
//! let input = AcquireInput {
//!     credentials: Some(Credentials::new(
//!         "client-id",
//!         "client-secret",
//!         "api.user",
//!         "password",
//!     )),
//!     tokens: TokenBundle::default(),
//! };
//!
//! let session = RestSession::acquire(input, &AcquireConfig::default()).await?;
//! println!("REST base: {} (via {})", session.rest_url, session.method);
//! # Ok(())
//! # }
//! ```
//!
//! Credentials and token snapshots can also be pulled straight from the
//! environment with [`AcquireInput::from_env`], and the numeric policy
//! knobs with [`AcquireConfig::resolve_from_env`].

pub mod auth;
pub mod config;
pub mod error;
pub mod rest;
pub mod types;

// Re-export primary types at crate root for convenience
pub use auth::{
    AccessToken, AcquireInput, AcquireMethod, Credentials, RefreshToken, RestSession, RestToken,
    TokenBundle,
};
pub use config::{AcquireConfig, HttpPolicy, RetryAttempt, RetryObserver, DEFAULT_LOGIN_INFO_URL};
pub use error::Error;
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
