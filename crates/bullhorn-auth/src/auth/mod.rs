//! Authentication types and session acquisition.
//!
//! This module provides the credential and token primitives plus the
//! ordered-fallback engine that turns them into a REST session.

mod credentials;
mod session;
mod tokens;

pub use credentials::Credentials;
pub use session::{AcquireInput, AcquireMethod, RestSession};
pub use tokens::{AccessToken, RefreshToken, RestToken, TokenBundle};
