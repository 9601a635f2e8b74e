//! Bullhorn wire protocol.
//!
//! This module provides the HTTP transport (timeout, bounded retry) and
//! the six endpoint operations used to obtain a REST session.

mod client;
mod endpoints;
mod transport;

pub(crate) use client::RestClient;
