//! Thin typed client for the Comet.ml experiment-tracking REST v1 API.
//!
//! Fetchers in [`client`] are stateless one-shot GETs; [`metrics`] and
//! [`query`] reshape the responses into columnar frames and ordered
//! groupings.

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod query;

pub use client::CometClient;
pub use error::{CometError, Result};
