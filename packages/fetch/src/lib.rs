#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cursor-based paginated fetch engine for the review harvest toolchain.
//!
//! Walks a remote paged-query endpoint cursor by cursor, deduplicates
//! documents across page boundaries, and stops under a well-defined set of
//! termination conditions ([`engine::StopReason`]). The engine is pure
//! mechanism: the actual HTTP client implements the [`ReviewTransport`] and
//! [`MetricsOracle`] seams, and [`pipeline::run_export`] composes them with
//! the single-flight [`guard::ExportGuard`].

pub mod engine;
pub mod guard;
pub mod pipeline;
pub mod progress;

use async_trait::async_trait;
use review_harvest_models::{QueryParameters, ReviewPage};

/// Errors a page or metrics request can surface.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request itself failed (connection, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {endpoint}")]
    Status {
        /// Response status code.
        status: u16,
        /// The endpoint path that failed (never includes the token).
        endpoint: String,
    },

    /// The response arrived but carried no usable payload.
    #[error("missing payload: {0}")]
    MissingPayload(String),

    /// The response payload did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

/// A paged document query endpoint.
///
/// Treated as unreliable: an absent payload, an empty document list, and a
/// non-advancing cursor are all distinct, valid responses the engine
/// handles individually.
#[async_trait]
pub trait ReviewTransport: Send + Sync {
    /// Fetches one page of documents for the given parameters (which
    /// include the cursor).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request or payload decoding fails.
    async fn fetch_page(&self, params: &QueryParameters) -> Result<ReviewPage, TransportError>;
}

/// The expected-total oracle consulted before a fetch session.
///
/// Must be queried with the same filter criteria as the fetch itself,
/// minus pagination fields, so the count is comparable to the accumulated
/// document total.
#[async_trait]
pub trait MetricsOracle: Send + Sync {
    /// Returns the number of documents the filter criteria match.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the metrics endpoint is unavailable.
    async fn expected_total(&self, params: &QueryParameters) -> Result<u64, TransportError>;
}
