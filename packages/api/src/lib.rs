#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the ratings-and-reviews REST API.
//!
//! [`client::ApiClient`] covers the catalogue endpoints (categories,
//! brands, countries, sources, markets, attributes, products), the quota
//! and metrics endpoints, and the paged `/reviews` query. It implements
//! the fetch engine's [`review_harvest_fetch::ReviewTransport`] and
//! [`review_harvest_fetch::MetricsOracle`] seams.
//!
//! Every request carries the account token as a query parameter; the token
//! is never written to logs.

pub mod client;
pub mod retry;

pub use client::{
    ApiClient, BASE_URL_ENV, ClientError, DEFAULT_BASE_URL, MAX_PAGE_SIZE, Metrics, Quotas,
    TOKEN_ENV,
};
