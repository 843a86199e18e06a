#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared data model for the review harvest toolchain.
//!
//! Defines the user-facing [`FilterSet`], its wire-ready flattening
//! [`QueryParameters`], the opaque review [`Document`], and the JSON
//! configuration interchange format [`ExportConfig`].

pub mod config;
pub mod document;
pub mod filter;
pub mod query;

pub use config::{ConfigError, ExportConfig, ExportKind, ResolvedConfig};
pub use document::{Document, ReviewPage};
pub use filter::FilterSet;
pub use query::{ParamKey, QueryParameters};
