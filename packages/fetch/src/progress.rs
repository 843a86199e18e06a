//! Progress reporting trait for fetch sessions.
//!
//! Decouples per-page progress updates from any rendering backend
//! (`indicatif` bars, log-only reporting, or silence). Implementations
//! are provided upstream in crates that choose a rendering strategy.

use std::sync::Arc;

/// Receives one update per fetched page.
///
/// Implementations must be `Send + Sync` to support `Arc`-based sharing
/// across async call sites.
pub trait ProgressCallback: Send + Sync {
    /// Called after each page with the page count so far, the size of the
    /// deduplicated accumulation, and the oracle's expected total.
    fn page_fetched(&self, page: u32, accumulated: u64, expected_total: u64);

    /// Marks the session finished with a final message.
    fn finish(&self, msg: String);
}

/// A no-op [`ProgressCallback`] for call sites and tests that do not need
/// progress reporting.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn page_fetched(&self, _page: u32, _accumulated: u64, _expected_total: u64) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
