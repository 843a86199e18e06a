//! The cursor-based pagination state machine.
//!
//! One [`fetch_all`] call drives one fetch session: request a page, fold
//! its documents into the deduplicated accumulation, evaluate the
//! termination conditions in their fixed precedence order, advance the
//! cursor, repeat. The loop is bounded by the mode's iteration ceiling even
//! against a misbehaving server.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use review_harvest_models::{Document, ParamKey, QueryParameters};
use strum_macros::{AsRefStr, Display};

use crate::progress::ProgressCallback;
use crate::{ReviewTransport, TransportError};

/// Cursor token denoting the start of a result set.
pub const CURSOR_START: &str = "*";

/// Preview document cap for the manual/standard export call site.
pub const STANDARD_PREVIEW_CAP: u64 = 50;

/// Preview document cap for the bulk export call site.
pub const BULK_PREVIEW_CAP: u64 = 100;

/// Iteration ceiling for preview sessions.
const PREVIEW_MAX_ITERATIONS: u32 = 10;

/// Iteration ceiling for full exports. Generous safety bound; a full
/// export normally stops on `COMPLETE` or cursor exhaustion well before.
const FULL_MAX_ITERATIONS: u32 = 1000;

/// Courtesy pause toward the remote service: sleep this long after every
/// [`PAGES_PER_PAUSE`]th page. Not a correctness mechanism.
const INTER_PAGE_PAUSE: Duration = Duration::from_millis(100);
const PAGES_PER_PAUSE: u32 = 5;

/// Whether a session samples the result set or drains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Capped, fast fetch used to sample results before committing.
    Preview {
        /// Hard cap on accumulated documents.
        max_docs: u64,
    },
    /// Capped only by the expected total and the safety bound.
    Full,
}

impl FetchMode {
    /// Preview mode with the manual-export cap.
    #[must_use]
    pub const fn standard_preview() -> Self {
        Self::Preview {
            max_docs: STANDARD_PREVIEW_CAP,
        }
    }

    /// Preview mode with the bulk-export cap.
    #[must_use]
    pub const fn bulk_preview() -> Self {
        Self::Preview {
            max_docs: BULK_PREVIEW_CAP,
        }
    }

    /// Maximum number of page requests a session in this mode may issue.
    #[must_use]
    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::Preview { .. } => PREVIEW_MAX_ITERATIONS,
            Self::Full => FULL_MAX_ITERATIONS,
        }
    }

    /// The preview cap, if this is a preview mode.
    #[must_use]
    pub const fn preview_cap(self) -> Option<u64> {
        match self {
            Self::Preview { max_docs } => Some(max_docs),
            Self::Full => None,
        }
    }
}

/// Why a fetch session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    /// The oracle reported zero matching documents; no page was requested.
    NoData,
    /// The accumulation reached the expected total.
    Complete,
    /// The accumulation reached the preview cap.
    PreviewLimit,
    /// A page arrived with no documents.
    EmptyPage,
    /// The server offered no next cursor.
    NoNextCursor,
    /// The server returned the request's own cursor — no forward progress.
    CursorStalled,
    /// The iteration safety bound was hit. Abnormal but handled; distinct
    /// from [`Self::Complete`].
    SafetyLimit,
    /// A page request failed mid-session; the report is partial.
    TransportFailed,
}

/// Tuning for one fetch session.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Page size (`rows`). Positive; the caller clamps it to the API
    /// ceiling before handing it to the engine.
    pub page_size: u32,
    /// Preview or full mode.
    pub mode: FetchMode,
    /// Expected total from the metrics oracle. Zero short-circuits the
    /// session to [`StopReason::NoData`] without any transport call.
    pub expected_total: u64,
    /// Optional seed forwarded to the server for stable random ordering.
    /// Does not affect engine logic.
    pub random_seed: Option<u32>,
    /// Courtesy pause between page batches. `None` disables it (tests).
    pub pause: Option<Duration>,
}

impl EngineOptions {
    /// Options with the default courtesy pause.
    #[must_use]
    pub const fn new(page_size: u32, mode: FetchMode, expected_total: u64) -> Self {
        Self {
            page_size,
            mode,
            expected_total,
            random_seed: None,
            pause: Some(INTER_PAGE_PAUSE),
        }
    }
}

/// The finished result of one fetch session.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// Deduplicated documents in first-seen order across pages.
    pub documents: Vec<Document>,
    /// Number of page requests issued.
    pub pages_fetched: u32,
    /// Documents discarded because their id was already accumulated.
    pub duplicates_discarded: u64,
    /// Why the session stopped.
    pub reason: StopReason,
}

impl FetchReport {
    const fn new(reason: StopReason) -> Self {
        Self {
            documents: Vec::new(),
            pages_fetched: 0,
            duplicates_discarded: 0,
            reason,
        }
    }
}

/// A page request failed mid-session.
///
/// Not retried by the engine; carries everything accumulated before the
/// failure so the caller can decide whether a partial result is
/// acceptable.
#[derive(Debug, thiserror::Error)]
#[error("page {page} fetch failed: {source}")]
pub struct FetchAborted {
    /// The 1-based page number that failed.
    pub page: u32,
    /// The underlying transport failure.
    #[source]
    pub source: TransportError,
    /// Everything accumulated before the failure, with reason
    /// [`StopReason::TransportFailed`].
    pub partial: FetchReport,
}

/// Runs one fetch session to completion.
///
/// `template` carries the filter criteria only; the engine adds the
/// `rows`, `random`, and `cursorMark` fetch-control parameters itself.
/// `progress` is invoked once per fetched page, and its `finish` hook is
/// called exactly once on every exit path, including failure.
///
/// # Errors
///
/// Returns [`FetchAborted`] with partial results if a page request fails.
pub async fn fetch_all(
    transport: &(impl ReviewTransport + ?Sized),
    template: &QueryParameters,
    options: &EngineOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<FetchReport, FetchAborted> {
    if options.expected_total == 0 {
        log::info!("No documents match the filter criteria, skipping fetch");
        progress.finish("No matching documents".to_owned());
        return Ok(FetchReport::new(StopReason::NoData));
    }

    let mut base = template.clone();
    base.set(ParamKey::Rows, options.page_size.to_string());
    if let Some(seed) = options.random_seed {
        base.set(ParamKey::Random, seed.to_string());
    }

    let max_iterations = options.mode.max_iterations();
    let mut cursor = CURSOR_START.to_owned();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut documents: Vec<Document> = Vec::new();
    let mut pages_fetched: u32 = 0;
    let mut duplicates_discarded: u64 = 0;

    let reason = loop {
        let params = base.with_cursor(&cursor);
        pages_fetched += 1;

        let page = match transport.fetch_page(&params).await {
            Ok(page) => page,
            Err(source) => {
                log::error!("Page {pages_fetched} fetch failed: {source}");
                progress.finish(format!("Failed on page {pages_fetched}"));
                return Err(FetchAborted {
                    page: pages_fetched,
                    source,
                    partial: FetchReport {
                        documents,
                        pages_fetched,
                        duplicates_discarded,
                        reason: StopReason::TransportFailed,
                    },
                });
            }
        };

        if page.documents.is_empty() {
            log::info!("Page {pages_fetched} is empty, stopping");
            progress.page_fetched(pages_fetched, documents.len() as u64, options.expected_total);
            break StopReason::EmptyPage;
        }

        let mut page_duplicates: u64 = 0;
        for document in page.documents {
            match document.id() {
                Some(id) if seen_ids.contains(id) => page_duplicates += 1,
                Some(id) => {
                    seen_ids.insert(id.to_owned());
                    documents.push(document);
                }
                // No usable id: dedup is impossible, always include.
                None => documents.push(document),
            }
        }
        duplicates_discarded += page_duplicates;
        if page_duplicates > 0 {
            log::warn!("Page {pages_fetched}: {page_duplicates} duplicate documents discarded");
        }

        let accumulated = documents.len() as u64;
        log::debug!(
            "Page {pages_fetched}: accumulated {accumulated}/{} ({duplicates_discarded} dups so far)",
            options.expected_total
        );
        progress.page_fetched(pages_fetched, accumulated, options.expected_total);

        let next_cursor = page.next_cursor.as_deref().filter(|next| !next.is_empty());

        // Termination conditions, in precedence order.
        if accumulated >= options.expected_total {
            break StopReason::Complete;
        }
        if let Some(cap) = options.mode.preview_cap()
            && accumulated >= cap
        {
            break StopReason::PreviewLimit;
        }
        let Some(next_cursor) = next_cursor else {
            break StopReason::NoNextCursor;
        };
        if next_cursor == cursor {
            break StopReason::CursorStalled;
        }
        if pages_fetched >= max_iterations {
            break StopReason::SafetyLimit;
        }

        cursor = next_cursor.to_owned();

        if let Some(pause) = options.pause
            && pages_fetched % PAGES_PER_PAUSE == 0
        {
            tokio::time::sleep(pause).await;
        }
    };

    log::info!(
        "Fetch done: {reason}, {} documents over {pages_fetched} pages, \
         {duplicates_discarded} duplicates discarded",
        documents.len()
    );
    progress.finish(format!(
        "{} documents over {pages_fetched} pages",
        documents.len()
    ));

    Ok(FetchReport {
        documents,
        pages_fetched,
        duplicates_discarded,
        reason,
    })
}
