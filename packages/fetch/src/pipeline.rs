//! Export session orchestration: guard, oracle, engine.
//!
//! [`run_export`] is the one entry point a front end calls: it claims the
//! single-flight guard, sizes the session via the metrics oracle, and runs
//! the pagination engine. The guard is released on every exit path via the
//! RAII permit.

use std::sync::Arc;

use review_harvest_models::QueryParameters;

use crate::engine::{self, EngineOptions, FetchAborted, FetchMode, FetchReport};
use crate::guard::{ExportGuard, GuardBusy};
use crate::progress::ProgressCallback;
use crate::{MetricsOracle, ReviewTransport, TransportError};

/// Everything needed to run one export session.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    /// Filter criteria only; the engine adds the fetch-control fields.
    pub criteria: QueryParameters,
    /// Page size, already clamped to the API ceiling by the caller.
    pub page_size: u32,
    /// Preview or full mode.
    pub mode: FetchMode,
    /// Optional stable-random-ordering seed.
    pub random_seed: Option<u32>,
}

/// Errors an export session can end with.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Another session already holds the guard. Nothing was mutated.
    #[error(transparent)]
    Busy(#[from] GuardBusy),

    /// The metrics oracle failed; a full export cannot be sized.
    #[error("metrics unavailable: {0}")]
    Metrics(#[source] TransportError),

    /// A page request failed mid-session (partial results inside).
    #[error(transparent)]
    Aborted(#[from] FetchAborted),
}

/// Runs one export session end to end.
///
/// The oracle is consulted with the same criteria the fetch uses, minus
/// pagination fields. If it fails, a full export stops there
/// ([`ExportError::Metrics`]) while a preview proceeds best-effort with
/// its own cap as the working total.
///
/// # Errors
///
/// Returns [`ExportError`] if the guard is busy, the oracle is required
/// but unavailable, or a page request fails.
pub async fn run_export(
    transport: &(impl ReviewTransport + ?Sized),
    oracle: &(impl MetricsOracle + ?Sized),
    guard: &ExportGuard,
    plan: &ExportPlan,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<FetchReport, ExportError> {
    let _permit = guard.try_acquire()?;

    let expected_total = match oracle.expected_total(&plan.criteria.without_pagination()).await {
        Ok(total) => total,
        Err(source) => match plan.mode {
            FetchMode::Full => return Err(ExportError::Metrics(source)),
            FetchMode::Preview { max_docs } => {
                log::warn!("Metrics unavailable ({source}), previewing up to {max_docs} documents");
                max_docs
            }
        },
    };

    let options = EngineOptions {
        random_seed: plan.random_seed,
        ..EngineOptions::new(plan.page_size, plan.mode, expected_total)
    };

    let report = engine::fetch_all(transport, &plan.criteria, &options, progress).await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use review_harvest_models::{Document, ReviewPage};
    use serde_json::json;

    use super::*;
    use crate::engine::StopReason;
    use crate::progress::null_progress;

    struct OnePageTransport {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ReviewTransport for OnePageTransport {
        async fn fetch_page(
            &self,
            _params: &QueryParameters,
        ) -> Result<ReviewPage, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ReviewPage {
                documents: vec![Document::new(json!({"id": "r-1"}))],
                next_cursor: None,
            })
        }
    }

    struct FixedOracle(Result<u64, ()>);

    #[async_trait]
    impl MetricsOracle for FixedOracle {
        async fn expected_total(
            &self,
            _params: &QueryParameters,
        ) -> Result<u64, TransportError> {
            self.0
                .map_err(|()| TransportError::MissingPayload("metrics down".to_owned()))
        }
    }

    fn plan(mode: FetchMode) -> ExportPlan {
        ExportPlan {
            criteria: QueryParameters::new(),
            page_size: 100,
            mode,
            random_seed: None,
        }
    }

    #[tokio::test]
    async fn busy_guard_rejects_without_any_transport_call() {
        let transport = OnePageTransport {
            calls: AtomicU32::new(0),
        };
        let guard = ExportGuard::new();
        let _held = guard.try_acquire().unwrap();

        let err = run_export(
            &transport,
            &FixedOracle(Ok(10)),
            &guard,
            &plan(FetchMode::Full),
            &null_progress(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ExportError::Busy(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn metrics_failure_aborts_a_full_export() {
        let transport = OnePageTransport {
            calls: AtomicU32::new(0),
        };
        let guard = ExportGuard::new();

        let err = run_export(
            &transport,
            &FixedOracle(Err(())),
            &guard,
            &plan(FetchMode::Full),
            &null_progress(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ExportError::Metrics(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        // Guard released despite the early exit.
        assert!(!guard.is_held());
    }

    #[tokio::test]
    async fn preview_proceeds_best_effort_without_metrics() {
        let transport = OnePageTransport {
            calls: AtomicU32::new(0),
        };
        let guard = ExportGuard::new();

        let report = run_export(
            &transport,
            &FixedOracle(Err(())),
            &guard,
            &plan(FetchMode::bulk_preview()),
            &null_progress(),
        )
        .await
        .unwrap();

        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.reason, StopReason::NoNextCursor);
        assert!(!guard.is_held());
    }

    #[tokio::test]
    async fn guard_is_reusable_after_a_successful_run() {
        let transport = OnePageTransport {
            calls: AtomicU32::new(0),
        };
        let guard = ExportGuard::new();
        let plan = plan(FetchMode::Full);

        for _ in 0..2 {
            run_export(
                &transport,
                &FixedOracle(Ok(1)),
                &guard,
                &plan,
                &null_progress(),
            )
            .await
            .unwrap();
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
