//! `indicatif`-backed progress bar implementation.
//!
//! Wraps [`indicatif::ProgressBar`] behind the [`ProgressCallback`] trait
//! so that progress reporting stays decoupled from the rendering backend,
//! and provides [`init_logger`] which routes `log` output through
//! `indicatif-log-bridge` so log lines and bars never fight for the
//! terminal.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use review_harvest_fetch::progress::ProgressCallback;

/// An `indicatif` [`ProgressBar`] that implements [`ProgressCallback`].
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Style to switch to once the first page reveals the expected total.
    bar_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Creates a progress bar for a fetch session. Starts as a spinner and
    /// transitions to a full bar with percentage/ETA on the first page
    /// update, once the expected total is known.
    #[must_use]
    pub fn fetch_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let bar_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.cyan/dim} {pos}/{len} {percent}% [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Arc::new(Self { bar, bar_style })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn page_fetched(&self, page: u32, accumulated: u64, expected_total: u64) {
        if self.bar.length() != Some(expected_total) {
            self.bar.set_length(expected_total);
            // Switch from spinner to bar style now that we know the total.
            self.bar.set_style(self.bar_style.clone());
        }
        self.bar.set_position(accumulated);
        self.bar.set_message(format!("page {page}"));
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    // Build the pretty-env-logger logger manually so we can wrap it.
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}
