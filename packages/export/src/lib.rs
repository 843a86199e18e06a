#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular export artifacts for harvested review documents.
//!
//! Consumes the finished document collection a fetch session produces and
//! turns it into the on-disk deliverables: a flat [`Table`] view, CSV
//! writers (comma-delimited raw and semicolon-delimited post-processed
//! layouts), descriptive export filenames, the append-only activity log,
//! and an optional `xlsx`-feature Excel writer.

pub mod activity_log;
pub mod filename;
pub mod postprocess;
pub mod sheet;
pub mod table;
#[cfg(feature = "xlsx")]
pub mod xlsx;

pub use activity_log::{ActivityLog, ExportLogEntry, DEFAULT_LOG_PATH};
pub use filename::{export_filename, FilenameMode};
pub use postprocess::postprocess_reviews;
pub use sheet::{to_csv_string, write_csv, FLAT_DELIMITER};
pub use table::Table;

/// Errors producing an export artifact.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// An artifact file could not be created or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A record failed to serialize as delimited text.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// The Excel workbook could not be built.
    #[cfg(feature = "xlsx")]
    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
