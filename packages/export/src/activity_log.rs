use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::Local;
use review_harvest_models::{ExportKind, ParamKey, QueryParameters};
use serde::Serialize;

use crate::ExportError;

/// Default location of the append-only export activity log.
pub const DEFAULT_LOG_PATH: &str = "review_exports_log.csv";

/// One line of export history.
#[derive(Debug, Clone, Serialize)]
pub struct ExportLogEntry {
    pub product: String,
    pub brand: String,
    pub start_date: String,
    pub end_date: String,
    pub country: String,
    pub rows: String,
    pub random_seed: Option<u32>,
    pub nb_reviews: u64,
    pub export_timestamp: String,
    pub export_type: String,
}

impl ExportLogEntry {
    /// Captures the criteria of a finished export, timestamped now.
    #[must_use]
    pub fn new(params: &QueryParameters, nb_reviews: u64, kind: ExportKind) -> Self {
        let field = |key: ParamKey| params.get(key).unwrap_or_default().to_string();
        let product = match params.get(ParamKey::Product) {
            Some(product) if !product.is_empty() => product.to_string(),
            _ if kind == ExportKind::BulkByBrand => "BULK_EXPORT".to_string(),
            _ => String::new(),
        };

        Self {
            product,
            brand: field(ParamKey::Brand),
            start_date: field(ParamKey::StartDate),
            end_date: field(ParamKey::EndDate),
            country: params
                .get(ParamKey::Country)
                .filter(|country| !country.is_empty())
                .unwrap_or("Tous")
                .to_string(),
            rows: field(ParamKey::Rows),
            random_seed: params
                .get(ParamKey::Random)
                .and_then(|seed| seed.parse().ok()),
            nb_reviews,
            export_timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            export_type: kind.to_string(),
        }
    }
}

/// Append-only CSV history of completed exports.
///
/// Logging here is advisory: a failed append must never fail the export
/// that produced the data, so [`record`](Self::record) only warns.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn default_location() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry, writing the header row only on file creation.
    ///
    /// # Errors
    ///
    /// * If the file cannot be opened or the row fails to serialize.
    pub fn append(&self, entry: &ExportLogEntry) -> Result<(), ExportError> {
        let new_file = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(new_file)
            .from_writer(file);
        writer.serialize(entry)?;
        writer.flush()?;

        Ok(())
    }

    /// Best-effort [`append`](Self::append) that downgrades failure to a
    /// warning.
    pub fn record(&self, entry: &ExportLogEntry) {
        match self.append(entry) {
            Ok(()) => log::debug!(
                "logged export of {} reviews to {}",
                entry.nb_reviews,
                self.path.display()
            ),
            Err(e) => log::warn!("failed to append to {}: {e}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(nb_reviews: u64) -> ExportLogEntry {
        let params = QueryParameters::new()
            .with(ParamKey::Brand, "Acme")
            .with(ParamKey::StartDate, "2023-01-01")
            .with(ParamKey::EndDate, "2023-06-30")
            .with(ParamKey::Rows, "500");
        ExportLogEntry::new(&params, nb_reviews, ExportKind::Standard)
    }

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("log.csv"));

        log.append(&entry(10)).unwrap();
        log.append(&entry(20)).unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("product,brand,start_date"));
        assert!(lines[1].contains("Acme"));
        assert!(lines[2].contains("20"));
    }

    #[test]
    fn country_defaults_to_tous() {
        assert_eq!(entry(1).country, "Tous");
    }

    #[test]
    fn bulk_exports_without_products_are_labelled() {
        let params = QueryParameters::new().with(ParamKey::Brand, "Acme");
        let entry = ExportLogEntry::new(&params, 5, ExportKind::BulkByBrand);
        assert_eq!(entry.product, "BULK_EXPORT");
        assert_eq!(entry.export_type, "BULK_BY_BRAND");
    }

    #[test]
    fn record_swallows_io_errors() {
        let log = ActivityLog::new("/nonexistent-dir/log.csv");
        log.record(&entry(1));
    }
}
