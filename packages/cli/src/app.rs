//! Interactive session state and the export workflow.
//!
//! Holds the loaded configuration, the API client, and the single-flight
//! guard across menu round-trips, and turns a finished fetch into the
//! on-disk artifacts (raw CSV, flat post-processed CSV, activity log).

use std::fs;
use std::fs::File;

use dialoguer::{Confirm, Input};
use indicatif::MultiProgress;
use review_harvest_api::{ApiClient, MAX_PAGE_SIZE};
use review_harvest_export::{
    ActivityLog, ExportLogEntry, FLAT_DELIMITER, FilenameMode, Table, export_filename,
    postprocess_reviews, write_csv,
};
use review_harvest_fetch::engine::{FetchMode, FetchReport};
use review_harvest_fetch::guard::ExportGuard;
use review_harvest_fetch::pipeline::{ExportError, ExportPlan, run_export};
use review_harvest_models::{ExportConfig, ExportKind, ParamKey, QueryParameters, ResolvedConfig};

use crate::explore;
use crate::progress::IndicatifProgress;

type BoxError = Box<dyn std::error::Error>;

const DEFAULT_CONFIG_PATH: &str = "export_config.json";

/// One interactive session: client, guard, and the loaded configuration.
pub struct App {
    client: ApiClient,
    guard: ExportGuard,
    activity_log: ActivityLog,
    config: Option<ResolvedConfig>,
}

impl App {
    /// Builds a session from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API token variable is unset.
    pub fn from_env() -> Result<Self, BoxError> {
        Ok(Self {
            client: ApiClient::from_env()?,
            guard: ExportGuard::new(),
            activity_log: ActivityLog::default_location(),
            config: None,
        })
    }

    /// Fetches and prints the account quota snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn show_quotas(&self) -> Result<(), BoxError> {
        let quotas = self.client.quotas().await?;

        println!("Account quotas:");
        let show = |label: &str, value: &Option<serde_json::Value>| {
            if let Some(value) = value {
                println!("  {label}: {value}");
            }
        };
        show("quota", &quotas.quota);
        show("used volume", &quotas.used_volume);
        show("remaining volume", &quotas.remaining_volume);
        show("end date", &quotas.end_date);

        Ok(())
    }

    /// Builds a filter set interactively from the catalogue endpoints and
    /// makes it the current configuration (standard export, no product
    /// selection yet).
    ///
    /// # Errors
    ///
    /// Returns an error if a catalogue request fails or a prompt is
    /// aborted.
    pub async fn build_filters(&mut self) -> Result<(), BoxError> {
        let filters = explore::build_filters(&self.client).await?;

        println!(
            "Filters applied: brands [{}], {} to {}",
            filters.brands.join(", "),
            filters.start_date,
            filters.end_date,
        );
        self.config = Some(ResolvedConfig {
            filters,
            product_ids: Vec::new(),
            kind: ExportKind::Standard,
        });

        Ok(())
    }

    /// Lists the products matching the current filters and lets the user
    /// pick the ones to export, optionally loading per-product review
    /// counts first.
    ///
    /// # Errors
    ///
    /// Returns an error if no configuration is loaded or a prompt is
    /// aborted.
    pub async fn browse_products(&mut self) -> Result<(), BoxError> {
        let config = self.require_config()?;
        if config.kind == ExportKind::BulkByBrand {
            println!("Bulk exports cover every product of the selected brands.");
            return Ok(());
        }
        let filters = config.filters.clone();

        let mut rows = explore::load_products(&self.client, &filters).await;
        if rows.is_empty() {
            println!("No products match the current filters.");
            return Ok(());
        }
        println!("{} products found", rows.len());

        let with_counts = Confirm::new()
            .with_prompt("Load review counts per product?")
            .default(false)
            .interact()?;
        if with_counts {
            explore::load_review_counts(&self.client, &filters, &mut rows).await;
        }

        let labels: Vec<String> = rows.iter().map(explore::ProductRow::label).collect();
        let picked = dialoguer::MultiSelect::new()
            .with_prompt("Products to export (none = all)")
            .items(&labels)
            .interact()?;
        let selected: Vec<String> = picked
            .into_iter()
            .map(|idx| rows[idx].product.clone())
            .collect();

        if let Some(config) = self.config.as_mut() {
            if selected.is_empty() {
                println!("Keeping all matching products.");
            } else {
                println!("{} products selected", selected.len());
            }
            config.product_ids = selected;
        }

        Ok(())
    }

    /// Loads and validates a configuration file, replacing the current one
    /// only on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load_config(&mut self) -> Result<(), BoxError> {
        let path: String = Input::new()
            .with_prompt("Configuration file")
            .default(DEFAULT_CONFIG_PATH.to_string())
            .interact_text()?;

        let text = fs::read_to_string(&path)?;
        let resolved = ExportConfig::parse(&text)?.resolve()?;

        println!(
            "Loaded {path}: {} export, brands [{}], {} to {}",
            resolved.kind,
            resolved.filters.brands.join(", "),
            resolved.filters.start_date,
            resolved.filters.end_date,
        );
        if resolved.kind == ExportKind::Standard && !resolved.product_ids.is_empty() {
            println!("  {} selected products", resolved.product_ids.len());
        }
        self.config = Some(resolved);

        Ok(())
    }

    /// Writes the current configuration back out as an interchange file.
    ///
    /// # Errors
    ///
    /// Returns an error if no configuration is loaded or the write fails.
    pub fn save_config(&self) -> Result<(), BoxError> {
        let config = self.require_config()?;

        let path: String = Input::new()
            .with_prompt("Write configuration to")
            .default(DEFAULT_CONFIG_PATH.to_string())
            .interact_text()?;

        let document = ExportConfig::from_filters(
            &config.filters,
            Some(&config.product_ids),
            config.kind,
        );
        fs::write(&path, document.to_json_pretty()?)?;
        println!("Wrote {path}");

        Ok(())
    }

    /// Asks the metrics endpoint how many documents the current criteria
    /// match, without fetching any of them.
    ///
    /// # Errors
    ///
    /// Returns an error if no configuration is loaded or the request fails.
    pub async fn estimate_volume(&self) -> Result<(), BoxError> {
        let criteria = self.criteria()?;

        let metrics = self.client.metrics(&criteria).await?;
        println!("{} matching reviews", metrics.nb_docs);

        Ok(())
    }

    /// Runs a capped preview fetch and writes preview artifacts.
    ///
    /// # Errors
    ///
    /// Returns an error if no configuration is loaded, another export is
    /// running, or the session fails with nothing to show.
    pub async fn preview_export(&self, multi: &MultiProgress) -> Result<(), BoxError> {
        let config = self.require_config()?;
        let mode = match config.kind {
            ExportKind::Standard => FetchMode::standard_preview(),
            ExportKind::BulkByBrand => FetchMode::bulk_preview(),
        };
        self.export(mode, multi).await
    }

    /// Runs a full export and writes the complete artifacts plus an
    /// activity log line.
    ///
    /// # Errors
    ///
    /// Returns an error if no configuration is loaded, another export is
    /// running, or the session fails with nothing to show.
    pub async fn full_export(&self, multi: &MultiProgress) -> Result<(), BoxError> {
        self.export(FetchMode::Full, multi).await
    }

    async fn export(&self, mode: FetchMode, multi: &MultiProgress) -> Result<(), BoxError> {
        let config = self.require_config()?;

        let random_seed = prompt_random_seed()?;
        let criteria = with_fetch_controls(self.criteria()?, MAX_PAGE_SIZE, random_seed);
        let plan = ExportPlan {
            criteria: criteria.clone(),
            page_size: MAX_PAGE_SIZE,
            mode,
            random_seed,
        };

        let progress = IndicatifProgress::fetch_bar(multi, "Fetching reviews");
        let outcome = run_export(&self.client, &self.client, &self.guard, &plan, &progress).await;

        let report = match outcome {
            Ok(report) => report,
            // Partial results are still worth writing out.
            Err(ExportError::Aborted(aborted)) if !aborted.partial.documents.is_empty() => {
                log::error!("{aborted}");
                let keep = Confirm::new()
                    .with_prompt(format!(
                        "Keep the {} reviews fetched before the failure?",
                        aborted.partial.documents.len()
                    ))
                    .default(true)
                    .interact()?;
                if !keep {
                    return Err(aborted.into());
                }
                aborted.partial
            }
            Err(e) => return Err(e.into()),
        };

        println!(
            "Fetched {} reviews over {} pages ({} duplicates discarded, stopped: {})",
            report.documents.len(),
            report.pages_fetched,
            report.duplicates_discarded,
            report.reason,
        );
        if report.documents.is_empty() {
            println!("Nothing to write.");
            return Ok(());
        }

        self.write_artifacts(&criteria, &report, mode, config.kind)?;

        Ok(())
    }

    fn write_artifacts(
        &self,
        criteria: &QueryParameters,
        report: &FetchReport,
        mode: FetchMode,
        kind: ExportKind,
    ) -> Result<(), BoxError> {
        let filename_mode = if mode == FetchMode::Full {
            FilenameMode::Complete
        } else {
            FilenameMode::Preview
        };

        let table = Table::from_documents(&report.documents);
        let raw_name = export_filename(criteria, filename_mode, "csv");
        write_csv(&table, b',', File::create(&raw_name)?)?;
        println!("Wrote {raw_name}");

        let flat = postprocess_reviews(&report.documents);
        let flat_name = format!("flat_{raw_name}");
        write_csv(&flat, FLAT_DELIMITER, File::create(&flat_name)?)?;
        println!("Wrote {flat_name}");

        #[cfg(feature = "xlsx")]
        {
            let xlsx_name = export_filename(criteria, filename_mode, "xlsx");
            fs::write(
                &xlsx_name,
                review_harvest_export::xlsx::to_xlsx_bytes(&table, "Reviews")?,
            )?;
            println!("Wrote {xlsx_name}");
        }

        if mode == FetchMode::Full {
            let nb_reviews = u64::try_from(report.documents.len()).unwrap_or(u64::MAX);
            let entry = ExportLogEntry::new(criteria, nb_reviews, kind);
            self.activity_log.record(&entry);
        }

        Ok(())
    }

    /// The wire criteria for the loaded configuration.
    fn criteria(&self) -> Result<QueryParameters, BoxError> {
        let config = self.require_config()?;
        let product_ids = match config.kind {
            ExportKind::Standard if !config.product_ids.is_empty() => {
                Some(config.product_ids.as_slice())
            }
            _ => None,
        };
        Ok(config.filters.to_query_parameters(product_ids))
    }

    fn require_config(&self) -> Result<&ResolvedConfig, BoxError> {
        self.config
            .as_ref()
            .ok_or_else(|| "no configuration loaded (use \"Load configuration\" first)".into())
    }
}

/// Stamps the fetch-control fields onto the wire criteria so the
/// artifacts and the activity log see the same page size and seed the
/// engine uses.
fn with_fetch_controls(
    mut criteria: QueryParameters,
    page_size: u32,
    random_seed: Option<u32>,
) -> QueryParameters {
    criteria.set(ParamKey::Rows, page_size.to_string());
    if let Some(seed) = random_seed {
        criteria.set(ParamKey::Random, seed.to_string());
    }
    criteria
}

fn prompt_random_seed() -> Result<Option<u32>, BoxError> {
    let raw: String = Input::new()
        .with_prompt("Random ordering seed (blank for server order)")
        .allow_empty(true)
        .interact_text()?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(raw.trim().parse::<u32>()?))
}

#[cfg(test)]
mod tests {
    use review_harvest_models::FilterSet;

    use super::*;

    #[test]
    fn fetch_controls_are_stamped_onto_criteria() {
        let filters = FilterSet {
            brands: vec!["Acme".to_owned()],
            ..FilterSet::default()
        };

        let criteria = with_fetch_controls(filters.to_query_parameters(None), 1000, Some(42));
        assert_eq!(criteria.get(ParamKey::Rows), Some("1000"));
        assert_eq!(criteria.get(ParamKey::Random), Some("42"));

        let unseeded = with_fetch_controls(filters.to_query_parameters(None), 500, None);
        assert_eq!(unseeded.get(ParamKey::Rows), Some("500"));
        assert!(unseeded.get(ParamKey::Random).is_none());
    }

    #[test]
    fn log_entry_records_page_size_and_seed() {
        let filters = FilterSet {
            brands: vec!["Acme".to_owned()],
            ..FilterSet::default()
        };
        let criteria = with_fetch_controls(filters.to_query_parameters(None), 1000, Some(42));

        let entry = ExportLogEntry::new(&criteria, 7, ExportKind::Standard);
        assert_eq!(entry.rows, "1000");
        assert_eq!(entry.random_seed, Some(42));
    }
}
