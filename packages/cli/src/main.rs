#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive CLI front end for harvesting reviews.
//!
//! Presents a menu over the review API: inspect quotas, build filters from
//! the catalogue endpoints, browse matching products, load and save filter
//! configurations, size an export via the metrics endpoint, and run
//! preview or full exports that land as CSV artifacts on disk.
//!
//! Uses `indicatif-log-bridge` (via [`progress::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines and
//! progress bars never fight for the terminal.

mod app;
mod explore;
mod progress;

use dialoguer::Select;

use crate::app::App;

/// Top-level menu actions.
enum Action {
    ShowQuotas,
    BuildFilters,
    BrowseProducts,
    LoadConfig,
    SaveConfig,
    EstimateVolume,
    PreviewExport,
    FullExport,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::ShowQuotas,
        Self::BuildFilters,
        Self::BrowseProducts,
        Self::LoadConfig,
        Self::SaveConfig,
        Self::EstimateVolume,
        Self::PreviewExport,
        Self::FullExport,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::ShowQuotas => "Show account quotas",
            Self::BuildFilters => "Build filters",
            Self::BrowseProducts => "Browse products",
            Self::LoadConfig => "Load configuration",
            Self::SaveConfig => "Save configuration",
            Self::EstimateVolume => "Estimate export volume",
            Self::PreviewExport => "Preview export",
            Self::FullExport => "Full export",
            Self::Quit => "Quit",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();

    println!("Review Harvest");
    println!();

    let mut app = App::from_env()?;
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        let outcome = match Action::ALL[idx] {
            Action::ShowQuotas => app.show_quotas().await,
            Action::BuildFilters => app.build_filters().await,
            Action::BrowseProducts => app.browse_products().await,
            Action::LoadConfig => app.load_config(),
            Action::SaveConfig => app.save_config(),
            Action::EstimateVolume => app.estimate_volume().await,
            Action::PreviewExport => app.preview_export(&multi).await,
            Action::FullExport => app.full_export(&multi).await,
            Action::Quit => break,
        };

        if let Err(e) = outcome {
            log::error!("{e}");
        }
        println!();
    }

    Ok(())
}
