//! Diff command implementation.

use crate::settings::{self, Credentials, Settings};
use shopsync_adapters::{CatalogAdapter, CcvAdapter};
use shopsync_client::{ClientConfig, ShopClient};
use shopsync_engine::{
    normalize, render_text, to_json, AttributeOrdering, DiffEngine, DiffTree, SyncConfig,
    SyncEngine, SyncReport,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Options of the diff command.
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// `.env` file to seed the environment from.
    pub env_file: Option<PathBuf>,
    /// Apply the diff after printing it.
    pub sync: bool,
    /// Keep syncing past per-entity failures.
    pub continue_on_failure: bool,
    /// Write the diff as JSON to this file.
    pub output: Option<PathBuf>,
}

/// Builds the sync configuration from settings and flags.
pub fn sync_config(settings: &Settings, options: &DiffOptions) -> SyncConfig {
    let config = SyncConfig::new().with_workers(settings.sync.workers);
    if options.continue_on_failure || settings.sync.continue_on_failure {
        config.continue_on_failure()
    } else {
        config
    }
}

/// Builds a diff engine that orders colour and size options.
pub fn diff_engine(settings: &Settings) -> DiffEngine {
    let ordering = AttributeOrdering::new()
        .with_colors(
            normalize(&settings.ccv_shop.color_category),
            settings.mapping.color_reference(),
        )
        .with_sizing(normalize(&settings.ccv_shop.sizing_category));
    DiffEngine::new().with_ordering(ordering)
}

fn write_json(path: &Path, tree: &DiffTree) -> Result<(), Box<dyn std::error::Error>> {
    let text = serde_json::to_string_pretty(&to_json(tree))?;
    std::fs::write(path, text)?;
    info!(path = %path.display(), "diff written");
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!();
    println!("{report}");
    for failure in &report.failures {
        println!("  {failure}");
    }
}

/// Runs the diff command.
pub async fn run(options: DiffOptions) -> Result<(), Box<dyn std::error::Error>> {
    settings::load_env_file(options.env_file.as_deref())?;
    let settings_path = settings::settings_path();
    let settings = Settings::load(&settings_path)?;
    let credentials = Credentials::from_env(&settings)?;
    info!(settings = %settings_path.display(), url = %credentials.url, "starting");

    let client = ShopClient::from_config(ClientConfig::new(
        &credentials.url,
        &credentials.public_key,
        &credentials.secret_key,
    ))?;
    let workers = settings.sync.workers;
    let dest = CcvAdapter::new(client, settings.ccv_shop.clone()).with_workers(workers);
    let source = CatalogAdapter::new(
        settings.catalog.clone(),
        settings.ccv_shop.clone(),
        settings.mapping.clone(),
    )
    .with_workers(workers);

    let engine = SyncEngine::new(source, dest, sync_config(&settings, &options))
        .with_diff_engine(diff_engine(&settings));
    engine.load().await?;

    let tree = engine.diff()?;
    println!("{}", render_text(&tree));
    println!("{}", tree.summary());
    if let Some(path) = &options.output {
        write_json(path, &tree)?;
    }

    if !options.sync || !tree.has_changes() {
        return Ok(());
    }
    let report = engine.sync(&tree).await?;
    print_report(&report);
    if report.is_success() {
        Ok(())
    } else {
        Err(format!("sync finished with {} failures", report.failed()).into())
    }
}
