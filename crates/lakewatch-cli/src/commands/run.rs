use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use lakewatch_core::export::GeoTiffExporter;
use lakewatch_core::io::catalog::CatalogStore;
use lakewatch_core::pipeline::config::PipelineConfig;
use lakewatch_core::pipeline::{run_and_export, PipelineStage, ProgressReporter};
use tracing::info;

use super::Preset;
use crate::summary::{print_pipeline_summary, print_run_report};

#[derive(Args)]
pub struct RunArgs {
    /// Scene catalog directory or catalog.json file
    pub catalog: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in config to use when no file is given
    #[arg(long, value_enum, default_value = "landsat5")]
    pub preset: Preset,

    /// Override the cloud-cover threshold (percent)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Directory the export folder is created in
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

/// Drives an indicatif bar from pipeline progress callbacks.
struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.set_length(total_items.unwrap_or(1) as u64);
        self.bar.set_position(0);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, _items_done: usize) {
        self.bar.inc(1);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.bar.length() {
            self.bar.set_position(len);
        }
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config = if let Some(ref config_path) = args.config {
        PipelineConfig::load(config_path)
            .with_context(|| format!("Invalid pipeline config {}", config_path.display()))?
    } else {
        args.preset.config()
    };
    if let Some(threshold) = args.threshold {
        config.cloud_threshold = threshold;
    }

    let store = CatalogStore::open(&args.catalog)
        .with_context(|| format!("Failed to open catalog {}", args.catalog.display()))?;
    let exporter = GeoTiffExporter::new(args.output.clone());

    print_pipeline_summary(&config, &args.catalog, &args.output);

    let bar = ProgressBar::new(1);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { bar: bar.clone() });

    let (report, exports) = run_and_export(&config, &store, &exporter, reporter)?;
    bar.finish_with_message("Done");
    info!(
        composites = report.series.len(),
        exported = exports.receipts.len(),
        "Run finished"
    );

    print_run_report(&report, &exports);

    if !report.is_success() || !exports.is_success() {
        bail!(
            "{} window(s) failed, {} export(s) failed",
            report.failures.len(),
            exports.failures.len()
        );
    }
    Ok(())
}
