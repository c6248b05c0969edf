use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::composite::{Composite, Compositor};
use crate::error::Result;
use crate::export::{ExportAdapter, ExportReport};
use crate::naming::composite_name;
use crate::region::StudyRegion;
use crate::store::{SceneQuery, SceneStore};
use crate::window::{generate_windows, DateWindow};

use super::config::PipelineConfig;
use super::types::{NoOpReporter, PipelineStage, ProgressReporter, RunReport, WindowFailure};

/// Query, composite and name a single window.
fn process_window(
    config: &PipelineConfig,
    store: &dyn SceneStore,
    region: &StudyRegion,
    compositor: &Compositor,
    window: &DateWindow,
    name: String,
) -> Result<Composite> {
    let query = SceneQuery {
        region,
        window: *window,
        cloud_threshold: config.cloud_threshold,
        cloud_attribute: config.cloud_attribute(),
    };
    let scenes = store.query(&query)?;
    info!(window = %window, scenes = scenes.len(), name = %name, "Compositing window");

    let composite = compositor.composite(window, &scenes)?.named(name);
    if composite.is_empty() {
        warn!(name = %composite.name, "Composite has no valid pixels");
    }
    Ok(composite)
}

/// Run the compositing pipeline with a thread-safe progress reporter.
///
/// Configuration errors abort before any window is touched. Failures of
/// individual windows are collected in the report; the other windows still
/// run.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    store: &dyn SceneStore,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<RunReport> {
    reporter.begin_stage(PipelineStage::Validating, None);
    config.validate()?;
    let region = config.study_region()?;
    let windows = generate_windows(config.start, config.window_count)?;
    let compositor = Compositor::new(&config.sensor, config.mode.clone(), &region, config.grid)?;
    reporter.finish_stage();

    info!(
        windows = windows.len(),
        sensor = %config.sensor,
        mode = %compositor.mode(),
        "Starting composite run"
    );

    reporter.begin_stage(PipelineStage::Compositing, Some(windows.len()));
    let counter = AtomicUsize::new(0);
    // Windows share no state; collect keeps window order.
    let outcomes: Vec<(DateWindow, String, Result<Composite>)> = windows
        .par_iter()
        .map(|window| {
            let name = composite_name(&config.naming.area, window, &config.naming.sensor);
            let result =
                process_window(config, store, &region, &compositor, window, name.clone());
            let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
            reporter.advance(done);
            (*window, name, result)
        })
        .collect();
    reporter.finish_stage();

    let mut report = RunReport::default();
    for (window, name, result) in outcomes {
        match result {
            Ok(composite) => report.series.push(composite),
            Err(e) => {
                warn!(window = %window, name = %name, error = %e, "Window failed");
                report.failures.push(WindowFailure {
                    window,
                    name,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        composites = report.series.len(),
        failed = report.failures.len(),
        "Composite run complete"
    );
    Ok(report)
}

/// Run the compositing pipeline without progress reporting.
pub fn run_pipeline(config: &PipelineConfig, store: &dyn SceneStore) -> Result<RunReport> {
    run_pipeline_reported(config, store, Arc::new(NoOpReporter))
}

/// Run the pipeline, then hand every composite to `exporter`.
pub fn run_and_export(
    config: &PipelineConfig,
    store: &dyn SceneStore,
    exporter: &dyn ExportAdapter,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<(RunReport, ExportReport)> {
    let report = run_pipeline_reported(config, store, reporter.clone())?;

    reporter.begin_stage(PipelineStage::Exporting, Some(report.series.len()));
    let mut exports = ExportReport::default();
    for (i, composite) in report.series.iter().enumerate() {
        exports.record(composite, exporter.export(composite, &config.export));
        reporter.advance(i + 1);
    }
    reporter.finish_stage();

    Ok((report, exports))
}
