use crate::composite::Composite;
use crate::window::DateWindow;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Compositing,
    Exporting,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validating => write!(f, "Validating config"),
            Self::Compositing => write!(f, "Compositing windows"),
            Self::Exporting => write!(f, "Exporting composites"),
        }
    }
}

/// Composites of one run, in window order.
pub type CompositeSeries = Vec<Composite>;

/// A window whose composite could not be built.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowFailure {
    pub window: DateWindow,
    /// Name the composite would have carried.
    pub name: String,
    pub error: String,
}

/// Outcome of a run: the series plus every per-window failure.
#[derive(Clone, Debug, Default)]
pub struct RunReport {
    pub series: CompositeSeries,
    pub failures: Vec<WindowFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Composites built from zero contributing scenes or all-no-data pixels.
    pub fn empty_composites(&self) -> impl Iterator<Item = &Composite> {
        self.series.iter().filter(|c| c.is_empty())
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., window count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
