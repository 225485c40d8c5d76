use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::motion::CropRect;
use crate::search::SweepReport;
use crate::separate::MethodMetrics;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum PipelineStage {
    Reading,
    Stabilizing,
    WritingMovie,
    Decomposing,
    Exporting,
    Sweeping,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading frames"),
            Self::Stabilizing => write!(f, "Stabilizing"),
            Self::WritingMovie => write!(f, "Writing stabilized movie"),
            Self::Decomposing => write!(f, "Decomposing"),
            Self::Exporting => write!(f, "Exporting components"),
            Self::Sweeping => write!(f, "Searching hyperparameters"),
        }
    }
}

/// What the pipeline produced, serializable as the run report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub stabilized_path: PathBuf,
    pub frames: usize,
    pub crop: CropRect,
    pub metrics: Vec<MethodMetrics>,
    pub sweep: Option<SweepReport>,
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
