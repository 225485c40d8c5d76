use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_MAX_JUMP, DEFAULT_MEDIAN_WINDOW, DEFAULT_MIN_FRAME_VARIANCE,
    DEFAULT_MIN_PEAK_CONFIDENCE, DEFAULT_SMOOTHING_SIGMA, DEFAULT_STABILITY_RUNS,
    DEFAULT_TEMPLATE_FRACTION, DEFAULT_TEMPLATE_ITERATIONS,
};
use crate::separate::{DecomposeOptions, Method};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub separation: SeparationConfig,
    pub sweep: Option<SweepConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Fraction of highest-contrast frames averaged into the template.
    pub template_fraction: f64,
    /// Refinement passes when building the template.
    pub template_iterations: usize,
    /// Window of the median filter applied to the offset tracks.
    pub median_window: usize,
    /// Sigma of the Gaussian applied after the median filter.
    pub smoothing_sigma: f64,
    /// Largest allowed frame-to-frame offset change, in pixels.
    pub max_jump: i64,
    /// Frames with intensity variance below this are flagged degenerate.
    pub min_frame_variance: f64,
    /// Correlation peaks weaker than this are flagged unreliable.
    pub min_peak_confidence: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            template_fraction: DEFAULT_TEMPLATE_FRACTION,
            template_iterations: DEFAULT_TEMPLATE_ITERATIONS,
            median_window: DEFAULT_MEDIAN_WINDOW,
            smoothing_sigma: DEFAULT_SMOOTHING_SIGMA,
            max_jump: DEFAULT_MAX_JUMP,
            min_frame_variance: DEFAULT_MIN_FRAME_VARIANCE,
            min_peak_confidence: DEFAULT_MIN_PEAK_CONFIDENCE,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationConfig {
    /// Methods to run and compare.
    pub methods: Vec<Method>,
    /// Number of components per method.
    pub k: usize,
    /// Divide each pixel by its temporal standard deviation first.
    pub normalize_variance: bool,
    pub options: DecomposeOptions,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            methods: vec![
                Method::Pca,
                Method::Ica,
                Method::FactorAnalysis,
                Method::Nmf,
            ],
            k: 8,
            normalize_variance: false,
            options: DecomposeOptions::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Component counts to evaluate.
    pub ranks: Vec<usize>,
    /// L1 regularization strengths to evaluate.
    pub alphas: Vec<f64>,
    /// Seeded NMF runs per grid cell.
    pub runs: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            ranks: vec![4, 8, 12, 16],
            alphas: vec![0.0, 0.01, 0.1],
            runs: DEFAULT_STABILITY_RUNS,
        }
    }
}
