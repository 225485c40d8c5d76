/// Minimum frame count to use frame-level Rayon parallelism.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// Epsilon guard for multiplicative-update denominators.
pub const MU_EPSILON: f64 = 1e-12;

/// Default window length for temporal median filtering of offset tracks.
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;

/// Default Gaussian sigma (in frames) for smoothing offset tracks.
pub const DEFAULT_SMOOTHING_SIGMA: f64 = 1.0;

/// Default cap on the offset change between adjacent frames, in pixels.
pub const DEFAULT_MAX_JUMP: i64 = 5;

/// Frames whose intensity variance falls below this are flagged degenerate.
pub const DEFAULT_MIN_FRAME_VARIANCE: f64 = 1e-6;

/// Correlation peaks weaker than this (peak over surface mean) are unreliable.
pub const DEFAULT_MIN_PEAK_CONFIDENCE: f64 = 3.0;

/// Fraction of highest-contrast frames averaged into the initial template.
pub const DEFAULT_TEMPLATE_FRACTION: f64 = 0.2;

/// Default number of template refinement passes.
pub const DEFAULT_TEMPLATE_ITERATIONS: usize = 2;

/// Default iteration cap for NMF multiplicative updates.
pub const DEFAULT_NMF_MAX_ITER: usize = 500;

/// Relative change in reconstruction error below which NMF stops early.
pub const DEFAULT_NMF_TOLERANCE: f64 = 1e-5;

/// Default iteration cap for FastICA.
pub const DEFAULT_ICA_MAX_ITER: usize = 200;

/// Convergence tolerance on the unmixing matrix change for FastICA.
pub const DEFAULT_ICA_TOLERANCE: f64 = 1e-4;

/// Default iteration cap for factor analysis EM.
pub const DEFAULT_FA_MAX_ITER: usize = 200;

/// Log-likelihood change below which factor analysis EM stops.
pub const DEFAULT_FA_TOLERANCE: f64 = 1e-4;

/// Default number of seeded NMF runs per stability estimate.
pub const DEFAULT_STABILITY_RUNS: usize = 5;

/// Stability margin within which a lower reconstruction error wins the sweep.
pub const STABILITY_TIE_TOLERANCE: f64 = 0.02;
