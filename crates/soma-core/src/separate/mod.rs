//! Blind source separation on stabilized movies.
//!
//! A movie is reshaped into a pixels x time matrix and factorized into k
//! spatial components with matching temporal traces. Four methods share one
//! output type so they can be compared on equal footing.

pub mod fa;
pub mod ica;
pub mod matrix;
pub mod metrics;
pub mod nmf;
pub mod pca;

pub use fa::{decompose_fa, FaOptions};
pub use ica::{decompose_ica, IcaOptions};
pub use matrix::PixelTimeMatrix;
pub use nmf::{decompose_nmf, NmfInit, NmfOptions};
pub use pca::decompose_pca;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SomaError};

use metrics::{spatial_compactness, spatial_sparsity, temporal_roughness};

/// Factorization method identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Pca,
    Ica,
    FactorAnalysis,
    Nmf,
}

impl Method {
    /// Lowercase identifier, safe for file and directory names.
    pub fn slug(&self) -> &'static str {
        match self {
            Method::Pca => "pca",
            Method::Ica => "ica",
            Method::FactorAnalysis => "factor_analysis",
            Method::Nmf => "nmf",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Pca => write!(f, "PCA"),
            Method::Ica => write!(f, "ICA"),
            Method::FactorAnalysis => write!(f, "Factor Analysis"),
            Method::Nmf => write!(f, "NMF"),
        }
    }
}

/// Per-method tuning knobs, all with usable defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposeOptions {
    pub ica: IcaOptions,
    pub fa: FaOptions,
    pub nmf: NmfOptions,
}

/// Result of one factorization: k spatial components (rows are flattened
/// pixel maps) and k temporal traces, plus fit diagnostics.
///
/// The reconstruction is `spatial^T * temporal`, plus the per-pixel mean
/// for methods that center the data first.
#[derive(Clone, Debug)]
pub struct Factorization {
    pub method: Method,
    pub k: usize,
    /// k x pixels.
    pub spatial: DMatrix<f64>,
    /// k x time.
    pub temporal: DMatrix<f64>,
    /// Per-pixel temporal mean removed before fitting, if any.
    pub mean: Option<DVector<f64>>,
    pub rmse: f64,
    pub explained_variance: f64,
    pub iterations: usize,
}

impl Factorization {
    /// Low-rank reconstruction of the input matrix.
    pub fn reconstruction(&self) -> DMatrix<f64> {
        let mut xhat = self.spatial.transpose() * &self.temporal;
        if let Some(mean) = &self.mean {
            for mut col in xhat.column_iter_mut() {
                for (i, v) in col.iter_mut().enumerate() {
                    *v += mean[i];
                }
            }
        }
        xhat
    }
}

/// Quantitative fitness summary of one factorization, serializable for
/// reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MethodMetrics {
    pub method: Method,
    pub k: usize,
    pub rmse: f64,
    pub explained_variance: f64,
    pub spatial_sparsity: f64,
    pub spatial_compactness: f64,
    pub temporal_roughness: f64,
    pub iterations: usize,
}

impl MethodMetrics {
    pub fn from_factorization(fact: &Factorization) -> Self {
        Self {
            method: fact.method,
            k: fact.k,
            rmse: fact.rmse,
            explained_variance: fact.explained_variance,
            spatial_sparsity: spatial_sparsity(&fact.spatial),
            spatial_compactness: spatial_compactness(&fact.spatial),
            temporal_roughness: temporal_roughness(&fact.temporal),
            iterations: fact.iterations,
        }
    }
}

/// One entry of a method comparison.
#[derive(Clone, Debug)]
pub struct MethodComparison {
    pub factorization: Factorization,
    pub metrics: MethodMetrics,
}

/// Factorize the matrix into k components with the chosen method.
pub fn decompose(
    matrix: &PixelTimeMatrix,
    method: Method,
    k: usize,
    opts: &DecomposeOptions,
) -> Result<Factorization> {
    let limit = matrix.pixels().min(matrix.time_points());
    if k == 0 || k > limit {
        return Err(SomaError::Factorization(format!(
            "k = {k} is outside the valid range 1..={limit} for a {} x {} matrix",
            matrix.pixels(),
            matrix.time_points()
        )));
    }

    match method {
        Method::Pca => decompose_pca(matrix, k),
        Method::Ica => decompose_ica(matrix, k, &opts.ica),
        Method::FactorAnalysis => decompose_fa(matrix, k, &opts.fa),
        Method::Nmf => decompose_nmf(matrix, k, &opts.nmf),
    }
}

/// Run several methods at a common k and score each fit.
///
/// A method that fails, for example FastICA hitting its iteration cap, is
/// logged and skipped rather than aborting the rest of the comparison.
pub fn compare_methods(
    matrix: &PixelTimeMatrix,
    methods: &[Method],
    k: usize,
    opts: &DecomposeOptions,
) -> Result<Vec<MethodComparison>> {
    let mut results = Vec::with_capacity(methods.len());
    for &method in methods {
        match decompose(matrix, method, k, opts) {
            Ok(fact) => {
                let metrics = MethodMetrics::from_factorization(&fact);
                results.push(MethodComparison {
                    factorization: fact,
                    metrics,
                });
            }
            Err(err) => {
                warn!(%method, %err, "method failed, excluded from comparison");
            }
        }
    }

    if results.is_empty() {
        return Err(SomaError::Factorization(
            "every method in the comparison failed".into(),
        ));
    }
    Ok(results)
}
