use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FA_MAX_ITER, DEFAULT_FA_TOLERANCE};
use crate::error::{Result, SomaError};

use super::matrix::PixelTimeMatrix;
use super::metrics::{explained_variance_fraction, reconstruction_rmse};
use super::{Factorization, Method};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FaOptions {
    pub max_iter: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for FaOptions {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_FA_MAX_ITER,
            tolerance: DEFAULT_FA_TOLERANCE,
            seed: 0,
        }
    }
}

/// Factor analysis fit with expectation-maximization.
///
/// Each time point is modeled as loadings times k latent factors plus
/// per-pixel Gaussian noise with diagonal covariance. The loadings become
/// the spatial components and the posterior factor means the temporal
/// components. EM stops at the iteration cap or when the log-likelihood
/// change falls below the tolerance.
pub fn decompose_fa(matrix: &PixelTimeMatrix, k: usize, opts: &FaOptions) -> Result<Factorization> {
    let x = &matrix.data;
    let d = x.nrows();
    let n = x.ncols();

    let mean = x.column_mean();
    let mut centered = x.clone();
    for mut col in centered.column_iter_mut() {
        for (i, v) in col.iter_mut().enumerate() {
            *v -= mean[i];
        }
    }

    // Per-pixel sums of squares, reused by the M-step and the likelihood.
    let row_ss: Vec<f64> = centered
        .row_iter()
        .map(|row| row.iter().map(|v| v * v).sum())
        .collect();

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut lambda = DMatrix::<f64>::from_fn(d, k, |_, _| rng.gen_range(-0.01..0.01));
    let mut psi = DVector::<f64>::from_fn(d, |i, _| (row_ss[i] / n as f64).max(1e-6));

    let mut prev_ll = f64::NEG_INFINITY;
    let mut iterations = 0;

    for iter in 0..opts.max_iter {
        let psi_inv = psi.map(|v| 1.0 / v);

        // M = Lambda^T Psi^-1 (k x d)
        let mut m = DMatrix::<f64>::zeros(k, d);
        for i in 0..k {
            for j in 0..d {
                m[(i, j)] = lambda[(j, i)] * psi_inv[j];
            }
        }

        let ml = &m * &lambda;
        let g_inv = DMatrix::<f64>::identity(k, k) + &ml;
        let g = g_inv.clone().try_inverse().ok_or_else(|| {
            SomaError::Factorization("Singular posterior covariance in factor analysis".into())
        })?;

        // Log-likelihood of the current parameters.
        let a = &m * &centered;
        let tr_psi_inv_s: f64 = (0..d).map(|i| psi_inv[i] * row_ss[i]).sum::<f64>() / n as f64;
        let tr_corr = (&g * (&a * a.transpose())).trace() / n as f64;
        let det = g_inv.determinant();
        if det <= 0.0 {
            return Err(SomaError::Factorization(
                "Non-positive-definite model covariance in factor analysis".into(),
            ));
        }
        let ln_det_psi: f64 = psi.iter().map(|v| v.ln()).sum();
        let ll = -(n as f64) / 2.0
            * (d as f64 * (2.0 * std::f64::consts::PI).ln() + ln_det_psi + det.ln()
                + tr_psi_inv_s
                - tr_corr);

        iterations = iter;
        if (ll - prev_ll).abs() < opts.tolerance * prev_ll.abs().max(1.0) {
            break;
        }
        prev_ll = ll;

        // E-step: posterior factor moments.
        let ez = &g * &a;
        let szz = &g * n as f64 + &ez * ez.transpose();

        // M-step.
        let szz_inv = szz.try_inverse().ok_or_else(|| {
            SomaError::Factorization("Singular factor second moment in factor analysis".into())
        })?;
        let lambda_new = (&centered * ez.transpose()) * szz_inv;

        let b = &ez * centered.transpose();
        for i in 0..d {
            let mut coupled = 0.0f64;
            for j in 0..k {
                coupled += lambda_new[(i, j)] * b[(j, i)];
            }
            psi[i] = ((row_ss[i] - coupled) / n as f64).max(1e-8);
        }
        lambda = lambda_new;
        iterations = iter + 1;
    }

    // Final posterior factor means with the converged parameters.
    let psi_inv = psi.map(|v| 1.0 / v);
    let mut m = DMatrix::<f64>::zeros(k, d);
    for i in 0..k {
        for j in 0..d {
            m[(i, j)] = lambda[(j, i)] * psi_inv[j];
        }
    }
    let g = (DMatrix::<f64>::identity(k, k) + &m * &lambda)
        .try_inverse()
        .ok_or_else(|| {
            SomaError::Factorization("Singular posterior covariance in factor analysis".into())
        })?;
    let temporal = &g * (&m * &centered);
    let spatial = lambda.transpose();

    let mut fact = Factorization {
        method: Method::FactorAnalysis,
        k,
        spatial,
        temporal,
        mean: Some(mean),
        rmse: 0.0,
        explained_variance: 0.0,
        iterations,
    };
    fact.rmse = reconstruction_rmse(x, &fact);
    fact.explained_variance = explained_variance_fraction(x, &fact);
    Ok(fact)
}
