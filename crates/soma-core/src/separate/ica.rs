use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ICA_MAX_ITER, DEFAULT_ICA_TOLERANCE};
use crate::error::{Result, SomaError};

use super::matrix::PixelTimeMatrix;
use super::metrics::{explained_variance_fraction, reconstruction_rmse};
use super::{Factorization, Method};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IcaOptions {
    pub max_iter: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for IcaOptions {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_ICA_MAX_ITER,
            tolerance: DEFAULT_ICA_TOLERANCE,
            seed: 0,
        }
    }
}

/// FastICA with a tanh contrast and symmetric decorrelation.
///
/// The matrix is whitened to k dimensions with PCA first; the unmixing
/// rotation is then estimated on the whitened data. Non-convergence within
/// the iteration cap is an error rather than a silent partial result.
pub fn decompose_ica(
    matrix: &PixelTimeMatrix,
    k: usize,
    opts: &IcaOptions,
) -> Result<Factorization> {
    let x = &matrix.data;
    let t = x.ncols();

    let mean = x.column_mean();
    let mut centered = x.clone();
    for mut col in centered.column_iter_mut() {
        for (i, v) in col.iter_mut().enumerate() {
            *v -= mean[i];
        }
    }

    let svd = centered.svd(true, true);
    let u = svd
        .u
        .as_ref()
        .ok_or_else(|| SomaError::Factorization("SVD did not produce U".into()))?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| SomaError::Factorization("SVD did not produce V^T".into()))?;

    for i in 0..k {
        if svd.singular_values[i] < 1e-10 {
            return Err(SomaError::Factorization(format!(
                "Input rank is below k = {k}, whitening is degenerate"
            )));
        }
    }

    // Whitened data: k x time with identity covariance.
    let sqrt_t = (t as f64).sqrt();
    let z = v_t.rows(0, k) * sqrt_t;

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let init = DMatrix::<f64>::from_fn(k, k, |_, _| rng.gen_range(-1.0..1.0));
    let mut w = symmetric_decorrelation(&init)?;

    let mut iterations = 0;
    let mut converged = false;
    for iter in 0..opts.max_iter {
        let wz = &w * &z;
        let g = wz.map(f64::tanh);
        let g_prime_means: Vec<f64> = g
            .row_iter()
            .map(|row| row.iter().map(|v| 1.0 - v * v).sum::<f64>() / t as f64)
            .collect();

        let mut w_new = (&g * z.transpose()) / t as f64;
        for (i, &gp) in g_prime_means.iter().enumerate() {
            for j in 0..k {
                w_new[(i, j)] -= gp * w[(i, j)];
            }
        }
        let w_new = symmetric_decorrelation(&w_new)?;

        let overlap = (&w_new * w.transpose()).diagonal();
        let delta = overlap
            .iter()
            .map(|v| (1.0 - v.abs()).abs())
            .fold(0.0f64, f64::max);

        w = w_new;
        iterations = iter + 1;
        if delta < opts.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(SomaError::Factorization(format!(
            "FastICA did not converge within {} iterations",
            opts.max_iter
        )));
    }

    // Sources are the temporal components; the mixing matrix maps them back
    // into pixel space.
    let temporal = &w * &z;
    let mut sigma_ut = DMatrix::<f64>::zeros(k, x.nrows());
    for i in 0..k {
        let sigma = svd.singular_values[i];
        for p in 0..x.nrows() {
            sigma_ut[(i, p)] = sigma * u[(p, i)];
        }
    }
    let spatial = (&w * sigma_ut) / sqrt_t;

    let mut fact = Factorization {
        method: Method::Ica,
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

/// W <- (W W^T)^{-1/2} W, keeping the rows mutually decorrelated.
fn symmetric_decorrelation(w: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let wwt = w * w.transpose();
    let eig = wwt.symmetric_eigen();

    let mut inv_sqrt = eig.eigenvalues.clone();
    for v in inv_sqrt.iter_mut() {
        if *v < 1e-12 {
            return Err(SomaError::Factorization(
                "Degenerate unmixing matrix in symmetric decorrelation".into(),
            ));
        }
        *v = 1.0 / v.sqrt();
    }

    let q = &eig.eigenvectors;
    Ok(q * DMatrix::from_diagonal(&inv_sqrt) * q.transpose() * w)
}
