use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_NMF_MAX_ITER, DEFAULT_NMF_TOLERANCE, MU_EPSILON};
use crate::error::{Result, SomaError};

use super::matrix::PixelTimeMatrix;
use super::metrics::{explained_variance_fraction, reconstruction_rmse};
use super::{Factorization, Method};

/// Initialization strategy for the NMF factors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NmfInit {
    /// Seeded uniform-random factors scaled to the input magnitude.
    Random,
    /// SVD-based initialization with zeros filled by the matrix mean.
    Nndsvd,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NmfOptions {
    pub max_iter: usize,
    pub tolerance: f64,
    pub l1: f64,
    pub l2: f64,
    pub init: NmfInit,
    pub seed: u64,
}

impl Default for NmfOptions {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_NMF_MAX_ITER,
            tolerance: DEFAULT_NMF_TOLERANCE,
            l1: 0.0,
            l2: 0.0,
            init: NmfInit::Random,
            seed: 0,
        }
    }
}

/// Non-negative matrix factorization with multiplicative updates.
///
/// Minimizes the Frobenius reconstruction error with optional L1 and L2
/// penalties on both factors. The input must be non-negative; pixel movies
/// are by construction. Stops early when the relative RMSE change between
/// iterations falls below the tolerance.
pub fn decompose_nmf(
    matrix: &PixelTimeMatrix,
    k: usize,
    opts: &NmfOptions,
) -> Result<Factorization> {
    let x = &matrix.data;

    if x.iter().any(|v| *v < 0.0) {
        return Err(SomaError::Factorization(
            "NMF requires non-negative input".into(),
        ));
    }

    let (mut w, mut h) = match opts.init {
        NmfInit::Random => init_random(x, k, opts.seed),
        NmfInit::Nndsvd => init_nndsvd(x, k)?,
    };

    let norm_x = x.iter().map(|v| v * v).sum::<f64>().sqrt();
    let scale = (x.nrows() * x.ncols()) as f64;

    let mut prev_rmse = f64::INFINITY;
    let mut iterations = 0;

    for iter in 0..opts.max_iter {
        // H <- H * (W^T X) / (W^T W H + l1 + l2 H)
        let wt_x = w.transpose() * x;
        let mut denom_h = (w.transpose() * &w) * &h;
        if opts.l2 > 0.0 {
            denom_h += &h * opts.l2;
        }
        denom_h.add_scalar_mut(opts.l1 + MU_EPSILON);
        h.component_mul_assign(&wt_x.component_div(&denom_h));

        // W <- W * (X H^T) / (W H H^T + l1 + l2 W)
        let x_ht = x * h.transpose();
        let mut denom_w = &w * (&h * h.transpose());
        if opts.l2 > 0.0 {
            denom_w += &w * opts.l2;
        }
        denom_w.add_scalar_mut(opts.l1 + MU_EPSILON);
        w.component_mul_assign(&x_ht.component_div(&denom_w));

        iterations = iter + 1;

        let residual = x - &w * &h;
        let rmse = (residual.iter().map(|v| v * v).sum::<f64>() / scale).sqrt();
        let reference = (norm_x / scale.sqrt()).max(1e-12);
        if (prev_rmse - rmse).abs() / reference < opts.tolerance {
            break;
        }
        prev_rmse = rmse;
    }

    let mut fact = Factorization {
        method: Method::Nmf,
        k,
        spatial: w.transpose(),
        temporal: h,
        mean: None,
        rmse: 0.0,
        explained_variance: 0.0,
        iterations,
    };
    fact.rmse = reconstruction_rmse(x, &fact);
    fact.explained_variance = explained_variance_fraction(x, &fact);
    Ok(fact)
}

/// Uniform-random factors scaled so W H starts near the input magnitude.
fn init_random(x: &DMatrix<f64>, k: usize, seed: u64) -> (DMatrix<f64>, DMatrix<f64>) {
    let mean = x.iter().sum::<f64>() / (x.nrows() * x.ncols()) as f64;
    let scale = (mean.max(MU_EPSILON) / k as f64).sqrt();

    let mut rng = StdRng::seed_from_u64(seed);
    let w = DMatrix::from_fn(x.nrows(), k, |_, _| rng.gen_range(0.0..1.0) * scale);
    let h = DMatrix::from_fn(k, x.ncols(), |_, _| rng.gen_range(0.0..1.0) * scale);
    (w, h)
}

/// NNDSVD initialization: each rank-one SVD term is split into its
/// non-negative parts and the dominant part is kept. Zero entries are
/// filled with the matrix mean so multiplicative updates can move them.
fn init_nndsvd(x: &DMatrix<f64>, k: usize) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    let d = x.nrows();
    let n = x.ncols();

    let svd = x.clone().svd(true, true);
    let u = svd
        .u
        .as_ref()
        .ok_or_else(|| SomaError::Factorization("SVD did not produce U".into()))?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| SomaError::Factorization("SVD did not produce V^T".into()))?;

    let mut w = DMatrix::<f64>::zeros(d, k);
    let mut h = DMatrix::<f64>::zeros(k, n);

    // Leading singular vectors of a non-negative matrix can be taken
    // non-negative outright.
    let s0 = svd.singular_values[0].sqrt();
    for p in 0..d {
        w[(p, 0)] = s0 * u[(p, 0)].abs();
    }
    for j in 0..n {
        h[(0, j)] = s0 * v_t[(0, j)].abs();
    }

    for i in 1..k.min(svd.singular_values.len()) {
        let sigma = svd.singular_values[i];

        let up: Vec<f64> = (0..d).map(|p| u[(p, i)].max(0.0)).collect();
        let un: Vec<f64> = (0..d).map(|p| (-u[(p, i)]).max(0.0)).collect();
        let vp: Vec<f64> = (0..n).map(|j| v_t[(i, j)].max(0.0)).collect();
        let vn: Vec<f64> = (0..n).map(|j| (-v_t[(i, j)]).max(0.0)).collect();

        let n_up = l2_norm(&up);
        let n_un = l2_norm(&un);
        let n_vp = l2_norm(&vp);
        let n_vn = l2_norm(&vn);

        let term_p = n_up * n_vp;
        let term_n = n_un * n_vn;

        let (u_part, v_part, n_u, n_v, term) = if term_p >= term_n {
            (up, vp, n_up, n_vp, term_p)
        } else {
            (un, vn, n_un, n_vn, term_n)
        };

        if term < 1e-12 || n_u < 1e-12 || n_v < 1e-12 {
            continue;
        }

        let factor = (sigma * term).sqrt();
        for p in 0..d {
            w[(p, i)] = factor * u_part[p] / n_u;
        }
        for j in 0..n {
            h[(i, j)] = factor * v_part[j] / n_v;
        }
    }

    let mean = x.iter().sum::<f64>() / (d * n) as f64;
    let fill = mean.max(MU_EPSILON);
    for v in w.iter_mut() {
        if *v < MU_EPSILON {
            *v = fill;
        }
    }
    for v in h.iter_mut() {
        if *v < MU_EPSILON {
            *v = fill;
        }
    }

    Ok((w, h))
}

fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}
