use nalgebra::DMatrix;

use crate::error::{Result, SomaError};

use super::matrix::PixelTimeMatrix;
use super::metrics::{explained_variance_fraction, reconstruction_rmse};
use super::{Factorization, Method};

/// Principal component analysis via SVD of the time-centered matrix.
///
/// Spatial components are the first k left singular vectors; temporal
/// components are the matching right singular vectors scaled by their
/// singular values.
pub fn decompose_pca(matrix: &PixelTimeMatrix, k: usize) -> Result<Factorization> {
    let x = &matrix.data;
    let pixels = x.nrows();
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

    let mut spatial = DMatrix::<f64>::zeros(k, pixels);
    let mut temporal = DMatrix::<f64>::zeros(k, t);
    for i in 0..k {
        let sigma = svd.singular_values[i];
        for p in 0..pixels {
            spatial[(i, p)] = u[(p, i)];
        }
        for j in 0..t {
            temporal[(i, j)] = sigma * v_t[(i, j)];
        }
    }

    let mut fact = Factorization {
        method: Method::Pca,
        k,
        spatial,
        temporal,
        mean: Some(mean),
        rmse: 0.0,
        explained_variance: 0.0,
        iterations: 0,
    };
    fact.rmse = reconstruction_rmse(x, &fact);
    fact.explained_variance = explained_variance_fraction(x, &fact);
    Ok(fact)
}
