use nalgebra::DMatrix;

use super::Factorization;

/// Root-mean-square reconstruction error against the input matrix.
pub fn reconstruction_rmse(x: &DMatrix<f64>, fact: &Factorization) -> f64 {
    let xhat = fact.reconstruction();
    let n = (x.nrows() * x.ncols()) as f64;
    let ss: f64 = x
        .iter()
        .zip(xhat.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum();
    (ss / n).sqrt()
}

/// Fraction of the input's temporal variance captured by the reconstruction.
///
/// 1 - SS_res / SS_tot, where SS_tot is taken around each pixel's temporal
/// mean. Can be negative for a fit worse than the per-pixel mean.
pub fn explained_variance_fraction(x: &DMatrix<f64>, fact: &Factorization) -> f64 {
    let xhat = fact.reconstruction();
    let t = x.ncols() as f64;

    let mut ss_res = 0.0f64;
    for (a, b) in x.iter().zip(xhat.iter()) {
        ss_res += (a - b) * (a - b);
    }

    let mut ss_tot = 0.0f64;
    for row in x.row_iter() {
        let mean = row.sum() / t;
        for v in row.iter() {
            ss_tot += (v - mean) * (v - mean);
        }
    }

    if ss_tot < 1e-12 {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}

/// Mean Hoyer sparsity of the spatial components.
///
/// Each component scores (sqrt(n) - l1/l2) / (sqrt(n) - 1): 0 for a flat
/// map, 1 for a single active pixel.
pub fn spatial_sparsity(spatial: &DMatrix<f64>) -> f64 {
    let n = spatial.ncols() as f64;
    if n <= 1.0 || spatial.nrows() == 0 {
        return 0.0;
    }
    let sqrt_n = n.sqrt();

    let mut total = 0.0f64;
    for row in spatial.row_iter() {
        let l1: f64 = row.iter().map(|v| v.abs()).sum();
        let l2: f64 = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if l2 < 1e-12 {
            continue;
        }
        total += (sqrt_n - l1 / l2) / (sqrt_n - 1.0);
    }
    total / spatial.nrows() as f64
}

/// Mean energy compactness of the spatial components.
///
/// For each component, the fraction of pixels needed to hold 90% of the
/// squared energy; compactness is one minus that fraction, so localized
/// components score near 1.
pub fn spatial_compactness(spatial: &DMatrix<f64>) -> f64 {
    let n = spatial.ncols();
    if n == 0 || spatial.nrows() == 0 {
        return 0.0;
    }

    let mut total = 0.0f64;
    for row in spatial.row_iter() {
        let mut energies: Vec<f64> = row.iter().map(|v| v * v).collect();
        energies.sort_unstable_by(|a, b| b.total_cmp(a));
        let sum: f64 = energies.iter().sum();
        if sum < 1e-12 {
            continue;
        }

        let target = 0.9 * sum;
        let mut acc = 0.0f64;
        let mut needed = n;
        for (i, e) in energies.iter().enumerate() {
            acc += e;
            if acc >= target {
                needed = i + 1;
                break;
            }
        }
        total += 1.0 - needed as f64 / n as f64;
    }
    total / spatial.nrows() as f64
}

/// Mean normalized roughness of the temporal components.
///
/// Squared second differences over centered energy; lower means smoother
/// traces.
pub fn temporal_roughness(temporal: &DMatrix<f64>) -> f64 {
    let t = temporal.ncols();
    if t < 3 || temporal.nrows() == 0 {
        return 0.0;
    }

    let mut total = 0.0f64;
    for row in temporal.row_iter() {
        let mean = row.sum() / t as f64;
        let energy: f64 = row.iter().map(|v| (v - mean) * (v - mean)).sum();
        if energy < 1e-12 {
            continue;
        }

        let mut rough = 0.0f64;
        for i in 1..t - 1 {
            let second = row[i + 1] - 2.0 * row[i] + row[i - 1];
            rough += second * second;
        }
        total += rough / energy;
    }
    total / temporal.nrows() as f64
}
