use nalgebra::DMatrix;

use crate::error::{Result, SomaError};

/// One matched component pair and the absolute Pearson correlation of the
/// paired traces.
#[derive(Clone, Copy, Debug)]
pub struct MatchedPair {
    pub index_a: usize,
    pub index_b: usize,
    pub correlation: f64,
}

/// Optimal assignment between two component sets.
#[derive(Clone, Debug)]
pub struct ComponentMatching {
    pub pairs: Vec<MatchedPair>,
    pub mean_correlation: f64,
}

/// Match the rows of two component sets one-to-one, maximizing the total
/// absolute Pearson correlation.
///
/// Sign and order of components are arbitrary across runs and methods, so
/// the correlation is taken absolute and the assignment is solved as a
/// minimum-cost matching on 1 - |r|. Identical sets under any permutation
/// score 1.0.
pub fn match_components(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<ComponentMatching> {
    let k = a.nrows();
    if k == 0 {
        return Err(SomaError::Factorization(
            "Cannot match empty component sets".into(),
        ));
    }
    if b.nrows() != k {
        return Err(SomaError::Factorization(format!(
            "Component counts differ: {} vs {}",
            k,
            b.nrows()
        )));
    }
    if a.ncols() != b.ncols() {
        return Err(SomaError::Factorization(format!(
            "Component lengths differ: {} vs {}",
            a.ncols(),
            b.ncols()
        )));
    }

    let rows_a: Vec<Vec<f64>> = (0..k).map(|i| a.row(i).iter().copied().collect()).collect();
    let rows_b: Vec<Vec<f64>> = (0..k).map(|j| b.row(j).iter().copied().collect()).collect();

    let mut corr = DMatrix::<f64>::zeros(k, k);
    for i in 0..k {
        for j in 0..k {
            corr[(i, j)] = abs_pearson(&rows_a[i], &rows_b[j]);
        }
    }

    let cost = corr.map(|r| 1.0 - r);
    let assignment = hungarian(&cost);

    let mut pairs = Vec::with_capacity(k);
    let mut total = 0.0f64;
    for (i, &j) in assignment.iter().enumerate() {
        let r = corr[(i, j)];
        total += r;
        pairs.push(MatchedPair {
            index_a: i,
            index_b: j,
            correlation: r,
        });
    }

    Ok(ComponentMatching {
        pairs,
        mean_correlation: total / k as f64,
    })
}

fn abs_pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;

    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut dot = 0.0f64;
    let mut ss_a = 0.0f64;
    let mut ss_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let da = x - mean_a;
        let db = y - mean_b;
        dot += da * db;
        ss_a += da * da;
        ss_b += db * db;
    }

    let denom = (ss_a * ss_b).sqrt();
    if denom < 1e-12 {
        return 0.0;
    }
    (dot / denom).abs()
}

/// Minimum-cost perfect matching on a square cost matrix via the potentials
/// form of the Hungarian algorithm, O(n^3). Returns the assigned column for
/// each row.
fn hungarian(cost: &DMatrix<f64>) -> Vec<usize> {
    let n = cost.nrows();
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=n {
        if p[j] > 0 {
            assignment[p[j] - 1] = j - 1;
        }
    }
    assignment
}
