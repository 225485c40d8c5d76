use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::STABILITY_TIE_TOLERANCE;
use crate::error::{Result, SomaError};
use crate::separate::{decompose_nmf, Factorization, NmfOptions, PixelTimeMatrix};

use super::matching::match_components;

/// Stability of an NMF configuration across repeated seeded runs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StabilityScore {
    /// Mean matched temporal correlation over all run pairs, in [0, 1].
    pub score: f64,
    /// Mean reconstruction RMSE across the runs.
    pub mean_rmse: f64,
    pub runs: usize,
}

/// Fit NMF `runs` times from distinct seeds and score how reproducible the
/// components are.
///
/// Each pair of runs is matched with the Hungarian assignment on absolute
/// temporal correlation; the stability score is the mean matched
/// correlation over all pairs. Runs execute in parallel.
pub fn stability(
    matrix: &PixelTimeMatrix,
    k: usize,
    opts: &NmfOptions,
    runs: usize,
) -> Result<StabilityScore> {
    if runs < 2 {
        return Err(SomaError::Factorization(
            "Stability needs at least two runs".into(),
        ));
    }

    let fits: Vec<Factorization> = (0..runs)
        .into_par_iter()
        .map(|r| {
            let run_opts = NmfOptions {
                seed: opts.seed.wrapping_add(r as u64),
                ..opts.clone()
            };
            decompose_nmf(matrix, k, &run_opts)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut total = 0.0f64;
    let mut pairs = 0usize;
    for i in 0..runs {
        for j in i + 1..runs {
            let matched = match_components(&fits[i].temporal, &fits[j].temporal)?;
            total += matched.mean_correlation;
            pairs += 1;
        }
    }

    let mean_rmse = fits.iter().map(|f| f.rmse).sum::<f64>() / runs as f64;
    Ok(StabilityScore {
        score: total / pairs as f64,
        mean_rmse,
        runs,
    })
}

/// One evaluated cell of the rank/regularization grid.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SweepCell {
    pub rank: usize,
    pub alpha: f64,
    pub stability: f64,
    pub mean_rmse: f64,
}

/// Full sweep result, serializable for reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepReport {
    pub cells: Vec<SweepCell>,
    /// Index into `cells` of the selected configuration.
    pub selected: usize,
    pub runs: usize,
}

impl SweepReport {
    pub fn selected_cell(&self) -> &SweepCell {
        &self.cells[self.selected]
    }
}

/// Grid search over component count and regularization strength.
///
/// `alpha` is applied as an L1 penalty on both factors. Selection prefers
/// the most stable cell; cells whose stability is within a small tolerance
/// of the best are tie-broken by lower reconstruction RMSE, so an
/// expected-neuron-count prior can be expressed through the rank grid
/// without losing fits that are equally reproducible but tighter.
pub fn sweep(
    matrix: &PixelTimeMatrix,
    ranks: &[usize],
    alphas: &[f64],
    opts: &NmfOptions,
    runs: usize,
) -> Result<SweepReport> {
    sweep_with_progress(matrix, ranks, alphas, opts, runs, |_, _| {})
}

/// Same as [`sweep`], invoking `on_cell_done(done, total)` after each grid
/// cell for progress display.
pub fn sweep_with_progress<F>(
    matrix: &PixelTimeMatrix,
    ranks: &[usize],
    alphas: &[f64],
    opts: &NmfOptions,
    runs: usize,
    on_cell_done: F,
) -> Result<SweepReport>
where
    F: Fn(usize, usize),
{
    if ranks.is_empty() || alphas.is_empty() {
        return Err(SomaError::Factorization(
            "Sweep grid must contain at least one rank and one alpha".into(),
        ));
    }

    let total = ranks.len() * alphas.len();
    let mut cells = Vec::with_capacity(total);

    for &rank in ranks {
        for &alpha in alphas {
            let cell_opts = NmfOptions {
                l1: alpha,
                ..opts.clone()
            };
            let score = stability(matrix, rank, &cell_opts, runs)?;
            info!(
                rank,
                alpha,
                stability = score.score,
                rmse = score.mean_rmse,
                "sweep cell evaluated"
            );
            cells.push(SweepCell {
                rank,
                alpha,
                stability: score.score,
                mean_rmse: score.mean_rmse,
            });
            on_cell_done(cells.len(), total);
        }
    }

    let selected = select_cell(&cells);
    Ok(SweepReport {
        cells,
        selected,
        runs,
    })
}

/// Pick the most stable cell, breaking near-ties by lower RMSE.
fn select_cell(cells: &[SweepCell]) -> usize {
    let best_stability = cells
        .iter()
        .map(|c| c.stability)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut selected = 0;
    let mut best_rmse = f64::INFINITY;
    for (i, cell) in cells.iter().enumerate() {
        if cell.stability >= best_stability - STABILITY_TIE_TOLERANCE && cell.mean_rmse < best_rmse
        {
            best_rmse = cell.mean_rmse;
            selected = i;
        }
    }
    selected
}
