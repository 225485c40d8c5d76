use ndarray::Array2;
use rayon::prelude::*;

use crate::error::{Result, SomaError};
use crate::frame::Frame;

use super::phase::phase_offset;
use super::shift::shift_array;

/// Variance of pixel intensities.
pub fn intensity_variance(data: &Array2<f32>) -> f64 {
    let n = data.len() as f64;
    if n == 0.0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for &v in data.iter() {
        sum += v as f64;
        sum_sq += v as f64 * v as f64;
    }

    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Standard deviation of pixel intensities, used as a contrast score.
pub fn contrast_score(data: &Array2<f32>) -> f64 {
    intensity_variance(data).sqrt()
}

/// Score all frames by contrast and return (index, score) sorted descending.
pub fn rank_frames_by_contrast(frames: &[Frame]) -> Vec<(usize, f64)> {
    let mut scores: Vec<(usize, f64)> = frames
        .par_iter()
        .enumerate()
        .map(|(i, f)| (i, contrast_score(&f.data)))
        .collect();

    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores
}

/// Build a synthetic template from the highest-contrast frames.
///
/// 1. Scores each frame by contrast
/// 2. Selects the top `keep_fraction` by score
/// 3. Aligns the selected frames to frame 0 and averages them
/// 4. Re-aligns against the improved template for `iterations` extra passes
///
/// This produces a cleaner reference than any single frame, reducing bias
/// toward one motion state.
pub fn build_template(
    frames: &[Frame],
    keep_fraction: f64,
    iterations: usize,
) -> Result<Array2<f32>> {
    if frames.is_empty() {
        return Err(SomaError::EmptySequence);
    }

    let mut scores = rank_frames_by_contrast(frames);
    let keep = ((frames.len() as f64 * keep_fraction).ceil() as usize)
        .max(1)
        .min(frames.len());
    scores.truncate(keep);

    let mut template = mean_aligned(frames, &scores, &frames[0].data)?;
    for _ in 0..iterations {
        template = mean_aligned(frames, &scores, &template)?;
    }

    Ok(template)
}

fn mean_aligned(
    frames: &[Frame],
    selected: &[(usize, f64)],
    template: &Array2<f32>,
) -> Result<Array2<f32>> {
    let (h, w) = template.dim();
    let mut accumulator = Array2::<f64>::zeros((h, w));

    for &(idx, _) in selected {
        let offset = phase_offset(template, &frames[idx].data)?;
        let shifted = shift_array(&frames[idx].data, -offset.dx, -offset.dy);
        accumulator += &shifted.mapv(|v| v as f64);
    }

    let n = selected.len() as f64;
    Ok(accumulator.mapv(|v| (v / n) as f32))
}
