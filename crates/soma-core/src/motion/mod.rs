pub mod crop;
pub mod phase;
pub mod shift;
pub mod smooth;
pub mod template;

pub use crop::{compute_crop_rect, crop_frame, CropRect};
pub use phase::phase_offset;
pub use shift::{shift_array, shift_frame};
pub use smooth::smooth_offsets;
pub use template::build_template;

use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array2;
use rayon::prelude::*;
use tracing::warn;

use crate::consts::PARALLEL_FRAME_THRESHOLD;
use crate::error::{Result, SomaError};
use crate::frame::{Frame, FrameOffset};
use crate::pipeline::config::MotionConfig;

use template::intensity_variance;

/// Result of motion-correcting a movie.
#[derive(Clone, Debug)]
pub struct StabilizedMovie {
    /// Shifted frames cropped to the common valid region.
    pub frames: Vec<Frame>,
    /// Smoothed per-frame displacements relative to the template.
    pub offsets: Vec<FrameOffset>,
    /// Region of the original frame geometry the output covers.
    pub crop: CropRect,
    /// The template the movie was registered against.
    pub template: Array2<f32>,
}

/// Estimate per-frame displacements against a template with progress reporting.
///
/// Near-uniform frames (variance below the configured floor) and frames with
/// a weak correlation peak are flagged unreliable instead of being trusted.
pub fn estimate_offsets_with_progress<F>(
    frames: &[Frame],
    template: &Array2<f32>,
    config: &MotionConfig,
    on_frame_done: F,
) -> Result<Vec<FrameOffset>>
where
    F: Fn(usize) + Send + Sync,
{
    if frames.is_empty() {
        return Err(SomaError::EmptySequence);
    }

    let counter = AtomicUsize::new(0);
    let estimate = |frame: &Frame| -> Result<FrameOffset> {
        if intensity_variance(&frame.data) < config.min_frame_variance {
            return Ok(FrameOffset::new(0, 0, 0.0, false));
        }
        let mut offset = phase_offset(template, &frame.data)?;
        offset.reliable = offset.confidence >= config.min_peak_confidence;
        Ok(offset)
    };

    if frames.len() >= PARALLEL_FRAME_THRESHOLD {
        let results: Vec<Result<FrameOffset>> = frames
            .par_iter()
            .map(|frame| {
                let result = estimate(frame);
                let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
                on_frame_done(done);
                result
            })
            .collect();
        results.into_iter().collect()
    } else {
        let mut offsets = Vec::with_capacity(frames.len());
        for frame in frames {
            offsets.push(estimate(frame)?);
            let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
            on_frame_done(done);
        }
        Ok(offsets)
    }
}

/// Estimate per-frame displacements against a template.
pub fn estimate_offsets(
    frames: &[Frame],
    template: &Array2<f32>,
    config: &MotionConfig,
) -> Result<Vec<FrameOffset>> {
    estimate_offsets_with_progress(frames, template, config, |_| {})
}

/// Motion-correct a movie end to end: build a template, estimate and smooth
/// per-frame offsets, shift each frame into register, and crop to the
/// common valid region.
pub fn stabilize(frames: &[Frame], config: &MotionConfig) -> Result<StabilizedMovie> {
    stabilize_with_progress(frames, config, |_| {})
}

/// `stabilize` with per-frame progress reporting during offset estimation.
pub fn stabilize_with_progress<F>(
    frames: &[Frame],
    config: &MotionConfig,
    on_frame_done: F,
) -> Result<StabilizedMovie>
where
    F: Fn(usize) + Send + Sync,
{
    if frames.is_empty() {
        return Err(SomaError::EmptySequence);
    }

    let (h, w) = frames[0].data.dim();
    for frame in frames {
        let (fh, fw) = frame.data.dim();
        if fh != h || fw != w {
            return Err(SomaError::ShapeMismatch {
                expected_width: w,
                expected_height: h,
                width: fw,
                height: fh,
            });
        }
    }

    let template = build_template(frames, config.template_fraction, config.template_iterations)?;
    let raw_offsets = estimate_offsets_with_progress(frames, &template, config, on_frame_done)?;

    let flagged: Vec<usize> = raw_offsets
        .iter()
        .enumerate()
        .filter(|(_, o)| !o.reliable)
        .map(|(i, _)| i)
        .collect();
    if !flagged.is_empty() {
        warn!(
            frames = ?flagged,
            "degenerate or low-confidence frames, offsets interpolated from neighbors"
        );
    }

    let offsets = smooth_offsets(&raw_offsets, config);

    let shifted: Vec<Frame> = if frames.len() >= PARALLEL_FRAME_THRESHOLD {
        frames
            .par_iter()
            .zip(offsets.par_iter())
            .map(|(frame, o)| shift_frame(frame, -o.dx, -o.dy))
            .collect()
    } else {
        frames
            .iter()
            .zip(offsets.iter())
            .map(|(frame, o)| shift_frame(frame, -o.dx, -o.dy))
            .collect()
    };

    let crop = compute_crop_rect(&offsets, w, h)?;
    let cropped: Vec<Frame> = shifted.iter().map(|f| crop_frame(f, &crop)).collect();

    Ok(StabilizedMovie {
        frames: cropped,
        offsets,
        crop,
        template,
    })
}
