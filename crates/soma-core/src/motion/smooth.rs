use crate::frame::FrameOffset;
use crate::pipeline::config::MotionConfig;

/// Temporally filter offset tracks.
///
/// Unreliable entries are linearly interpolated from reliable neighbors,
/// then each track is median-filtered and Gaussian-smoothed, rounded back
/// to integers, and clamped so adjacent offsets never differ by more than
/// the configured jump limit.
pub fn smooth_offsets(offsets: &[FrameOffset], config: &MotionConfig) -> Vec<FrameOffset> {
    if offsets.is_empty() {
        return Vec::new();
    }

    let reliable: Vec<bool> = offsets.iter().map(|o| o.reliable).collect();
    let dx_track: Vec<f64> = offsets.iter().map(|o| o.dx as f64).collect();
    let dy_track: Vec<f64> = offsets.iter().map(|o| o.dy as f64).collect();

    let mut dx = filter_track(&dx_track, &reliable, config);
    let mut dy = filter_track(&dy_track, &reliable, config);

    clamp_jumps(&mut dx, config.max_jump);
    clamp_jumps(&mut dy, config.max_jump);

    offsets
        .iter()
        .zip(dx.iter().zip(dy.iter()))
        .map(|(orig, (&x, &y))| FrameOffset::new(x, y, orig.confidence, orig.reliable))
        .collect()
}

fn filter_track(values: &[f64], reliable: &[bool], config: &MotionConfig) -> Vec<i64> {
    let filled = interpolate_unreliable(values, reliable);
    let filtered = median_filter_1d(&filled, config.median_window);
    let smoothed = gaussian_filter_1d(&filtered, config.smoothing_sigma);
    smoothed.iter().map(|v| v.round() as i64).collect()
}

/// Replace unreliable entries with linear interpolation between the nearest
/// reliable neighbors. Leading/trailing runs take the nearest reliable value.
/// All-unreliable tracks collapse to zero.
fn interpolate_unreliable(values: &[f64], reliable: &[bool]) -> Vec<f64> {
    let n = values.len();
    if reliable.iter().all(|&r| !r) {
        return vec![0.0; n];
    }

    let mut out = values.to_vec();
    let mut i = 0;
    while i < n {
        if reliable[i] {
            i += 1;
            continue;
        }
        let mut j = i;
        while j < n && !reliable[j] {
            j += 1;
        }
        let left = if i > 0 { Some(out[i - 1]) } else { None };
        let right = if j < n { Some(values[j]) } else { None };
        for (k, slot) in out.iter_mut().enumerate().take(j).skip(i) {
            *slot = match (left, right) {
                (Some(l), Some(r)) => {
                    let t = (k - i + 1) as f64 / (j - i + 1) as f64;
                    l + (r - l) * t
                }
                (Some(l), None) => l,
                (None, Some(r)) => r,
                (None, None) => 0.0,
            };
        }
        i = j;
    }
    out
}

fn median_filter_1d(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if window <= 1 || n == 0 {
        return values.to_vec();
    }
    let radius = window / 2;

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(n);
            let mut local: Vec<f64> = values[lo..hi].to_vec();
            median_f64(&mut local)
        })
        .collect()
}

fn gaussian_filter_1d(values: &[f64], sigma: f64) -> Vec<f64> {
    let n = values.len();
    if sigma <= 0.0 || n == 0 {
        return values.to_vec();
    }

    let kernel = make_gaussian_kernel(sigma);
    let radius = kernel.len() / 2;

    (0..n)
        .map(|i| {
            let mut sum = 0.0f64;
            for (ki, &kv) in kernel.iter().enumerate() {
                let src = (i as isize + ki as isize - radius as isize)
                    .clamp(0, n as isize - 1) as usize;
                sum += values[src] * kv;
            }
            sum
        })
        .collect()
}

fn make_gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (sigma * 3.0).ceil() as usize;
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f64; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f64;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f64 - radius as f64;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

fn clamp_jumps(track: &mut [i64], max_jump: i64) {
    if max_jump <= 0 {
        return;
    }
    for i in 1..track.len() {
        let delta = track[i] - track[i - 1];
        if delta > max_jump {
            track[i] = track[i - 1] + max_jump;
        } else if delta < -max_jump {
            track[i] = track[i - 1] - max_jump;
        }
    }
}

fn median_f64(vals: &mut [f64]) -> f64 {
    vals.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = vals.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        vals[n / 2]
    } else {
        (vals[n / 2 - 1] + vals[n / 2]) * 0.5
    }
}
