use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{Result, SomaError};
use crate::frame::FrameOffset;

/// Compute the integer displacement of `frame` relative to `template` using
/// FFT phase correlation.
///
/// Returns the displacement plus a confidence value (correlation peak over
/// the mean absolute level of the surface). Shifting the frame by the
/// negated displacement brings it into register with the template.
pub fn phase_offset(template: &Array2<f32>, frame: &Array2<f32>) -> Result<FrameOffset> {
    let (h, w) = template.dim();
    let (th, tw) = frame.dim();
    if h != th || w != tw {
        return Err(SomaError::ShapeMismatch {
            expected_width: w,
            expected_height: h,
            width: tw,
            height: th,
        });
    }

    // Apply Hann window to reduce spectral leakage
    let tpl_windowed = apply_hann(template);
    let frm_windowed = apply_hann(frame);

    // 2D FFT of both
    let tpl_fft = fft2d(&tpl_windowed);
    let frm_fft = fft2d(&frm_windowed);

    // Normalized cross-power spectrum
    let cross_power = normalized_cross_power(&tpl_fft, &frm_fft);

    // Inverse 2D FFT to get correlation surface
    let correlation = ifft2d(&cross_power);

    // Find peak in the correlation surface
    let (peak_row, peak_col, peak_val) = find_peak(&correlation);

    // Convert to signed peak location (handle wrap-around)
    let peak_dy = if peak_row > h / 2 {
        peak_row as i64 - h as i64
    } else {
        peak_row as i64
    };
    let peak_dx = if peak_col > w / 2 {
        peak_col as i64 - w as i64
    } else {
        peak_col as i64
    };

    // The correlation peak sits at the negated displacement of the frame.
    let dx = -peak_dx;
    let dy = -peak_dy;

    let surface_mean = correlation.iter().map(|v| v.abs()).sum::<f64>()
        / (h * w) as f64;
    let confidence = if surface_mean > 1e-12 {
        peak_val / surface_mean
    } else {
        0.0
    };

    Ok(FrameOffset::new(dx, dy, confidence, true))
}

fn apply_hann(data: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    let mut result = Array2::<f32>::zeros((h, w));

    for row in 0..h {
        let wy = 0.5 * (1.0 - (std::f64::consts::TAU * row as f64 / h as f64).cos());
        for col in 0..w {
            let wx = 0.5 * (1.0 - (std::f64::consts::TAU * col as f64 / w as f64).cos());
            result[[row, col]] = data[[row, col]] * (wy * wx) as f32;
        }
    }

    result
}

/// 2D FFT: row-wise FFT, then column-wise FFT.
fn fft2d(data: &Array2<f32>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    // Convert to complex
    let mut result = Array2::<Complex<f64>>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            result[[row, col]] = Complex::new(data[[row, col]] as f64, 0.0);
        }
    }

    // Row-wise FFT
    for row in 0..h {
        let mut row_data: Vec<Complex<f64>> = (0..w).map(|c| result[[row, c]]).collect();
        fft_row.process(&mut row_data);
        for col in 0..w {
            result[[row, col]] = row_data[col];
        }
    }

    // Column-wise FFT
    for col in 0..w {
        let mut col_data: Vec<Complex<f64>> = (0..h).map(|r| result[[r, col]]).collect();
        fft_col.process(&mut col_data);
        for row in 0..h {
            result[[row, col]] = col_data[row];
        }
    }

    result
}

/// Inverse 2D FFT.
fn ifft2d(data: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();

    // Column-wise IFFT
    for col in 0..w {
        let mut col_data: Vec<Complex<f64>> = (0..h).map(|r| work[[r, col]]).collect();
        ifft_col.process(&mut col_data);
        for row in 0..h {
            work[[row, col]] = col_data[row];
        }
    }

    // Row-wise IFFT
    for row in 0..h {
        let mut row_data: Vec<Complex<f64>> = (0..w).map(|c| work[[row, c]]).collect();
        ifft_row.process(&mut row_data);
        for col in 0..w {
            work[[row, col]] = row_data[col];
        }
    }

    // Extract real part and normalize
    let scale = 1.0 / (h * w) as f64;
    let mut result = Array2::<f64>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            result[[row, col]] = work[[row, col]].re * scale;
        }
    }

    result
}

fn normalized_cross_power(
    tpl_fft: &Array2<Complex<f64>>,
    frm_fft: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let (h, w) = tpl_fft.dim();
    let mut result = Array2::<Complex<f64>>::zeros((h, w));

    for row in 0..h {
        for col in 0..w {
            let cross = tpl_fft[[row, col]] * frm_fft[[row, col]].conj();
            let mag = cross.norm();
            result[[row, col]] = if mag > 1e-12 {
                cross / mag
            } else {
                Complex::new(0.0, 0.0)
            };
        }
    }

    result
}

fn find_peak(data: &Array2<f64>) -> (usize, usize, f64) {
    let (h, w) = data.dim();
    let mut best_row = 0;
    let mut best_col = 0;
    let mut best_val = f64::NEG_INFINITY;

    for row in 0..h {
        for col in 0..w {
            if data[[row, col]] > best_val {
                best_val = data[[row, col]];
                best_row = row;
                best_col = col;
            }
        }
    }

    (best_row, best_col, best_val)
}
