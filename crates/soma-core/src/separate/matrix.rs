use nalgebra::DMatrix;
use ndarray::Array2;

use crate::error::{Result, SomaError};
use crate::frame::Frame;

/// A stabilized movie reshaped to pixels x time.
///
/// Column t holds frame t flattened in row-major order. The frame shape is
/// retained so component rows can be folded back into images.
#[derive(Clone, Debug)]
pub struct PixelTimeMatrix {
    pub data: DMatrix<f64>,
    pub height: usize,
    pub width: usize,
}

impl PixelTimeMatrix {
    pub fn from_frames(frames: &[Frame]) -> Result<Self> {
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

        let pixels = h * w;
        let mut data = DMatrix::<f64>::zeros(pixels, frames.len());
        for (t, frame) in frames.iter().enumerate() {
            for (p, &v) in frame.data.iter().enumerate() {
                data[(p, t)] = v as f64;
            }
        }

        Ok(Self {
            data,
            height: h,
            width: w,
        })
    }

    pub fn pixels(&self) -> usize {
        self.data.nrows()
    }

    pub fn time_points(&self) -> usize {
        self.data.ncols()
    }

    /// Divide each pixel row by its temporal standard deviation, boosting
    /// low-amplitude sources. Rows with near-zero variance are left as is.
    pub fn variance_normalize(&mut self) {
        let t = self.time_points() as f64;
        for mut row in self.data.row_iter_mut() {
            let mean = row.sum() / t;
            let var = row.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / t;
            let sd = var.sqrt();
            if sd > 1e-12 {
                for v in row.iter_mut() {
                    *v /= sd;
                }
            }
        }
    }

    /// Fold a pixel-space component row back into an image.
    pub fn fold_component(&self, component: &[f64]) -> Array2<f32> {
        debug_assert_eq!(component.len(), self.pixels());
        let mut map = Array2::<f32>::zeros((self.height, self.width));
        for (p, &v) in component.iter().enumerate() {
            map[[p / self.width, p % self.width]] = v as f32;
        }
        map
    }
}
