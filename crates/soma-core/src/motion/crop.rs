use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SomaError};
use crate::frame::{Frame, FrameOffset};

/// A rectangle in image coordinates for cropping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Validate the crop rect against the source dimensions.
    pub fn validated(&self, src_w: u32, src_h: u32) -> Result<CropRect> {
        if self.width == 0 || self.height == 0 {
            return Err(SomaError::InvalidCrop(
                "Crop width and height must be > 0".into(),
            ));
        }

        if self.x + self.width > src_w || self.y + self.height > src_h {
            return Err(SomaError::InvalidCrop(format!(
                "Crop region ({},{} {}x{}) exceeds source dimensions ({src_w}x{src_h})",
                self.x, self.y, self.width, self.height
            )));
        }

        Ok(self.clone())
    }
}

/// Compute the maximal rectangle of pixels valid in every frame after each
/// frame is shifted by its negated offset. Pixels outside the rectangle were
/// zero-padded in at least one shifted frame.
pub fn compute_crop_rect(
    offsets: &[FrameOffset],
    width: usize,
    height: usize,
) -> Result<CropRect> {
    if offsets.is_empty() {
        return Err(SomaError::EmptySequence);
    }

    let mut min_sx = i64::MAX;
    let mut max_sx = i64::MIN;
    let mut min_sy = i64::MAX;
    let mut max_sy = i64::MIN;

    for offset in offsets {
        let sx = -offset.dx;
        let sy = -offset.dy;
        min_sx = min_sx.min(sx);
        max_sx = max_sx.max(sx);
        min_sy = min_sy.min(sy);
        max_sy = max_sy.max(sy);
    }

    let x0 = max_sx.max(0);
    let x1 = width as i64 + min_sx.min(0);
    let y0 = max_sy.max(0);
    let y1 = height as i64 + min_sy.min(0);

    if x1 <= x0 || y1 <= y0 {
        return Err(SomaError::InvalidCrop(
            "Offsets leave no common valid region".into(),
        ));
    }

    let rect = CropRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    };
    rect.validated(width as u32, height as u32)
}

/// Crop an array to the given rectangle.
pub fn crop_array(data: &Array2<f32>, rect: &CropRect) -> Array2<f32> {
    let y0 = rect.y as usize;
    let x0 = rect.x as usize;
    data.slice(s![
        y0..y0 + rect.height as usize,
        x0..x0 + rect.width as usize
    ])
    .to_owned()
}

/// Crop a frame to the given rectangle, preserving metadata.
pub fn crop_frame(frame: &Frame, rect: &CropRect) -> Frame {
    let mut cropped = Frame::new(crop_array(&frame.data, rect), frame.original_bit_depth);
    cropped.metadata = frame.metadata.clone();
    cropped
}
