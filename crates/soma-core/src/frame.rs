use ndarray::Array2;
use std::path::PathBuf;

/// A single grayscale image frame.
/// Pixel values are f32 in [0.0, 1.0].
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Original bit depth before conversion (8, 16 or 32)
    pub original_bit_depth: u8,
    /// Optional per-frame metadata
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
            metadata: FrameMetadata::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    pub frame_index: usize,
    pub timestamp_us: Option<u64>,
}

/// Rigid displacement of a frame relative to the template.
///
/// Shifting the frame by (-dx, -dy) brings it into register with the
/// template. Offsets are integer pixels; subpixel motion is not modeled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOffset {
    pub dx: i64,
    pub dy: i64,
    /// Peak value over the mean of the correlation surface.
    pub confidence: f64,
    /// False for degenerate frames (near-uniform content or weak peak);
    /// such offsets are interpolated from neighbors during smoothing.
    pub reliable: bool,
}

impl FrameOffset {
    pub fn new(dx: i64, dy: i64, confidence: f64, reliable: bool) -> Self {
        Self {
            dx,
            dy,
            confidence,
            reliable,
        }
    }
}

/// Sample type of the raw movie data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SampleType {
    Uint8,
    Uint16,
    Float,
}

impl SampleType {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleType::Uint8 => 1,
            SampleType::Uint16 => 2,
            SampleType::Float => 4,
        }
    }

    pub fn bit_depth(self) -> u8 {
        match self {
            SampleType::Uint8 => 8,
            SampleType::Uint16 => 16,
            SampleType::Float => 32,
        }
    }
}

/// Metadata about the source file.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub filename: PathBuf,
    pub total_frames: usize,
    pub width: u32,
    pub height: u32,
    pub sample_type: SampleType,
    pub little_endian: bool,
}
