use thiserror::Error;

#[derive(Error, Debug)]
pub enum SomaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid NRRD file: {0}")]
    InvalidNrrd(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Unsupported sample type: {0}")]
    UnsupportedSampleType(String),

    #[error("Frame shape mismatch: expected {expected_height}x{expected_width}, got {height}x{width}")]
    ShapeMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Invalid crop: {0}")]
    InvalidCrop(String),

    #[error("Factorization error: {0}")]
    Factorization(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SomaError>;
