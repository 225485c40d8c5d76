pub mod image_io;
pub mod nrrd;
pub mod nrrd_writer;

pub use nrrd::{NrrdHeader, NrrdReader};
pub use nrrd_writer::NrrdWriter;
