use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Result, SomaError};
use crate::frame::Frame;

/// Writes a raw-encoded float32 NRRD movie at the byte level.
pub struct NrrdWriter {
    writer: BufWriter<File>,
    width: usize,
    height: usize,
    frame_count: usize,
    frames_written: usize,
}

impl NrrdWriter {
    /// Create a new NRRD file and write the header.
    pub fn create(path: &Path, width: usize, height: usize, frame_count: usize) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "NRRD0004")?;
        writeln!(writer, "type: float")?;
        writeln!(writer, "dimension: 3")?;
        writeln!(writer, "sizes: {width} {height} {frame_count}")?;
        writeln!(writer, "encoding: raw")?;
        writeln!(writer, "endian: little")?;
        writeln!(writer)?;
        Ok(Self {
            writer,
            width,
            height,
            frame_count,
            frames_written: 0,
        })
    }

    /// Write a single frame (shape must match the declared dimensions).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.height() != self.height || frame.width() != self.width {
            return Err(SomaError::ShapeMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width: frame.width(),
                height: frame.height(),
            });
        }
        let mut buf = vec![0u8; self.width * 4];
        for row in frame.data.rows() {
            for (chunk, &v) in buf.chunks_exact_mut(4).zip(row.iter()) {
                LittleEndian::write_f32(chunk, v);
            }
            self.writer.write_all(&buf)?;
        }
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Flush and finalize the file.
    pub fn finalize(mut self) -> Result<()> {
        debug_assert_eq!(self.frames_written, self.frame_count);
        self.writer.flush()?;
        Ok(())
    }
}
