use std::fs::File;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use memmap2::Mmap;
use ndarray::Array2;

use crate::error::{Result, SomaError};
use crate::frame::{Frame, FrameMetadata, SampleType, SourceInfo};

pub const NRRD_MAGIC_PREFIX: &[u8; 7] = b"NRRD000";

/// Parsed NRRD header (subset: 3-D raw-encoded grayscale movies).
#[derive(Clone, Debug)]
pub struct NrrdHeader {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub sample_type: SampleType,
    pub little_endian: bool,
    /// Byte offset of the raw data section (first byte after the blank line).
    pub data_offset: usize,
}

impl NrrdHeader {
    /// Total bytes per frame.
    pub fn frame_byte_size(&self) -> usize {
        let pixels = (self.width as usize)
            .checked_mul(self.height as usize)
            .expect("Image dimensions too large");
        pixels
            .checked_mul(self.sample_type.bytes_per_sample())
            .expect("Frame size calculation overflow")
    }
}

/// Memory-mapped NRRD movie reader.
pub struct NrrdReader {
    mmap: Mmap,
    pub header: NrrdHeader,
}

impl NrrdReader {
    /// Open an NRRD file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < 8 || &mmap[0..7] != NRRD_MAGIC_PREFIX {
            return Err(SomaError::InvalidNrrd("Missing NRRD000x magic".into()));
        }
        if !mmap[7].is_ascii_digit() {
            return Err(SomaError::InvalidNrrd(format!(
                "Invalid NRRD version byte: 0x{:02x}",
                mmap[7]
            )));
        }

        let header = parse_header(&mmap)?;

        let expected_data_size =
            header.data_offset + header.frame_byte_size() * header.frame_count as usize;
        if mmap.len() < expected_data_size {
            return Err(SomaError::InvalidNrrd(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(SomaError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        let offset = self.header.data_offset + index * self.header.frame_byte_size();
        let end = offset + self.header.frame_byte_size();
        Ok(&self.mmap[offset..end])
    }

    /// Read a single frame, converting to f32 in [0.0, 1.0].
    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        let raw = self.frame_raw(index)?;
        let h = self.header.height as usize;
        let w = self.header.width as usize;

        let data = decode_samples(raw, h, w, self.header.sample_type, self.header.little_endian);

        let mut frame = Frame::new(data, self.header.sample_type.bit_depth());
        frame.metadata = FrameMetadata {
            frame_index: index,
            timestamp_us: None,
        };
        Ok(frame)
    }

    /// Build SourceInfo from the header.
    pub fn source_info(&self, path: &Path) -> SourceInfo {
        SourceInfo {
            filename: path.to_path_buf(),
            total_frames: self.frame_count(),
            width: self.header.width,
            height: self.header.height,
            sample_type: self.header.sample_type,
            little_endian: self.header.little_endian,
        }
    }

    /// Iterator over all frames.
    pub fn frames(&self) -> impl Iterator<Item = Result<Frame>> + '_ {
        (0..self.frame_count()).map(move |i| self.read_frame(i))
    }
}

fn parse_header(buf: &[u8]) -> Result<NrrdHeader> {
    let mut dimension: Option<usize> = None;
    let mut sizes: Option<Vec<usize>> = None;
    let mut sample_type: Option<SampleType> = None;
    let mut encoding: Option<String> = None;
    let mut little_endian = true;

    let mut offset = 0usize;
    let mut first_line = true;
    let mut data_offset: Option<usize> = None;

    while offset < buf.len() {
        let Some(pos) = buf[offset..].iter().position(|&b| b == b'\n') else {
            break;
        };
        let line = std::str::from_utf8(&buf[offset..offset + pos])
            .map_err(|_| SomaError::InvalidNrrd("Header is not valid ASCII".into()))?
            .trim_end_matches('\r');
        offset += pos + 1;

        if first_line {
            // Magic line, already validated by the caller.
            first_line = false;
            continue;
        }
        if line.is_empty() {
            data_offset = Some(offset);
            break;
        }
        if line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            return Err(SomaError::InvalidNrrd(format!(
                "Malformed header line: {line:?}"
            )));
        };
        let value = value.trim();

        match key.trim() {
            "dimension" => {
                dimension = Some(value.parse().map_err(|_| {
                    SomaError::InvalidNrrd(format!("Invalid dimension value: {value:?}"))
                })?);
            }
            "sizes" => {
                let parsed: std::result::Result<Vec<usize>, _> =
                    value.split_whitespace().map(str::parse).collect();
                sizes = Some(parsed.map_err(|_| {
                    SomaError::InvalidNrrd(format!("Invalid sizes value: {value:?}"))
                })?);
            }
            "type" => {
                sample_type = Some(parse_sample_type(value)?);
            }
            "encoding" => {
                encoding = Some(value.to_string());
            }
            "endian" => {
                little_endian = match value {
                    "little" => true,
                    "big" => false,
                    other => {
                        return Err(SomaError::InvalidNrrd(format!(
                            "Invalid endian value: {other:?}"
                        )))
                    }
                };
            }
            // Unknown fields are permitted by the format and ignored here.
            _ => {}
        }
    }

    let data_offset = data_offset
        .ok_or_else(|| SomaError::InvalidNrrd("Header not terminated by a blank line".into()))?;

    match dimension {
        Some(3) => {}
        Some(d) => {
            return Err(SomaError::InvalidNrrd(format!(
                "Unsupported dimension: {d} (expected 3)"
            )))
        }
        None => return Err(SomaError::InvalidNrrd("Missing dimension field".into())),
    }

    match encoding.as_deref() {
        Some("raw") => {}
        Some(e) => {
            return Err(SomaError::InvalidNrrd(format!(
                "Unsupported encoding: {e:?} (expected raw)"
            )))
        }
        None => return Err(SomaError::InvalidNrrd("Missing encoding field".into())),
    }

    let sample_type =
        sample_type.ok_or_else(|| SomaError::InvalidNrrd("Missing type field".into()))?;
    let sizes = sizes.ok_or_else(|| SomaError::InvalidNrrd("Missing sizes field".into()))?;
    if sizes.len() != 3 {
        return Err(SomaError::InvalidNrrd(format!(
            "Expected 3 sizes, got {}",
            sizes.len()
        )));
    }

    // Axis order is fastest-varying first: width, height, time.
    let (width, height, frame_count) = (sizes[0] as u32, sizes[1] as u32, sizes[2] as u32);
    if width == 0 || height == 0 {
        return Err(SomaError::InvalidDimensions { width, height });
    }

    Ok(NrrdHeader {
        width,
        height,
        frame_count,
        sample_type,
        little_endian,
        data_offset,
    })
}

fn parse_sample_type(value: &str) -> Result<SampleType> {
    match value {
        "uint8" | "uchar" | "unsigned char" => Ok(SampleType::Uint8),
        "uint16" | "ushort" | "unsigned short" => Ok(SampleType::Uint16),
        "float" => Ok(SampleType::Float),
        other => Err(SomaError::UnsupportedSampleType(other.to_string())),
    }
}

fn decode_samples(
    raw: &[u8],
    height: usize,
    width: usize,
    sample_type: SampleType,
    little_endian: bool,
) -> Array2<f32> {
    let mut data = Array2::<f32>::zeros((height, width));

    for row in 0..height {
        for col in 0..width {
            let idx = (row * width + col) * sample_type.bytes_per_sample();
            let val = match sample_type {
                SampleType::Uint8 => raw[idx] as f32 / 255.0,
                SampleType::Uint16 => {
                    let v = if little_endian {
                        LittleEndian::read_u16(&raw[idx..idx + 2])
                    } else {
                        BigEndian::read_u16(&raw[idx..idx + 2])
                    };
                    v as f32 / 65535.0
                }
                SampleType::Float => {
                    let v = if little_endian {
                        LittleEndian::read_f32(&raw[idx..idx + 4])
                    } else {
                        BigEndian::read_f32(&raw[idx..idx + 4])
                    };
                    v.clamp(0.0, 1.0)
                }
            };
            data[[row, col]] = val;
        }
    }

    data
}
