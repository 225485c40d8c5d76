use ndarray::Array2;

use soma_core::frame::Frame;

/// Build an NRRD header for a raw-encoded little-endian movie.
pub fn build_nrrd_header(
    width: usize,
    height: usize,
    num_frames: usize,
    sample_type: &str,
) -> Vec<u8> {
    build_nrrd_header_full(width, height, num_frames, sample_type, "little")
}

/// Build an NRRD header with an explicit byte order.
///
/// `sample_type`: uint8, uint16 or float. `endian`: little or big.
pub fn build_nrrd_header_full(
    width: usize,
    height: usize,
    num_frames: usize,
    sample_type: &str,
    endian: &str,
) -> Vec<u8> {
    format!(
        "NRRD0004\n\
         type: {sample_type}\n\
         dimension: 3\n\
         sizes: {width} {height} {num_frames}\n\
         encoding: raw\n\
         endian: {endian}\n\
         \n"
    )
    .into_bytes()
}

/// Build a complete synthetic uint8 NRRD movie with the given frame data.
pub fn build_nrrd_u8(width: usize, height: usize, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_nrrd_header(width, height, frames.len(), "uint8");
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Write an NRRD buffer to a temporary file and return the temp file handle.
///
/// The file stays alive as long as the returned `NamedTempFile` is not dropped.
pub fn write_test_nrrd(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    f.write_all(data).expect("write NRRD data");
    f.flush().expect("flush");
    f
}

/// Frame with a bright square on a black background.
pub fn square_frame(
    height: usize,
    width: usize,
    top: usize,
    left: usize,
    size: usize,
    value: f32,
) -> Frame {
    let mut data = Array2::<f32>::zeros((height, width));
    for r in top..(top + size).min(height) {
        for c in left..(left + size).min(width) {
            data[[r, c]] = value;
        }
    }
    Frame::new(data, 8)
}

/// Movie whose bright square drifts along the given per-frame displacements.
///
/// Frame t holds a 10x10 square at (10 + dy, 10 + dx) for drift[t] = (dx, dy).
pub fn drifting_square_movie(height: usize, width: usize, drift: &[(i64, i64)]) -> Vec<Frame> {
    drift
        .iter()
        .map(|&(dx, dy)| {
            square_frame(height, width, (10 + dy) as usize, (10 + dx) as usize, 10, 1.0)
        })
        .collect()
}

/// Rank-two movie: two disjoint 3x3 blobs on a black 12x12 background, one
/// following a sine trace and the other a cosine trace.
pub fn two_blob_movie(time_points: usize) -> Vec<Frame> {
    (0..time_points)
        .map(|t| {
            let phase = std::f64::consts::TAU * t as f64 / time_points as f64;
            let trace_a = (0.5 + 0.4 * phase.sin()) as f32;
            let trace_b = (0.5 + 0.4 * phase.cos()) as f32;

            let mut data = Array2::<f32>::zeros((12, 12));
            for r in 2..5 {
                for c in 2..5 {
                    data[[r, c]] = trace_a;
                }
            }
            for r in 7..10 {
                for c in 7..10 {
                    data[[r, c]] = trace_b;
                }
            }
            Frame::new(data, 8)
        })
        .collect()
}

/// Rank-one movie: a single blob with a sinusoidal trace.
pub fn single_blob_movie(time_points: usize) -> Vec<Frame> {
    (0..time_points)
        .map(|t| {
            let phase = std::f64::consts::TAU * t as f64 / time_points as f64;
            let trace = (0.5 + 0.4 * phase.sin()) as f32;

            let mut data = Array2::<f32>::zeros((12, 12));
            for r in 4..8 {
                for c in 4..8 {
                    data[[r, c]] = trace;
                }
            }
            Frame::new(data, 8)
        })
        .collect()
}
