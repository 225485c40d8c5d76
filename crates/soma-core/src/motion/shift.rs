use ndarray::Array2;

use crate::frame::Frame;

/// Shift an array by integer (dx, dy). Pixels sampled from outside the
/// source support are zero.
pub fn shift_array(data: &Array2<f32>, dx: i64, dy: i64) -> Array2<f32> {
    let (h, w) = data.dim();
    let mut result = Array2::<f32>::zeros((h, w));

    for row in 0..h {
        let src_row = row as i64 - dy;
        if src_row < 0 || src_row >= h as i64 {
            continue;
        }
        for col in 0..w {
            let src_col = col as i64 - dx;
            if src_col < 0 || src_col >= w as i64 {
                continue;
            }
            result[[row, col]] = data[[src_row as usize, src_col as usize]];
        }
    }

    result
}

/// Shift a frame by integer (dx, dy), preserving metadata.
pub fn shift_frame(frame: &Frame, dx: i64, dy: i64) -> Frame {
    let mut shifted = Frame::new(
        shift_array(&frame.data, dx, dy),
        frame.original_bit_depth,
    );
    shifted.metadata = frame.metadata.clone();
    shifted
}
