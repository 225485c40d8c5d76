#[allow(dead_code)]
mod common;

use tempfile::TempDir;

use soma_core::frame::SampleType;
use soma_core::io::{NrrdReader, NrrdWriter};

#[test]
fn test_read_uint8_movie() {
    let frames = vec![vec![0u8, 255, 128, 64], vec![10u8, 20, 30, 40]];
    let file = common::write_test_nrrd(&common::build_nrrd_u8(2, 2, &frames));

    let reader = NrrdReader::open(file.path()).unwrap();
    assert_eq!(reader.frame_count(), 2);
    assert_eq!(reader.header.width, 2);
    assert_eq!(reader.header.height, 2);
    assert_eq!(reader.header.sample_type, SampleType::Uint8);

    let frame = reader.read_frame(0).unwrap();
    assert!((frame.data[[0, 0]] - 0.0).abs() < 1e-6);
    assert!((frame.data[[0, 1]] - 1.0).abs() < 1e-6);
    assert!((frame.data[[1, 0]] - 128.0 / 255.0).abs() < 1e-6);
    assert!((frame.data[[1, 1]] - 64.0 / 255.0).abs() < 1e-6);

    let frame = reader.read_frame(1).unwrap();
    assert!((frame.data[[0, 0]] - 10.0 / 255.0).abs() < 1e-6);
}

#[test]
fn test_read_uint16_little_endian() {
    let mut buf = common::build_nrrd_header(2, 1, 1, "uint16");
    buf.extend_from_slice(&32768u16.to_le_bytes());
    buf.extend_from_slice(&65535u16.to_le_bytes());
    let file = common::write_test_nrrd(&buf);

    let reader = NrrdReader::open(file.path()).unwrap();
    assert_eq!(reader.header.sample_type, SampleType::Uint16);
    assert!(reader.header.little_endian);

    let frame = reader.read_frame(0).unwrap();
    assert!((frame.data[[0, 0]] - 32768.0 / 65535.0).abs() < 1e-6);
    assert!((frame.data[[0, 1]] - 1.0).abs() < 1e-6);
}

#[test]
fn test_read_uint16_big_endian() {
    let mut buf = common::build_nrrd_header_full(2, 1, 1, "uint16", "big");
    buf.extend_from_slice(&32768u16.to_be_bytes());
    buf.extend_from_slice(&256u16.to_be_bytes());
    let file = common::write_test_nrrd(&buf);

    let reader = NrrdReader::open(file.path()).unwrap();
    assert!(!reader.header.little_endian);

    let frame = reader.read_frame(0).unwrap();
    assert!((frame.data[[0, 0]] - 32768.0 / 65535.0).abs() < 1e-6);
    assert!((frame.data[[0, 1]] - 256.0 / 65535.0).abs() < 1e-6);
}

#[test]
fn test_read_float_clamps_out_of_range() {
    let mut buf = common::build_nrrd_header(3, 1, 1, "float");
    for v in [-0.5f32, 0.25, 2.0] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    let file = common::write_test_nrrd(&buf);

    let reader = NrrdReader::open(file.path()).unwrap();
    let frame = reader.read_frame(0).unwrap();
    assert!((frame.data[[0, 0]] - 0.0).abs() < 1e-6);
    assert!((frame.data[[0, 1]] - 0.25).abs() < 1e-6);
    assert!((frame.data[[0, 2]] - 1.0).abs() < 1e-6);
}

#[test]
fn test_comments_and_unknown_fields_ignored() {
    let header = "NRRD0004\n\
                  # a comment line\n\
                  type: uint8\n\
                  dimension: 3\n\
                  sizes: 2 1 1\n\
                  space directions: (1,0,0) (0,1,0) (0,0,1)\n\
                  encoding: raw\n\
                  endian: little\n\
                  \n";
    let mut buf = header.as_bytes().to_vec();
    buf.extend_from_slice(&[7u8, 9]);
    let file = common::write_test_nrrd(&buf);

    let reader = NrrdReader::open(file.path()).unwrap();
    assert_eq!(reader.frame_count(), 1);
    let frame = reader.read_frame(0).unwrap();
    assert!((frame.data[[0, 0]] - 7.0 / 255.0).abs() < 1e-6);
}

#[test]
fn test_bad_magic_rejected() {
    let file = common::write_test_nrrd(b"NOTNRRD4\ntype: uint8\n\n");
    assert!(NrrdReader::open(file.path()).is_err());
}

#[test]
fn test_bad_version_byte_rejected() {
    let file = common::write_test_nrrd(b"NRRD000x\ntype: uint8\n\n");
    assert!(NrrdReader::open(file.path()).is_err());
}

#[test]
fn test_wrong_dimension_rejected() {
    let header = "NRRD0004\ntype: uint8\ndimension: 2\nsizes: 2 2\nencoding: raw\n\n";
    let mut buf = header.as_bytes().to_vec();
    buf.extend_from_slice(&[0u8; 4]);
    let file = common::write_test_nrrd(&buf);
    assert!(NrrdReader::open(file.path()).is_err());
}

#[test]
fn test_unsupported_encoding_rejected() {
    let header = "NRRD0004\ntype: uint8\ndimension: 3\nsizes: 2 1 1\nencoding: gzip\n\n";
    let file = common::write_test_nrrd(header.as_bytes());
    assert!(NrrdReader::open(file.path()).is_err());
}

#[test]
fn test_missing_blank_line_rejected() {
    let header = "NRRD0004\ntype: uint8\ndimension: 3\nsizes: 2 1 1\nencoding: raw\n";
    let file = common::write_test_nrrd(header.as_bytes());
    assert!(NrrdReader::open(file.path()).is_err());
}

#[test]
fn test_truncated_data_rejected() {
    // Header declares 2 frames but only one frame of bytes follows.
    let mut buf = common::build_nrrd_header(2, 2, 2, "uint8");
    buf.extend_from_slice(&[1u8, 2, 3, 4]);
    let file = common::write_test_nrrd(&buf);
    assert!(NrrdReader::open(file.path()).is_err());
}

#[test]
fn test_frame_index_out_of_range() {
    let frames = vec![vec![0u8; 4], vec![0u8; 4]];
    let file = common::write_test_nrrd(&common::build_nrrd_u8(2, 2, &frames));
    let reader = NrrdReader::open(file.path()).unwrap();
    assert!(reader.read_frame(5).is_err());
}

#[test]
fn test_writer_reader_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("movie.nrrd");

    let frames = common::two_blob_movie(3);
    let mut writer = NrrdWriter::create(&path, 12, 12, 3).unwrap();
    for frame in &frames {
        writer.write_frame(frame).unwrap();
    }
    assert_eq!(writer.frames_written(), 3);
    writer.finalize().unwrap();

    let reader = NrrdReader::open(&path).unwrap();
    assert_eq!(reader.frame_count(), 3);
    assert_eq!(reader.header.sample_type, SampleType::Float);

    for (t, original) in frames.iter().enumerate() {
        let read_back = reader.read_frame(t).unwrap();
        for (a, b) in original.data.iter().zip(read_back.data.iter()) {
            assert!((a - b).abs() < 1e-6, "frame {t}: {a} vs {b}");
        }
    }
}

#[test]
fn test_writer_rejects_wrong_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("movie.nrrd");

    let mut writer = NrrdWriter::create(&path, 12, 12, 1).unwrap();
    let wrong = common::square_frame(8, 8, 1, 1, 4, 1.0);
    assert!(writer.write_frame(&wrong).is_err());
}

#[test]
fn test_source_info() {
    let frames = vec![vec![0u8; 4]; 5];
    let file = common::write_test_nrrd(&common::build_nrrd_u8(2, 2, &frames));
    let reader = NrrdReader::open(file.path()).unwrap();

    let info = reader.source_info(file.path());
    assert_eq!(info.total_frames, 5);
    assert_eq!(info.width, 2);
    assert_eq!(info.height, 2);
    assert_eq!(info.sample_type, SampleType::Uint8);
    assert!(info.little_endian);
}
