#[allow(dead_code)]
mod common;

use soma_core::io::NrrdReader;
use soma_core::motion::stabilize;
use soma_core::pipeline::{
    run_pipeline, MotionConfig, PipelineConfig, PipelineSummary, SeparationConfig, SweepConfig,
};
use soma_core::separate::{compare_methods, DecomposeOptions, Method, PixelTimeMatrix};

/// 32x32 uint8 movie with two 8x8 blobs whose brightness follows sine and
/// cosine traces while the whole scene jitters by up to one pixel per axis.
fn jittered_two_blob_nrrd(num_frames: usize) -> Vec<u8> {
    let (width, height) = (32usize, 32usize);
    let mut frames = Vec::with_capacity(num_frames);

    for t in 0..num_frames {
        let phase = std::f64::consts::TAU * t as f64 / num_frames as f64;
        let value_a = (150.0 + 50.0 * phase.sin()).round() as u8;
        let value_b = (150.0 + 50.0 * phase.cos()).round() as u8;

        let dx = (t % 3) as i64 - 1;
        let dy = ((t + 1) % 3) as i64 - 1;

        let mut data = vec![0u8; width * height];
        let mut paint = |top: i64, left: i64, value: u8| {
            for r in top..top + 8 {
                for c in left..left + 8 {
                    data[r as usize * width + c as usize] = value;
                }
            }
        };
        paint(6 + dy, 6 + dx, value_a);
        paint(18 + dy, 18 + dx, value_b);
        frames.push(data);
    }

    common::build_nrrd_u8(width, height, &frames)
}

/// Motion settings that apply the estimated offsets verbatim, so the known
/// integer jitter is undone exactly.
fn exact_motion_config() -> MotionConfig {
    MotionConfig {
        median_window: 1,
        smoothing_sigma: 0.0,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_full_pipeline_end_to_end() {
    let input = common::write_test_nrrd(&jittered_two_blob_nrrd(12));
    let output = tempfile::TempDir::new().expect("create output dir");

    let config = PipelineConfig {
        input: input.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        motion: exact_motion_config(),
        separation: SeparationConfig {
            methods: vec![Method::Pca, Method::Nmf],
            k: 2,
            ..Default::default()
        },
        sweep: None,
    };

    let summary = run_pipeline(&config).expect("pipeline run");

    assert_eq!(summary.frames, 12);
    assert!(summary.sweep.is_none());

    // One pixel of jitter per side is trimmed from each axis.
    assert_eq!(summary.crop.width, 30);
    assert_eq!(summary.crop.height, 30);

    // Methods report in the configured order.
    assert_eq!(summary.metrics.len(), 2);
    assert_eq!(summary.metrics[0].method, Method::Pca);
    assert_eq!(summary.metrics[1].method, Method::Nmf);
    for m in &summary.metrics {
        assert_eq!(m.k, 2);
        assert!(m.rmse.is_finite());
    }

    // Exact stabilization leaves a centered rank-two movie, which PCA with
    // two components reconstructs to machine precision. The blobs are
    // non-negative on a black background, so NMF fits them well too.
    assert!(summary.metrics[0].rmse < 1e-6, "pca rmse = {}", summary.metrics[0].rmse);
    assert!(
        summary.metrics[0].explained_variance > 0.99,
        "pca ev = {}",
        summary.metrics[0].explained_variance
    );
    assert!(
        summary.metrics[1].explained_variance > 0.9,
        "nmf ev = {}",
        summary.metrics[1].explained_variance
    );

    // The stabilized movie is a readable NRRD with the cropped geometry.
    let stabilized = NrrdReader::open(&summary.stabilized_path).expect("reopen stabilized");
    assert_eq!(stabilized.frame_count(), 12);
    assert_eq!(stabilized.header.width, 30);
    assert_eq!(stabilized.header.height, 30);

    // Component maps land under components/<method>/.
    for method in ["pca", "nmf"] {
        for i in 0..2 {
            let png = output
                .path()
                .join("components")
                .join(method)
                .join(format!("component_{i:02}.png"));
            assert!(png.exists(), "missing {}", png.display());
        }
    }

    // The JSON report round-trips into the summary type.
    let report = std::fs::read_to_string(output.path().join("report.json")).expect("read report");
    let parsed: PipelineSummary = serde_json::from_str(&report).expect("parse report");
    assert_eq!(parsed.frames, 12);
    assert_eq!(parsed.metrics.len(), 2);
}

#[test]
fn test_pipeline_with_sweep() {
    let input = common::write_test_nrrd(&jittered_two_blob_nrrd(12));
    let output = tempfile::TempDir::new().expect("create output dir");

    let config = PipelineConfig {
        input: input.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        motion: exact_motion_config(),
        separation: SeparationConfig {
            methods: vec![Method::Nmf],
            k: 2,
            ..Default::default()
        },
        sweep: Some(SweepConfig {
            ranks: vec![2],
            alphas: vec![0.0],
            runs: 2,
        }),
    };

    let summary = run_pipeline(&config).expect("pipeline run");
    assert_eq!(summary.metrics.len(), 1);

    let sweep = summary.sweep.expect("sweep report");
    assert_eq!(sweep.cells.len(), 1);
    assert_eq!(sweep.runs, 2);

    let best = sweep.selected_cell();
    assert_eq!(best.rank, 2);
    assert!(best.alpha.abs() < 1e-12);
    assert!(
        best.stability > 0.5 && best.stability <= 1.0 + 1e-9,
        "stability = {}",
        best.stability
    );
}

// ---------------------------------------------------------------------------
// Manual pipeline, step by step
// ---------------------------------------------------------------------------

#[test]
fn test_manual_read_stabilize_decompose() {
    let input = common::write_test_nrrd(&jittered_two_blob_nrrd(12));

    let reader = NrrdReader::open(input.path()).expect("open movie");
    assert_eq!(reader.frame_count(), 12);
    let frames: Vec<_> = reader
        .frames()
        .collect::<Result<_, _>>()
        .expect("read frames");

    let stabilized = stabilize(&frames, &exact_motion_config()).expect("stabilize");
    assert_eq!(stabilized.offsets.len(), 12);
    assert_eq!(stabilized.frames.len(), 12);
    assert!(stabilized.offsets.iter().all(|o| o.reliable));

    let matrix = PixelTimeMatrix::from_frames(&stabilized.frames).expect("build matrix");
    assert_eq!(matrix.pixels(), 900);
    assert_eq!(matrix.time_points(), 12);

    let comparisons = compare_methods(&matrix, &[Method::Pca], 2, &DecomposeOptions::default())
        .expect("decompose");
    assert_eq!(comparisons.len(), 1);

    let metrics = &comparisons[0].metrics;
    assert_eq!(metrics.method, Method::Pca);
    assert_eq!(metrics.k, 2);
    assert!(metrics.rmse < 1e-6, "rmse = {}", metrics.rmse);
    assert!(
        metrics.explained_variance > 0.99,
        "ev = {}",
        metrics.explained_variance
    );
}
