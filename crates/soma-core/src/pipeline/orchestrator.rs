use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::io::image_io::{map_to_frame, save_png};
use crate::io::{NrrdReader, NrrdWriter};
use crate::motion::stabilize_with_progress;
use crate::search::{sweep_with_progress, SweepReport};
use crate::separate::{compare_methods, MethodComparison, PixelTimeMatrix};

use super::config::{PipelineConfig, SweepConfig};
use super::types::{NoOpReporter, PipelineStage, PipelineSummary, ProgressReporter};

/// Run the full pipeline with a thread-safe progress reporter.
///
/// Read the movie, stabilize it, write the stabilized copy, factorize the
/// pixels x time matrix with each configured method, export component maps,
/// run the optional stability sweep, and save a JSON report next to the
/// outputs.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineSummary> {
    let reader = NrrdReader::open(&config.input)?;
    let total = reader.frame_count();
    info!(total_frames = total, input = %config.input.display(), "Reading movie");

    reporter.begin_stage(PipelineStage::Reading, Some(total));
    let frames = reader.frames().collect::<Result<Vec<_>>>()?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Stabilizing, Some(total));
    let stabilized =
        stabilize_with_progress(&frames, &config.motion, |done| reporter.advance(done))?;
    reporter.finish_stage();
    info!(
        width = stabilized.crop.width,
        height = stabilized.crop.height,
        "Stabilization complete"
    );

    fs::create_dir_all(&config.output_dir)?;
    let stabilized_path = config.output_dir.join("stabilized.nrrd");

    reporter.begin_stage(PipelineStage::WritingMovie, Some(stabilized.frames.len()));
    let mut writer = NrrdWriter::create(
        &stabilized_path,
        stabilized.crop.width as usize,
        stabilized.crop.height as usize,
        stabilized.frames.len(),
    )?;
    for (i, frame) in stabilized.frames.iter().enumerate() {
        writer.write_frame(frame)?;
        reporter.advance(i + 1);
    }
    writer.finalize()?;
    reporter.finish_stage();

    let mut matrix = PixelTimeMatrix::from_frames(&stabilized.frames)?;
    if config.separation.normalize_variance {
        matrix.variance_normalize();
    }

    reporter.begin_stage(
        PipelineStage::Decomposing,
        Some(config.separation.methods.len()),
    );
    let comparisons = compare_methods(
        &matrix,
        &config.separation.methods,
        config.separation.k,
        &config.separation.options,
    )?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Exporting, None);
    export_component_maps(&matrix, &comparisons, &config.output_dir)?;
    reporter.finish_stage();

    let sweep = match &config.sweep {
        Some(sweep_config) => Some(run_sweep(&matrix, config, sweep_config, &reporter)?),
        None => None,
    };

    let summary = PipelineSummary {
        stabilized_path,
        frames: stabilized.frames.len(),
        crop: stabilized.crop.clone(),
        metrics: comparisons.iter().map(|c| c.metrics.clone()).collect(),
        sweep,
    };

    let report_path = config.output_dir.join("report.json");
    fs::write(&report_path, serde_json::to_string_pretty(&summary)?)?;
    info!(report = %report_path.display(), "Pipeline complete");

    Ok(summary)
}

/// Run the full pipeline without progress reporting.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineSummary> {
    run_pipeline_reported(config, Arc::new(NoOpReporter))
}

fn run_sweep(
    matrix: &PixelTimeMatrix,
    config: &PipelineConfig,
    sweep_config: &SweepConfig,
    reporter: &Arc<dyn ProgressReporter>,
) -> Result<SweepReport> {
    let cells = sweep_config.ranks.len() * sweep_config.alphas.len();
    reporter.begin_stage(PipelineStage::Sweeping, Some(cells));
    let report = sweep_with_progress(
        matrix,
        &sweep_config.ranks,
        &sweep_config.alphas,
        &config.separation.options.nmf,
        sweep_config.runs,
        |done, _| reporter.advance(done),
    )?;
    reporter.finish_stage();

    let best = report.selected_cell();
    info!(
        rank = best.rank,
        alpha = best.alpha,
        stability = best.stability,
        "Sweep selected configuration"
    );
    Ok(report)
}

/// Write each spatial component of each method as a normalized grayscale
/// PNG under `<output>/components/<method>/`.
fn export_component_maps(
    matrix: &PixelTimeMatrix,
    comparisons: &[MethodComparison],
    output_dir: &Path,
) -> Result<()> {
    for comparison in comparisons {
        let fact = &comparison.factorization;
        let dir = output_dir.join("components").join(fact.method.slug());
        fs::create_dir_all(&dir)?;

        for i in 0..fact.k {
            let row: Vec<f64> = fact.spatial.row(i).iter().copied().collect();
            let map = matrix.fold_component(&row);
            let frame = map_to_frame(&map);
            save_png(&frame, &dir.join(format!("component_{i:02}.png")))?;
        }
    }
    Ok(())
}
