use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use soma_core::io::NrrdReader;
use soma_core::search::sweep_with_progress;
use soma_core::separate::{NmfOptions, PixelTimeMatrix};

#[derive(Args)]
pub struct SweepArgs {
    /// Input NRRD movie (already stabilized)
    pub file: PathBuf,

    /// Comma-separated component counts to evaluate
    #[arg(long, default_value = "4,8,12,16")]
    pub ranks: String,

    /// Comma-separated L1 regularization strengths to evaluate
    #[arg(long, default_value = "0.0,0.01,0.1")]
    pub alphas: String,

    /// Seeded NMF runs per grid cell
    #[arg(long, default_value = "5")]
    pub runs: usize,

    /// Base seed for the NMF runs
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Save the full report as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &SweepArgs) -> Result<()> {
    let ranks: Vec<usize> = args
        .ranks
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    let alphas: Vec<f64> = args
        .alphas
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let reader = NrrdReader::open(&args.file)?;
    let frames = reader.frames().collect::<std::result::Result<Vec<_>, _>>()?;
    let matrix = PixelTimeMatrix::from_frames(&frames)?;

    let cells = ranks.len() * alphas.len();
    println!(
        "Sweeping {} rank(s) x {} alpha(s), {} runs per cell",
        ranks.len(),
        alphas.len(),
        args.runs
    );

    let pb = ProgressBar::new(cells as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Evaluating grid");

    let opts = NmfOptions {
        seed: args.seed,
        ..Default::default()
    };
    let report = sweep_with_progress(&matrix, &ranks, &alphas, &opts, args.runs, |done, _| {
        pb.set_position(done as u64);
    })?;
    pb.finish_with_message("Sweep complete");

    let selected = Style::new().green().bold();
    println!(
        "\n{:>6}  {:>8}  {:>10}  {:>10}",
        "Rank", "Alpha", "Stability", "RMSE"
    );
    println!("{}", "-".repeat(40));
    for (i, cell) in report.cells.iter().enumerate() {
        let line = format!(
            "{:>6}  {:>8.3}  {:>10.4}  {:>10.6}",
            cell.rank, cell.alpha, cell.stability, cell.mean_rmse
        );
        if i == report.selected {
            println!("{} *", selected.apply_to(line));
        } else {
            println!("{line}");
        }
    }

    let best = report.selected_cell();
    println!(
        "\nSelected rank {} with alpha {} (stability {:.4})",
        best.rank, best.alpha, best.stability
    );

    if let Some(ref path) = args.output {
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("Report saved to {}", path.display());
    }

    Ok(())
}
