use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use soma_core::pipeline::config::{PipelineConfig, SeparationConfig, SweepConfig};
use soma_core::separate::{DecomposeOptions, FaOptions, IcaOptions, NmfOptions};
use soma_core::pipeline::run_pipeline_reported;
use soma_core::pipeline::types::{PipelineStage, ProgressReporter};

use crate::summary::{print_metrics_table, print_pipeline_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Input NRRD movie
    pub file: PathBuf,

    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of components per method
    #[arg(short, long, default_value = "8")]
    pub k: usize,

    /// Divide each pixel by its temporal standard deviation first
    #[arg(long)]
    pub normalize_variance: bool,

    /// Seed for the stochastic methods
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Run the NMF stability sweep after the comparison
    #[arg(long)]
    pub sweep: bool,

    /// Output directory
    #[arg(short, long, default_value = "soma_output")]
    pub output_dir: PathBuf,
}

/// Drives one indicatif bar per pipeline stage.
struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl ProgressReporter for CliReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        let pb = match total_items {
            Some(total) => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{msg:28} [{bar:40}] {pos}/{len}")
                        .expect("valid progress template")
                        .progress_chars("=> "),
                );
                pb
            }
            None => ProgressBar::new_spinner(),
        };
        pb.set_message(stage.to_string());
        *self.bar.lock().unwrap() = Some(pb);
    }

    fn advance(&self, items_done: usize) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            pb.set_position(items_done as u64);
        }
    }

    fn finish_stage(&self) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish();
        }
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid pipeline config")?
    } else {
        build_config_from_args(args)
    };

    print_pipeline_summary(&config);

    let summary = run_pipeline_reported(&config, Arc::new(CliReporter::new()))?;

    print_metrics_table(&summary.metrics);

    if let Some(ref report) = summary.sweep {
        let best = report.selected_cell();
        println!(
            "\nSweep selected rank {} with alpha {} (stability {:.4})",
            best.rank, best.alpha, best.stability
        );
    }

    println!(
        "\nStabilized movie saved to {}",
        summary.stabilized_path.display()
    );
    println!("Report saved to {}", config.output_dir.join("report.json").display());

    Ok(())
}

fn build_config_from_args(args: &RunArgs) -> PipelineConfig {
    let separation = SeparationConfig {
        k: args.k,
        normalize_variance: args.normalize_variance,
        options: DecomposeOptions {
            ica: IcaOptions {
                seed: args.seed,
                ..Default::default()
            },
            fa: FaOptions {
                seed: args.seed,
                ..Default::default()
            },
            nmf: NmfOptions {
                seed: args.seed,
                ..Default::default()
            },
        },
        ..Default::default()
    };

    PipelineConfig {
        input: args.file.clone(),
        output_dir: args.output_dir.clone(),
        motion: Default::default(),
        separation,
        sweep: args.sweep.then(SweepConfig::default),
    }
}
