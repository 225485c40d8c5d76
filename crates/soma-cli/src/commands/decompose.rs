use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use soma_core::io::image_io::{map_to_frame, save_png};
use soma_core::io::NrrdReader;
use soma_core::separate::{
    compare_methods, DecomposeOptions, FaOptions, IcaOptions, Method, MethodComparison,
    NmfOptions, PixelTimeMatrix,
};

use crate::summary::print_metrics_table;

#[derive(Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Pca,
    Ica,
    Fa,
    Nmf,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Pca => Method::Pca,
            MethodArg::Ica => Method::Ica,
            MethodArg::Fa => Method::FactorAnalysis,
            MethodArg::Nmf => Method::Nmf,
        }
    }
}

#[derive(Args)]
pub struct DecomposeArgs {
    /// Input NRRD movie (already stabilized)
    pub file: PathBuf,

    /// Number of components
    #[arg(short, long, default_value = "8")]
    pub k: usize,

    /// Methods to run
    #[arg(long, value_enum, value_delimiter = ',', default_value = "pca,ica,fa,nmf")]
    pub methods: Vec<MethodArg>,

    /// Divide each pixel by its temporal standard deviation first
    #[arg(long)]
    pub normalize_variance: bool,

    /// Seed for the stochastic methods
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Directory for component maps and the metrics report
    #[arg(short, long, default_value = "decomposition")]
    pub output_dir: PathBuf,
}

pub fn run(args: &DecomposeArgs) -> Result<()> {
    let reader = NrrdReader::open(&args.file)?;
    let frames = reader.frames().collect::<std::result::Result<Vec<_>, _>>()?;

    let mut matrix = PixelTimeMatrix::from_frames(&frames)?;
    if args.normalize_variance {
        matrix.variance_normalize();
    }

    println!(
        "Decomposing {} pixels x {} time points into k = {} components",
        matrix.pixels(),
        matrix.time_points(),
        args.k
    );

    let opts = DecomposeOptions {
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
    };

    let methods: Vec<Method> = args.methods.iter().map(|&m| m.into()).collect();
    let comparisons = compare_methods(&matrix, &methods, args.k, &opts)?;

    let metrics: Vec<_> = comparisons.iter().map(|c| c.metrics.clone()).collect();
    print_metrics_table(&metrics);

    export_maps(&matrix, &comparisons, &args.output_dir)?;

    let report_path = args.output_dir.join("metrics.json");
    fs::write(&report_path, serde_json::to_string_pretty(&metrics)?)
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
    println!("\nComponent maps and report saved to {}", args.output_dir.display());

    Ok(())
}

fn export_maps(
    matrix: &PixelTimeMatrix,
    comparisons: &[MethodComparison],
    output_dir: &Path,
) -> Result<()> {
    for comparison in comparisons {
        let fact = &comparison.factorization;
        let dir = output_dir.join(fact.method.slug());
        fs::create_dir_all(&dir)?;

        for i in 0..fact.k {
            let row: Vec<f64> = fact.spatial.row(i).iter().copied().collect();
            let frame = map_to_frame(&matrix.fold_component(&row));
            save_png(&frame, &dir.join(format!("component_{i:02}.png")))?;
        }
    }
    Ok(())
}
