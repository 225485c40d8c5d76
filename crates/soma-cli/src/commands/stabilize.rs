use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use soma_core::io::{NrrdReader, NrrdWriter};
use soma_core::motion::stabilize_with_progress;
use soma_core::pipeline::config::MotionConfig;

#[derive(Args)]
pub struct StabilizeArgs {
    /// Input NRRD movie
    pub file: PathBuf,

    /// Fraction of highest-contrast frames used for the template (0-1)
    #[arg(long, default_value = "0.2")]
    pub template_fraction: f64,

    /// Median filter window applied to the offset tracks
    #[arg(long, default_value = "5")]
    pub median_window: usize,

    /// Gaussian smoothing sigma applied to the offset tracks
    #[arg(long, default_value = "1.0")]
    pub sigma: f64,

    /// Largest allowed frame-to-frame offset change in pixels
    #[arg(long, default_value = "5")]
    pub max_jump: i64,

    /// Write per-frame offsets to a CSV file
    #[arg(long)]
    pub offsets: Option<PathBuf>,

    /// Output NRRD path
    #[arg(short, long, default_value = "stabilized.nrrd")]
    pub output: PathBuf,
}

pub fn run(args: &StabilizeArgs) -> Result<()> {
    let reader = NrrdReader::open(&args.file)?;
    let total = reader.frame_count();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Reading frames");

    let frames: Vec<_> = reader
        .frames()
        .enumerate()
        .map(|(i, f)| {
            pb.set_position(i as u64 + 1);
            f
        })
        .collect::<std::result::Result<_, _>>()?;

    let config = MotionConfig {
        template_fraction: args.template_fraction,
        median_window: args.median_window,
        smoothing_sigma: args.sigma,
        max_jump: args.max_jump,
        ..Default::default()
    };

    pb.set_position(0);
    pb.set_message("Estimating offsets");
    let stabilized = stabilize_with_progress(&frames, &config, |done| {
        pb.set_position(done as u64);
    })?;
    pb.finish_with_message("Stabilized");

    let mut writer = NrrdWriter::create(
        &args.output,
        stabilized.crop.width as usize,
        stabilized.crop.height as usize,
        stabilized.frames.len(),
    )?;
    for frame in &stabilized.frames {
        writer.write_frame(frame)?;
    }
    writer.finalize()?;

    if let Some(ref offsets_path) = args.offsets {
        let mut csv = String::from("frame,dx,dy,confidence,reliable\n");
        for (i, o) in stabilized.offsets.iter().enumerate() {
            csv.push_str(&format!(
                "{},{},{},{:.4},{}\n",
                i, o.dx, o.dy, o.confidence, o.reliable
            ));
        }
        fs::write(offsets_path, csv)
            .with_context(|| format!("Failed to write offsets to {}", offsets_path.display()))?;
        println!("Offsets saved to {}", offsets_path.display());
    }

    let unreliable = stabilized.offsets.iter().filter(|o| !o.reliable).count();
    println!(
        "\nStabilized {} frames, cropped to {}x{} (origin {},{})",
        stabilized.frames.len(),
        stabilized.crop.width,
        stabilized.crop.height,
        stabilized.crop.x,
        stabilized.crop.y
    );
    if unreliable > 0 {
        println!("{unreliable} frame(s) had unreliable offsets, interpolated from neighbors");
    }
    println!("Output saved to {}", args.output.display());

    Ok(())
}
