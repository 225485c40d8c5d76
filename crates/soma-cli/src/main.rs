mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "soma", about = "Calcium imaging movie processing tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show NRRD movie metadata
    Info(commands::info::InfoArgs),
    /// Motion-correct a movie
    Stabilize(commands::stabilize::StabilizeArgs),
    /// Factorize a movie and compare methods
    Decompose(commands::decompose::DecomposeArgs),
    /// Search NMF rank and regularization for stability
    Sweep(commands::sweep::SweepArgs),
    /// Run the full processing pipeline
    Run(commands::pipeline::RunArgs),
    /// Print or save a default pipeline config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Stabilize(args) => commands::stabilize::run(args),
        Commands::Decompose(args) => commands::decompose::run(args),
        Commands::Sweep(args) => commands::sweep::run(args),
        Commands::Run(args) => commands::pipeline::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
