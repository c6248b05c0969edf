mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lakewatch", about = "Monthly cloud-free water index composites")]
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
    /// List the monthly windows and composite names of a run
    Windows(commands::windows::WindowsArgs),
    /// Print or save a preset pipeline config
    Config(commands::config::ConfigArgs),
    /// Show the scenes of a catalog
    Info(commands::info::InfoArgs),
    /// Build and export the composite series
    Run(commands::run::RunArgs),
    /// Water/land pixel counts per zone of a composite
    Histogram(commands::histogram::HistogramArgs),
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
        Commands::Windows(args) => commands::windows::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Histogram(args) => commands::histogram::run(args),
    }
}
