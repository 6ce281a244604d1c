use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use bioseries::config::PipelineConfig;

mod inspect;
mod load;

/// bioseries - Bioprocess time-series ingestion
#[derive(Parser)]
#[command(name = "bioseries")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, clean and combine every matching source file in a directory
    Load {
        /// Directory containing the source files
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// File-name glob pattern (default: from config, else "*.csv")
        #[arg(short = 'p', long)]
        pattern: Option<String>,

        /// Load settings from a TOML config file
        #[arg(short = 'c', long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output directory for dataset.csv and metadata.json
        #[arg(short = 'o', long, default_value = "inputs")]
        output: PathBuf,

        /// Write one CSV per experiment instead of one combined dataset
        #[arg(long)]
        separate: bool,

        /// Disable z-score outlier rejection
        #[arg(long)]
        keep_outliers: bool,

        /// Z-score threshold for outlier rejection
        #[arg(long, value_name = "Z")]
        z_threshold: Option<f64>,
    },

    /// Show the structure of a source file and how each role resolves
    Inspect {
        /// Source file (.csv, .mat or .json)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Load alias and extraction settings from a TOML config file
        #[arg(short = 'c', long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Outline depth for hierarchical sources
        #[arg(short = 'd', long, default_value = "4")]
        depth: usize,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Load {
            dir,
            pattern,
            config,
            output,
            separate,
            keep_outliers,
            z_threshold,
        } => {
            let mut config = read_config(config.as_deref())?;
            if let Some(pattern) = pattern {
                config.input.file_pattern = pattern;
            }
            if separate {
                config.input.combine = false;
            }
            if keep_outliers {
                config.cleaning.remove_outliers = false;
            }
            if let Some(z) = z_threshold {
                config.cleaning.outlier_z_threshold = z;
            }
            load::run(&dir, &output, &config)
        }
        Commands::Inspect {
            file,
            config,
            depth,
        } => inspect::run(&file, &read_config(config.as_deref())?, depth),
    }
}

fn read_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}
