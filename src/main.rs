//! # bioseries
//!
//! Command-line front end for loading bioprocess time-series data.
//!
//! ## Usage
//!
//! ```bash
//! # Combine every CSV in data/ into inputs/dataset.csv + inputs/metadata.json
//! bioseries load data
//!
//! # MAT-file exports, one output table per experiment
//! bioseries -v load data --pattern "*.mat" --separate
//!
//! # See how a file's fields were resolved
//! bioseries inspect data/run_01.mat
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
