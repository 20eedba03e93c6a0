//! # ezexp
//!
//! Runs per-participant experiment trials loaded from a delimited file and
//! writes the recorded results back out.
//!
//! ```bash
//! # List the trials of participant U1
//! ezexp inspect trials.csv --participant U1
//!
//! # Run them, typing name=value results on stdin
//! ezexp run trials.csv --participant U1 --results speed,accuracy
//!
//! # Fill results with random values
//! ezexp simulate trials.csv --participant U1 --seed 42
//! ```

mod cli;
mod config;
mod runner;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
