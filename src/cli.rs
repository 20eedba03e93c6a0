use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ezexp_core::FileFormat;
use ezexp_experiment::{ExperimentConfig, ExperimentFacade};
use ezexp_timing::TimeUnit;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::runner;

/// ezexp - step through per-participant trials and record their results
#[derive(Parser)]
#[command(name = "ezexp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file ([experiment] table)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header and the trials of one participant
    Inspect {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Run trials interactively, reading name=value results from stdin
    Run {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fill the declared result columns with random values and save
    Simulate {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Seed for reproducible results
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Trial definition file
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Participant whose rows are loaded
    #[arg(short, long)]
    participant: String,

    /// Column holding participant ids
    #[arg(long)]
    column: Option<String>,

    /// Source encoding label, e.g. utf-8 or gbk
    #[arg(long)]
    encoding: Option<String>,

    /// Field separator
    #[arg(long)]
    separator: Option<char>,

    /// Input format (csv; json and xml are rejected)
    #[arg(long)]
    input_format: Option<FileFormat>,
}

#[derive(Args)]
struct OutputArgs {
    /// Output file (defaults to <participant>-results.<ext> next to the source)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Output format (csv or json)
    #[arg(long)]
    output_format: Option<FileFormat>,

    /// Result columns written first, comma separated
    #[arg(long, value_delimiter = ',')]
    results: Vec<String>,

    /// Unit of the recorded trial duration
    #[arg(long)]
    time_unit: Option<TimeUnit>,
}

impl SourceArgs {
    fn apply(&self, config: &mut ExperimentConfig) {
        if let Some(column) = &self.column {
            config.participant_column = column.clone();
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = encoding.clone();
        }
        if let Some(separator) = self.separator {
            config.separator = separator;
        }
        if let Some(format) = self.input_format {
            config.input_format = format;
        }
    }
}

impl OutputArgs {
    fn apply(&self, config: &mut ExperimentConfig) {
        if let Some(format) = self.output_format {
            config.output_format = format;
        }
        if !self.results.is_empty() {
            config.result_columns = self.results.clone();
        }
        if let Some(unit) = self.time_unit {
            config.time_unit = unit;
        }
    }
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
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?.experiment,
        None => ExperimentConfig::default(),
    };

    let stdout = io::stdout();
    match cli.command {
        Commands::Inspect { source } => {
            source.apply(&mut config);
            let facade = open(config, &source)?;
            runner::inspect(facade.experiment()?, stdout.lock())
        }
        Commands::Run { source, output } => {
            source.apply(&mut config);
            output.apply(&mut config);
            let mut facade = open(config, &source)?;
            if let Some(path) = output.output {
                facade.experiment_mut()?.set_output_path(path);
            }
            let completed = runner::run_interactive(&mut facade, io::stdin().lock(), stdout.lock())?;
            finish(&mut facade, completed)
        }
        Commands::Simulate {
            source,
            output,
            seed,
        } => {
            source.apply(&mut config);
            output.apply(&mut config);
            let mut facade = open(config, &source)?;
            if let Some(path) = output.output {
                facade.experiment_mut()?.set_output_path(path);
            }
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let completed = runner::simulate(&mut facade, &mut rng, stdout.lock())?;
            finish(&mut facade, completed)
        }
    }
}

fn open(config: ExperimentConfig, args: &SourceArgs) -> Result<ExperimentFacade> {
    let column = config.participant_column.clone();
    let (input, output) = (config.input_format, config.output_format);
    let mut facade = ExperimentFacade::new(config);
    facade
        .init_experiment(&args.source, &args.participant, &column, input, output)
        .with_context(|| format!("Failed to load {}", args.source.display()))?;
    Ok(facade)
}

fn finish(facade: &mut ExperimentFacade, completed: usize) -> Result<()> {
    let saved = facade.save().context("Failed to save results")?;
    if let Some(experiment) = facade.release() {
        info!(
            "{} trials completed, {} rows written to {}",
            completed,
            saved,
            experiment.output_path().display()
        );
    }
    Ok(())
}
