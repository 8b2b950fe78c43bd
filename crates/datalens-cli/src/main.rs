mod constructor;
mod errors;
mod parser;
mod runner;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use datalens_core::Status;

/// Output format for reports
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Print results to standard output (human-readable)
    Stdout,
    /// Output results in JSON format
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "datalens",
    version,
    about = "DataLens CLI - Streaming data quality for CSV and Parquet files",
    long_about = "DataLens profiles data files in a single bounded-memory pass and validates \
                  them against declarative rule configs, including cross-file checks.\n\n\
                  Example usage:\n  \
                  datalens profile data/orders.csv\n  \
                  datalens suggest data/orders.csv --config-out rules.toml\n  \
                  datalens validate --config rules.toml"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output format for reports
    #[arg(short, long, value_enum, default_value = "stdout", global = true)]
    output: OutputFormat,

    /// Enable debug mode with detailed error backtraces
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate files against a TOML rule configuration
    Validate {
        /// Path to the TOML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: String,

        /// Stop a file's remaining rules after the first ERROR failure
        #[arg(long)]
        fail_fast: bool,
    },
    /// Profile files: statistics, inferred types, quality scores
    Profile {
        /// Data files to profile
        #[arg(required = true, value_name = "FILES")]
        files: Vec<String>,
    },
    /// Profile one file and suggest a rule configuration for it
    Suggest {
        /// Data file to analyze
        #[arg(value_name = "FILE")]
        file: String,

        /// Write the suggested config here instead of stdout
        #[arg(long, value_name = "FILE")]
        config_out: Option<std::path::PathBuf>,
    },
}

fn run(args: &Args) -> Result<i32> {
    match &args.command {
        Command::Validate { config, fail_fast } => {
            let status = runner::run_validate(config, &args.output, *fail_fast)?;
            Ok(match status {
                Status::Passed => 0,
                Status::Warning => 1,
                Status::Failed => 2,
            })
        }
        Command::Profile { files } => {
            runner::run_profile(files, &args.output)?;
            Ok(0)
        }
        Command::Suggest { file, config_out } => {
            runner::run_suggest(file, config_out.as_ref())?;
            Ok(0)
        }
    }
}

fn main() {
    let args = Args::parse();

    // Enable backtraces in debug mode
    if args.debug {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            if std::env::var("RUST_BACKTRACE").is_ok() {
                eprintln!("Error: {:?}", err);
            } else {
                eprintln!("Error: {:#}", err);
                eprintln!("\nHint: Run with --debug flag for detailed stack traces");
            }
            std::process::exit(3);
        }
    }
}
