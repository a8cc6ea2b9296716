use std::process;
use std::path::PathBuf;
use std::sync::Arc;
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use anyhow::{Result, Context};
use indoc::indoc;
use log::{info, error};
use simple_logger::SimpleLogger;

use regrun::core::collaborator::HelperScript;
use regrun::core::config::{self, RunConfig};
use regrun::core::runner::RegressionRunner;
use regrun::reporters::{Reporter, text::TextReporter, json::JsonReporter, csv::CsvReporter};

/// Exit code for bad arguments or configuration.
const USAGE_EXIT_CODE: i32 = 1;

const USAGE: &str = indoc! {"
    Usage: regrun [OPTIONS] <WORKERS>

    WORKERS must be a positive integer: the number of modules tested at once.
    Run `regrun --help` for the full list of options.
"};


#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of modules to test concurrently
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    workers: u32,

    /// Report format [default: text]
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the final json or csv report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,

    /// TOML or JSON file with the module list and helper settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Helper script invoked once per module
    #[arg(long)]
    helper: Option<PathBuf>,
}


#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl From<OutputFormat> for config::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => config::OutputFormat::Text,
            OutputFormat::Json => config::OutputFormat::Json,
            OutputFormat::Csv => config::OutputFormat::Csv,
        }
    }
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(USAGE_EXIT_CODE);
        }
    };

    let log_level = if cli.quiet {
        log::LevelFilter::Off
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    SimpleLogger::new()
        .with_level(log_level)
        .init()
        .context("Failed to initialize logger")?;

    info!("Regrun v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => match RunConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                eprintln!("Error: {}", e);
                process::exit(USAGE_EXIT_CODE);
            }
        },
        None => RunConfig::default(),
    };

    apply_args(&mut config, &cli);

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        eprint!("{}", USAGE);
        process::exit(USAGE_EXIT_CODE);
    }

    let reporter: Box<dyn Reporter + Send + Sync> = match config.output_format {
        config::OutputFormat::Text => Box::new(TextReporter::new(config.verbose, config.quiet)),
        config::OutputFormat::Json => Box::new(JsonReporter::new(config.output_file.clone(), config.verbose)),
        config::OutputFormat::Csv => Box::new(CsvReporter::new(config.output_file.clone())),
    };

    let collaborator = Arc::new(HelperScript::from(&config.helper));
    let runner = RegressionRunner::new(config, collaborator, reporter);

    match runner.execute_all() {
        Ok(summary) => {
            process::exit(i32::try_from(summary.exit_code).unwrap_or(i32::MAX));
        }
        Err(e) if e.is_usage() => {
            eprintln!("Error: {}", e);
            process::exit(USAGE_EXIT_CODE);
        }
        Err(e) => {
            error!("Regression run failed: {}", e);
            Err(e).context("Regression run failed")
        }
    }
}


fn apply_args(config: &mut RunConfig, cli: &Cli) {
    config.workers = cli.workers as usize;

    if let Some(helper) = &cli.helper {
        config.helper.script = helper.clone();
    }

    if let Some(format) = cli.format {
        config.output_format = format.into();
    }

    if let Some(output) = &cli.output {
        config.output_file = Some(output.clone());
    }

    config.verbose |= cli.verbose;
    config.quiet |= cli.quiet;
}
