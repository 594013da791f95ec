//! The xsltest Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use termcolor::{ColorChoice, StandardStream};

use crate::canonical::to_canonical_string;
use crate::cli::args::{Command, ReportFormat, XsltestArgs};
use crate::config::HarnessConfig;
use crate::discovery::TestDiscoverer;
use crate::document::Document;
use crate::errors::{HarnessError, HarnessResult};
use crate::logging::{init_logging, LogConfig};
use crate::runner::{run_all_tests, TestSummary};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = XsltestArgs::parse();

    let log_config = LogConfig::from_verbosity(args.verbose, args.quiet);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {}", e);
        process::exit(2);
    }

    let result = match args.command {
        Command::Run {
            root,
            filter,
            engine,
            format,
            no_color,
        } => handle_run(root, filter.as_deref(), engine, format, no_color),
        Command::List { root } => handle_list(root).map(|()| 0),
        Command::Canon { file } => handle_canon(&file).map(|()| 0),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(2);
        }
    }
}

/// Runs the matrix and returns the process exit code.
fn handle_run(
    root: PathBuf,
    filter: Option<&str>,
    engine: Option<String>,
    format: ReportFormat,
    no_color: bool,
) -> HarnessResult<i32> {
    let mut config = HarnessConfig::load(root)?;
    if let Some(program) = engine {
        config.engine_program = program;
    }
    if no_color {
        config.use_colors = false;
    }

    let results = run_all_tests(&config.engine(), &config, filter)?;

    match format {
        ReportFormat::Text => {
            let choice = if config.use_colors {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            };
            let mut stdout = StandardStream::stdout(choice);
            output::write_report(&mut stdout, &results).map_err(report_error)?;
        }
        ReportFormat::Json => {
            let mut stdout = io::stdout().lock();
            output::write_json(&mut stdout, &results)
                .map_err(|e| HarnessError::Report(e.to_string()))?;
        }
    }

    let summary = TestSummary::from_results(&results);
    Ok(i32::from(summary.has_failures()))
}

fn handle_list(root: PathBuf) -> HarnessResult<()> {
    let config = HarnessConfig::load(root)?;
    let cases = TestDiscoverer::discover(&config)?;
    let mut stdout = io::stdout().lock();
    for case in &cases {
        writeln!(stdout, "{}", case).map_err(report_error)?;
    }
    Ok(())
}

fn handle_canon(file: &Path) -> HarnessResult<()> {
    let document = Document::from_path(file)?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(to_canonical_string(&document).as_bytes())
        .map_err(report_error)
}

fn report_error(e: io::Error) -> HarnessError {
    HarnessError::Report(e.to_string())
}
