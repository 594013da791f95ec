//! Defines the command-line arguments and subcommands for the xsltest CLI.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "xsltest",
    version,
    about = "Runs XSLT stylesheets against input/expected fixture pairs."
)]
pub struct XsltestArgs {
    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover and run every stylesheet/fixture case.
    Run {
        /// Directory holding the stylesheet and fixture directories.
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Only run cases whose `<stylesheet>--<case>` id contains this.
        #[arg(short, long)]
        filter: Option<String>,
        /// XSLT processor to run instead of the configured one.
        #[arg(long)]
        engine: Option<String>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        /// Never color the text report.
        #[arg(long)]
        no_color: bool,
    },
    /// List the discovered case ids without running them.
    List {
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Print the canonical rendering used for comparisons.
    Canon {
        #[arg(required = true)]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}
