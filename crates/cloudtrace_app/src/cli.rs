use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "cloudtrace",
    version,
    about = "Start a CloudTrace benchmark and follow its progress",
    long_about = None
)]
pub struct Cli {
    /// Base URL of the benchmark server.
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Provider to benchmark (repeatable). Defaults to the configured list.
    #[arg(short = 'p', long = "provider", value_name = "KEY")]
    pub providers: Vec<String>,

    /// Number of runs per provider.
    #[arg(long, value_name = "N")]
    pub runs: Option<u32>,

    /// Follow a benchmark that is already running; never start one.
    #[arg(long, action = ArgAction::SetTrue)]
    pub watch: bool,

    /// Custom config path (defaults to ./cloudtrace.ron when present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the known providers and exit.
    #[arg(long, action = ArgAction::SetTrue)]
    pub list_providers: bool,

    /// Increase logging verbosity.
    #[arg(long, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Also write logs to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
