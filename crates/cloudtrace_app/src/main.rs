mod cli;
mod config;
mod platform;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cloudtrace_core::PROVIDERS;
use cloudtrace_logging::ct_warn;

use cli::Cli;
use platform::logging::{self, LogDestination};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_providers {
        for (key, name) in PROVIDERS {
            println!("{key:<8}{name}");
        }
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let loaded = config::load(cli.config.as_deref())?;
    let log_file = cli.log_file.clone().or_else(|| loaded.config.log_file.clone());
    logging::initialize(
        LogDestination::from_file(log_file),
        cloudtrace_logging::default_level(cli.verbose),
    );
    if let Some(warning) = &loaded.warning {
        ct_warn!("{}", warning);
    }

    let options = loaded.config.resolve(&cli)?;
    let outcome = platform::run_app(options)?;
    Ok(outcome.exit_code() as u8)
}
