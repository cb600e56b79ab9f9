use anyhow::Result;
use clap::Parser;
use formforge_core::FormforgeError;
use std::process::ExitCode;
use tracing::error;

mod cli;
mod commands;
mod config;
mod logging;
mod plotting;

use cli::Cli;
use config::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::setup_logging(cli.verbose) {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<FormforgeError>() {
            Some(client) if client.is_client_error() => {
                eprintln!("Error: {}", client);
                ExitCode::from(2)
            }
            _ => {
                error!("{:#}", e);
                eprintln!("Error: internal failure, rerun with -v for details");
                ExitCode::from(1)
            }
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?.with_data_dir(cli.data_dir);
    commands::run(cli.command, &config)
}
