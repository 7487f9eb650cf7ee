use std::process::ExitCode;

use clap::Parser;
use travel_curator::cli::Cli;
use travel_curator::{CuratorConfig, CuratorError, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CuratorConfig::load_from_path(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.logging, cli.verbose) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match cli.run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{:?}", e);
            match e.downcast_ref::<CuratorError>() {
                Some(err) => eprintln!("Error: {}", err.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
