mod cli;
mod commands;
mod config;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("xtal CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Model(args) => {
            info!("Dispatching to 'model' command.");
            commands::model::run(args, config_path)
        }
        Commands::Map(args) => {
            info!("Dispatching to 'map' command.");
            commands::map::run(args, config_path)
        }
        Commands::Cif(args) => {
            info!("Dispatching to 'cif' command.");
            commands::cif::run(args)
        }
    };

    if let Err(e) = &result {
        error!("Command failed: {}", e);
    }
    result
}
