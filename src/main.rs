//! Floodrisk CLI - Flood Risk Scoring
//!
//! Command-line interface for the Floodrisk scoring pipeline.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use floodrisk::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG overrides the default filter
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Floodrisk v{}", env!("CARGO_PKG_VERSION"));

    let settings = commands::load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            hazard,
            vulnerability,
            output,
            adapt,
        } => commands::build(&settings, &hazard, &vulnerability, output.as_deref(), adapt),
        Commands::Recommend { input, output } => {
            commands::recommend(&settings, &input, output.as_deref())
        }
        Commands::Demo { adapt } => commands::demo(&settings, adapt),
        Commands::ShowConfig => commands::show_config(&settings),
    }
}
