//! Covgen CLI entry point.

use clap::Parser;

use covgen::cli::{Cli, Commands};
use covgen::infrastructure::{init_tracing, ConfigLoader};

#[tokio::main]
async fn main() {
    // Logging comes up from the same configuration the commands load; a
    // broken config falls back to defaults and surfaces when the command
    // itself loads it.
    let logging = ConfigLoader::load()
        .map(|config| config.logging)
        .unwrap_or_default();
    init_tracing(&logging);

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => covgen::cli::commands::init::execute(args, cli.json).await,
        Commands::Plan(args) => covgen::cli::commands::plan::execute(args, cli.json).await,
        Commands::Scaffold(args) => covgen::cli::commands::scaffold::execute(args, cli.json).await,
        Commands::Context(args) => covgen::cli::commands::context::execute(args, cli.json).await,
        Commands::Generate(args) => covgen::cli::commands::generate::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        covgen::cli::handle_error(err, cli.json);
    }
}
