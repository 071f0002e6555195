// src/main.rs — brandloop entry point

use clap::Parser;

use brandloop::cli::{Cli, Commands};
use brandloop::infra::config::Config;
use brandloop::infra::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Falls back to defaults if no config.toml
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    // RUST_LOG still wins over the configured level
    logger::init_logging(&config.log_level);

    match cli.command {
        Commands::Run(args) => brandloop::cli::run::run_workflow(args, &config).await,
        Commands::Status { session } => {
            brandloop::cli::status::show_status(session.as_deref(), &config).await
        }
        Commands::Sessions { action } => {
            brandloop::cli::sessions::run_sessions(action, &config).await
        }
    }
}
