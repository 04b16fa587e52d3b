// src/main.rs — perftune entry point

use clap::Parser;

use perftune::api::{self, ApiState};
use perftune::cli::run::{run_optimize, OptimizeArgs};
use perftune::cli::{Cli, Commands};
use perftune::core::orchestrator::Orchestrator;
use perftune::infra::config::Config;
use perftune::infra::logger;

#[tokio::main]
async fn main() {
    // Respects RUST_LOG / PERFTUNE_LOG
    logger::init_logging("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Falls back to defaults if no config.toml
    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.api.host = host;
            }
            if let Some(port) = port {
                config.api.port = port;
            }
            let state = ApiState::new(Orchestrator::new(&config), &config.api);
            api::start_server(&config.api, state).await
        }
        Commands::Optimize {
            file,
            iterations,
            runs,
            hosted,
            api_key,
            quiet,
        } => {
            let args = OptimizeArgs {
                file: &file,
                iterations,
                runs,
                hosted,
                api_key,
                quiet,
            };
            run_optimize(args, &config).await
        }
    }
}
