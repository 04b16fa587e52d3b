// src/cli/mod.rs — CLI definition (clap derive)

pub mod progress;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "perftune",
    about = "Iteratively rewrite code with a language model to cut its runtime cost",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Optimize one source file in-process and print the best version
    Optimize {
        /// Source file to optimize
        file: PathBuf,
        /// Consecutive non-improving cycles before stopping
        #[arg(short, long)]
        iterations: Option<u32>,
        /// Runs averaged per measurement
        #[arg(short, long)]
        runs: Option<u32>,
        /// Use the hosted backend instead of the local model server
        #[arg(long)]
        hosted: bool,
        /// Credential for the hosted backend
        #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Suppress per-cycle progress (only emit the final code)
        #[arg(long)]
        quiet: bool,
    },
}
