//! CLI module for Switchyard
//!
//! Provides operator commands:
//! - `check`: Validate the layered configuration and summarise it
//! - `route`: Dry-run candidate selection for a capability set

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod check;
pub mod route;

/// Switchyard request router CLI
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(about = "Resilient multi-provider LLM request router")]
#[command(version)]
pub struct Cli {
    /// Extra configuration file, applied after all other sources
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and print a summary
    Check {
        /// Print the resolved configuration as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the ranked candidates for a request without dispatching it
    Route(RouteArgs),
}

/// Request shape for `route`
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Required capability (repeatable)
    #[arg(long = "require", short = 'r')]
    pub require: Vec<String>,

    /// Preferred capability (repeatable)
    #[arg(long = "prefer", short = 'p')]
    pub prefer: Vec<String>,

    /// Maximum cost per 1000 tokens
    #[arg(long)]
    pub max_cost: Option<f64>,

    /// Maximum expected latency in milliseconds
    #[arg(long)]
    pub max_latency_ms: Option<u64>,

    /// Minimum context window in tokens
    #[arg(long)]
    pub min_context: Option<u64>,

    /// Print candidates as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the CLI command
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Some(Commands::Check { json }) => check::run(config_path, json),
        Some(Commands::Route(args)) => route::run(config_path, &args),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
