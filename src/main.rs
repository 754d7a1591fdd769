//! Switchyard - Multi-provider LLM request router
//!
//! Operator CLI: loads layered configuration and inspects what the router
//! would do with it.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod loader;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "switchyard=info,switchyard_llm=info".into()),
        )
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    debug!("switchyard v{}", env!("CARGO_PKG_VERSION"));

    cli::run(cli)
}
