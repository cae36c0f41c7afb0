//! Operator entry point for the cache-node sidecar.

use clap::Parser;
use sidecar_cli::{log_filter, CliConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::parse();
    config.run()
}
