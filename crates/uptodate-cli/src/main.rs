//! # uptodate
//!
//! Keeps Dockerfiles pinned to current digests and plans matrix builds
//! whose inputs changed since the published images were built.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use uptodate_common::config::UptodateConfig;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = UptodateConfig::from_env();

    let default_level = if cli.debug || config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    commands::execute(cli, &config)
}
