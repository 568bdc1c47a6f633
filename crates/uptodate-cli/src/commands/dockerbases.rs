//! `uptodate dockerbases` — Plan builds of every base Dockerfile per spec.

use std::path::PathBuf;

use clap::Args;
use uptodate_common::config::UptodateConfig;
use uptodate_matrix::PlanMode;

use super::dockerbuild::{MatrixArgs, plan};

/// Arguments for the `dockerbases` command.
#[derive(Args, Debug)]
pub struct DockerbasesArgs {
    /// Planning options.
    #[command(flatten)]
    pub matrix: MatrixArgs,

    /// Directory holding the base Dockerfiles.
    #[arg(long)]
    pub bases: PathBuf,
}

/// Executes the `dockerbases` command.
///
/// # Errors
///
/// Returns an error if the bases directory is missing or planning fails.
pub fn execute(args: DockerbasesArgs, config: &UptodateConfig) -> anyhow::Result<()> {
    if !args.bases.is_dir() {
        anyhow::bail!("bases directory {} does not exist", args.bases.display());
    }
    plan(
        &args.matrix,
        PlanMode::Bases {
            bases_dir: args.bases,
        },
        config,
    )
}
