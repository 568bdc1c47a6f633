//! `uptodate dockerfilelist` — List Dockerfiles.

use std::path::PathBuf;

use clap::Args;
use uptodate_common::constants::DOCKERFILE_NAME;
use uptodate_dockerfile::discover::find_files;
use uptodate_dockerfile::listing::{ListOptions, PARSER_NAME, list_dockerfiles};

use super::ChangesArgs;
use crate::output;

/// Arguments for the `dockerfilelist` command.
#[derive(Args, Debug)]
pub struct DockerfilelistArgs {
    /// Directory to search for Dockerfiles.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Drop Dockerfiles that declare any build arg.
    #[arg(long)]
    pub no_build_args: bool,

    /// Drop Dockerfiles with a build arg lacking a default.
    #[arg(long)]
    pub no_empty_build_args: bool,

    /// Changed-file restriction.
    #[command(flatten)]
    pub changes: ChangesArgs,
}

/// Executes the `dockerfilelist` command.
///
/// # Errors
///
/// Returns an error if discovery or output fails.
pub fn execute(args: DockerfilelistArgs) -> anyhow::Result<()> {
    let paths = find_files(&args.root, DOCKERFILE_NAME)?;
    let paths = args.changes.filter(&args.root, paths)?;
    let records = list_dockerfiles(
        &paths,
        ListOptions {
            include_args: !args.no_build_args,
            include_empty_args: !args.no_empty_build_args,
        },
    );
    tracing::info!(found = paths.len(), listed = records.len(), "listed Dockerfiles");
    output::emit(PARSER_NAME, &records)
}
