//! `uptodate dockerbuild` — Plan matrix builds from `uptodate.yaml` specs.

use std::path::PathBuf;

use clap::Args;
use tracing::info;
use uptodate_common::config::UptodateConfig;
use uptodate_matrix::spec::find_spec_files;
use uptodate_matrix::{PlanMode, PlanOptions, Planner};
use uptodate_registry::crane::CraneRegistry;
use uptodate_registry::spack::SpackIndex;

use super::ChangesArgs;
use crate::output;

/// Options shared by the matrix planning commands.
#[derive(Args, Debug)]
pub struct MatrixArgs {
    /// Directories (or spec files) to search for `uptodate.yaml`.
    #[arg(default_value = ".")]
    pub roots: Vec<PathBuf>,

    /// Registry prefix for container names; enables comparison with
    /// published image labels.
    #[arg(long)]
    pub registry: Option<String>,

    /// Build every matrix entry regardless of published labels.
    #[arg(long)]
    pub all: bool,

    /// Changed-file restriction, ignored when a registry is given.
    #[command(flatten)]
    pub changes: ChangesArgs,
}

/// Arguments for the `dockerbuild` command.
#[derive(Args, Debug)]
pub struct DockerbuildArgs {
    /// Planning options.
    #[command(flatten)]
    pub matrix: MatrixArgs,
}

/// Finds spec files below every root, honoring `--changes`.
///
/// # Errors
///
/// Returns an error if a root is missing or `git` fails.
pub fn spec_paths(args: &MatrixArgs) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for root in &args.roots {
        let found = find_spec_files(root)?;
        let found = if args.registry.is_some() && args.changes.changes {
            info!("registry given, comparing published labels instead of changed files");
            found
        } else {
            args.changes.filter(root, found)?
        };
        paths.extend(found);
    }
    Ok(paths)
}

/// Plans and emits builds for `mode`.
///
/// # Errors
///
/// Returns an error on spec, registry or output failures.
pub fn plan(args: &MatrixArgs, mode: PlanMode, config: &UptodateConfig) -> anyhow::Result<()> {
    let parser = mode.parser();
    let specs = spec_paths(args)?;
    info!(count = specs.len(), "planning builds");

    let registry = CraneRegistry::new(config.registry_api.clone())?;
    let packages = SpackIndex::new(config.package_index_url.clone())?;
    let options = PlanOptions {
        registry: args.registry.clone(),
        build_all: args.all,
        mode,
    };
    let results = Planner::new(&registry, &packages).plan(&specs, &options)?;
    info!(parser, builds = results.len(), "planned");
    output::emit(parser, &results)
}

/// Executes the `dockerbuild` command.
///
/// # Errors
///
/// Returns an error if planning fails.
pub fn execute(args: DockerbuildArgs, config: &UptodateConfig) -> anyhow::Result<()> {
    plan(&args.matrix, PlanMode::Build, config)
}
