//! `uptodate dockerfile` — Pin FROM images and refresh ARG defaults.

use std::path::PathBuf;

use clap::Args;
use uptodate_common::config::UptodateConfig;
use uptodate_common::constants::DOCKERFILE_NAME;
use uptodate_dockerfile::DockerfileUpdater;
use uptodate_dockerfile::args::ArgResolvers;
use uptodate_dockerfile::discover::find_files;
use uptodate_dockerfile::engine::PARSER_NAME;
use uptodate_registry::crane::CraneRegistry;
use uptodate_registry::github::GitHubClient;
use uptodate_registry::spack::SpackIndex;

use super::ChangesArgs;
use crate::output;

/// Arguments for the `dockerfile` command.
#[derive(Args, Debug)]
pub struct DockerfileArgs {
    /// Dockerfile or directory to search for Dockerfiles.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Report updates without writing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Changed-file restriction.
    #[command(flatten)]
    pub changes: ChangesArgs,
}

/// Executes the `dockerfile` command.
///
/// # Errors
///
/// Returns an error if discovery fails or a collaborator cannot be set up.
pub fn execute(args: DockerfileArgs, config: &UptodateConfig) -> anyhow::Result<()> {
    let paths = find_files(&args.root, DOCKERFILE_NAME)?;
    let paths = args.changes.filter(&args.root, paths)?;
    tracing::info!(root = %args.root.display(), count = paths.len(), "checking Dockerfiles");

    let registry = CraneRegistry::new(config.registry_api.clone())?;
    let packages = SpackIndex::new(config.package_index_url.clone())?;
    let source_host = GitHubClient::new(config.github_api.clone(), config.github_token.clone())?;
    let updater = DockerfileUpdater::new(&registry).with_arg_resolvers(ArgResolvers {
        packages: &packages,
        source_host: &source_host,
    });

    let report = updater.run(&paths, args.dry_run);
    for (path, reason) in report.skipped() {
        println!("  skipped {}: {reason}", path.display());
    }
    for outcome in report.files.iter().filter(|f| !f.updates.is_empty()) {
        for update in &outcome.updates {
            println!("  {}: {} -> {}", outcome.path.display(), update.original, update.updated);
        }
    }

    let heading = if args.dry_run { "Will Be Updated" } else { "Updated" };
    let rows = [("Checked", report.checked()), ("Modified", report.modified())];
    print!("{}", output::format_summary(heading, &rows));

    output::emit(PARSER_NAME, &report.records())
}
