//! CLI command definitions and dispatch.

pub mod dockerbases;
pub mod dockerbuild;
pub mod dockerfile;
pub mod dockerfilelist;
pub mod dockerhierarchy;
pub mod git;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::info;
use uptodate_common::config::UptodateConfig;
use uptodate_common::constants::DEFAULT_BRANCH;
use uptodate_dockerfile::discover::filter_changed;
use uptodate_registry::ChangeDetector;
use uptodate_registry::git::GitChanges;

/// uptodate — keep Dockerfiles and build matrices up to date.
#[derive(Parser, Debug)]
#[command(name = "uptodate", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Print debug diagnostics.
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pin FROM images to digests and refresh recognized ARG defaults.
    Dockerfile(dockerfile::DockerfileArgs),
    /// Plan matrix builds for specs with a dockerbuild section.
    Dockerbuild(dockerbuild::DockerbuildArgs),
    /// Plan matrix builds of every base Dockerfile against each spec.
    Dockerbases(dockerbases::DockerbasesArgs),
    /// List Dockerfiles, optionally filtered by their build args.
    Dockerfilelist(dockerfilelist::DockerfilelistArgs),
    /// Create Dockerfiles for newly published tags of a hierarchy.
    Dockerhierarchy(dockerhierarchy::DockerhierarchyArgs),
    /// Show files changed relative to a branch.
    Git(git::GitArgs),
}

/// Restriction of a command to files changed relative to a branch.
#[derive(Args, Debug, Clone)]
pub struct ChangesArgs {
    /// Only consider files changed relative to the branch.
    #[arg(long)]
    pub changes: bool,

    /// Branch to compare against.
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,
}

impl ChangesArgs {
    /// Keeps the paths changed under `root` when `--changes` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if `git` cannot list the changes.
    pub fn filter(&self, root: &Path, paths: Vec<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
        if !self.changes {
            return Ok(paths);
        }
        let changed = GitChanges::new().changed_paths(root, &self.branch)?;
        let kept = filter_changed(paths, &changed);
        info!(branch = %self.branch, kept = kept.len(), "restricted to changed files");
        Ok(kept)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli, config: &UptodateConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Dockerfile(args) => dockerfile::execute(args, config),
        Command::Dockerbuild(args) => dockerbuild::execute(args, config),
        Command::Dockerbases(args) => dockerbases::execute(args, config),
        Command::Dockerfilelist(args) => dockerfilelist::execute(args),
        Command::Dockerhierarchy(args) => dockerhierarchy::execute(args, config),
        Command::Git(args) => git::execute(args),
    }
}
