//! `uptodate git` — Show files changed relative to a branch.

use std::path::PathBuf;

use clap::Args;
use uptodate_common::constants::DEFAULT_BRANCH;
use uptodate_common::types::FileRecord;
use uptodate_registry::ChangeDetector;
use uptodate_registry::git::GitChanges;

use crate::output;

/// Parser name recorded on output records.
const PARSER_NAME: &str = "git";

/// Arguments for the `git` command.
#[derive(Args, Debug)]
pub struct GitArgs {
    /// Repository root.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Branch to compare against.
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,
}

/// Executes the `git` command.
///
/// # Errors
///
/// Returns an error if `git` cannot list the changes.
pub fn execute(args: GitArgs) -> anyhow::Result<()> {
    let changes = GitChanges::new().changed_files(&args.root, &args.branch)?;
    let records: Vec<FileRecord> = changes
        .iter()
        .filter(|c| c.action.is_present())
        .map(|c| {
            println!("  {:<7} {}", c.action, c.path.display());
            FileRecord::new(c.path.display().to_string(), PARSER_NAME)
                .with_identifier(c.action.to_string())
        })
        .collect();
    output::emit(PARSER_NAME, &records)
}
