//! `uptodate dockerhierarchy` — Add Dockerfiles for new tags.

use std::path::PathBuf;

use clap::Args;
use uptodate_common::config::UptodateConfig;
use uptodate_common::types::FileRecord;
use uptodate_matrix::hierarchy::{HierarchyUpdater, PARSER_NAME};
use uptodate_matrix::spec::find_spec_files;
use uptodate_registry::crane::CraneRegistry;

use crate::output;

/// Arguments for the `dockerhierarchy` command.
#[derive(Args, Debug)]
pub struct DockerhierarchyArgs {
    /// Directory to search for hierarchy specs.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Report missing tags without creating them.
    #[arg(long)]
    pub dry_run: bool,
}

/// Executes the `dockerhierarchy` command.
///
/// # Errors
///
/// Returns an error if a hierarchy cannot be updated.
pub fn execute(args: DockerhierarchyArgs, config: &UptodateConfig) -> anyhow::Result<()> {
    let specs = find_spec_files(&args.root)?;
    let registry = CraneRegistry::new(config.registry_api.clone())?;
    let reports = HierarchyUpdater::new(&registry).run(&specs, args.dry_run)?;

    let mut records: Vec<FileRecord> = Vec::new();
    for report in reports {
        println!("{} ({})", report.container, report.spec_path.display());
        for tag in &report.present {
            println!("  present  {tag}");
        }
        let verb = if args.dry_run { "missing" } else { "created" };
        for tag in &report.missing {
            println!("  {verb:<8} {tag}");
        }
        records.extend(report.records);
    }
    output::emit(PARSER_NAME, &records)
}
