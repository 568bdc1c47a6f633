//! Per-file update driver.
//!
//! Each build file moves through `Parsed -> Resolved -> Written` or ends
//! in `Skipped`. Files are independent: a parse failure or a failed write
//! is recorded on that file and processing continues with the next one.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use uptodate_common::types::FileRecord;
use uptodate_registry::Registry;

use crate::args::{ArgResolvers, resolve_arg};
use crate::parser::ast::BuildFile;
use crate::update::{Update, resolve_from};
use crate::writer::write_updates;

/// Parser name recorded on output records.
pub const PARSER_NAME: &str = "dockerfile";

/// Where a file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "reason")]
pub enum FileState {
    /// Updates were computed but not written (dry run).
    Resolved,
    /// Updates were written to disk.
    Written,
    /// Nothing to write.
    Current,
    /// The file could not be parsed or written.
    Skipped(String),
}

/// Result of processing one build file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    /// Build file path.
    pub path: PathBuf,
    /// Final state.
    #[serde(flatten)]
    pub state: FileState,
    /// Updates computed for the file.
    pub updates: Vec<Update>,
}

/// Summary of one updater run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
    /// Whether writes were suppressed.
    pub dry_run: bool,
    /// Per-file outcomes in processing order.
    pub files: Vec<FileOutcome>,
}

impl UpdateReport {
    /// Number of files looked at.
    #[must_use]
    pub fn checked(&self) -> usize {
        self.files.len()
    }

    /// Number of files written, or that would be written in a dry run.
    #[must_use]
    pub fn modified(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.state, FileState::Written | FileState::Resolved))
            .count()
    }

    /// Total number of pending or applied updates.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| !matches!(f.state, FileState::Skipped(_)))
            .map(|f| f.updates.len())
            .sum()
    }

    /// Files that were skipped, with the reason.
    pub fn skipped(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().filter_map(|f| match &f.state {
            FileState::Skipped(reason) => Some((f.path.as_path(), reason.as_str())),
            _ => None,
        })
    }

    /// Output records for the files that were written.
    #[must_use]
    pub fn records(&self) -> Vec<FileRecord> {
        self.files
            .iter()
            .filter(|f| f.state == FileState::Written)
            .map(|f| FileRecord::new(f.path.display().to_string(), PARSER_NAME))
            .collect()
    }
}

/// Resolves and rewrites `FROM` (and optionally recognized `ARG`) lines.
pub struct DockerfileUpdater<'a> {
    registry: &'a dyn Registry,
    arg_resolvers: Option<ArgResolvers<'a>>,
}

impl std::fmt::Debug for DockerfileUpdater<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerfileUpdater")
            .field("arg_resolvers", &self.arg_resolvers)
            .finish_non_exhaustive()
    }
}

impl<'a> DockerfileUpdater<'a> {
    /// Creates an updater resolving `FROM` lines against `registry`.
    #[must_use]
    pub const fn new(registry: &'a dyn Registry) -> Self {
        Self {
            registry,
            arg_resolvers: None,
        }
    }

    /// Also resolves recognized `ARG` defaults.
    #[must_use]
    pub const fn with_arg_resolvers(mut self, resolvers: ArgResolvers<'a>) -> Self {
        self.arg_resolvers = Some(resolvers);
        self
    }

    /// Computes the updates for a parsed file.
    ///
    /// A collaborator failure on one statement is logged and treated as
    /// no update for that statement.
    #[must_use]
    pub fn resolve(&self, file: &BuildFile) -> Vec<Update> {
        let mut updates = Vec::new();
        for instruction in &file.instructions {
            let resolved = match (instruction.keyword.as_str(), self.arg_resolvers) {
                ("FROM", _) => resolve_from(instruction, self.registry),
                ("ARG", Some(resolvers)) => resolve_arg(instruction, resolvers),
                _ => continue,
            };
            match resolved {
                Ok(Some(update)) => updates.push(update),
                Ok(None) => {}
                Err(e) => warn!(
                    path = %file.path.display(),
                    line = instruction.start_line,
                    error = %e,
                    "lookup failed, leaving statement unchanged"
                ),
            }
        }
        updates
    }

    /// Parses, resolves and (unless `dry_run`) writes one file.
    pub fn process_file(&self, path: &Path, dry_run: bool) -> FileOutcome {
        let file = match BuildFile::load(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "not a loadable build file, skipping");
                return FileOutcome {
                    path: path.to_path_buf(),
                    state: FileState::Skipped(e.to_string()),
                    updates: Vec::new(),
                };
            }
        };

        let updates = self.resolve(&file);
        let state = if updates.is_empty() {
            debug!(path = %path.display(), "up to date");
            FileState::Current
        } else if dry_run {
            for update in &updates {
                info!(path = %path.display(), from = %update.original, to = %update.updated, "would update");
            }
            FileState::Resolved
        } else {
            match write_updates(path, &updates) {
                Ok(()) => FileState::Written,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "write failed");
                    FileState::Skipped(e.to_string())
                }
            }
        };

        FileOutcome {
            path: path.to_path_buf(),
            state,
            updates,
        }
    }

    /// Processes every path in order.
    pub fn run(&self, paths: &[PathBuf], dry_run: bool) -> UpdateReport {
        let files = paths
            .iter()
            .map(|p| self.process_file(p, dry_run))
            .collect();
        UpdateReport { dry_run, files }
    }
}
