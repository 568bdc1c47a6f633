//! Changed-file detection with the `git` CLI.
//!
//! On the comparison branch itself `HEAD` is compared with `HEAD~1`;
//! on any other branch with `origin/<branch>`.

use std::path::{Path, PathBuf};
use std::process::Command;

use uptodate_common::error::{Result, UptodateError};

use crate::{ChangeAction, ChangeDetector, ChangedFile};

/// [`ChangeDetector`] that shells out to `git`.
#[derive(Debug, Clone, Default)]
pub struct GitChanges;

impl GitChanges {
    /// Creates a detector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn run_git(root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .map_err(|e| UptodateError::Command {
            command: format!("git {}", args.join(" ")),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(UptodateError::Command {
            command: format!("git {}", args.join(" ")),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parses `git diff --name-status` output. Paths are joined onto `top`.
/// Renames and copies count as an addition of the new path.
#[must_use]
pub fn parse_name_status(output: &str, top: &Path) -> Vec<ChangedFile> {
    let mut changes = Vec::new();
    for line in output.lines() {
        let mut fields = line.split('\t');
        let Some(status) = fields.next() else {
            continue;
        };
        let paths: Vec<&str> = fields.collect();
        let (action, path) = match status.chars().next() {
            Some('A') => (ChangeAction::Added, paths.first()),
            Some('M' | 'T') => (ChangeAction::Modified, paths.first()),
            Some('D') => (ChangeAction::Deleted, paths.first()),
            Some('R' | 'C') => (ChangeAction::Added, paths.last()),
            _ => continue,
        };
        if let Some(path) = path {
            changes.push(ChangedFile {
                path: top.join(path),
                action,
            });
        }
    }
    changes
}

impl ChangeDetector for GitChanges {
    fn changed_files(&self, root: &Path, branch: &str) -> Result<Vec<ChangedFile>> {
        let top = PathBuf::from(run_git(root, &["rev-parse", "--show-toplevel"])?.trim());
        let current = run_git(root, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let base = if current.trim() == branch {
            "HEAD~1".to_string()
        } else {
            format!("origin/{branch}")
        };
        tracing::debug!(root = %root.display(), base = %base, "comparing against base");

        let diff = run_git(root, &["diff", "--name-status", &base, "HEAD"])?;
        let changes = parse_name_status(&diff, &top);
        tracing::info!(count = changes.len(), base = %base, "changed files detected");
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_status_maps_actions() {
        let output = "M\tubuntu/Dockerfile\nA\tubuntu/uptodate.yaml\nD\told/Dockerfile\n";
        let changes = parse_name_status(output, Path::new("/repo"));
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].action, ChangeAction::Modified);
        assert_eq!(changes[0].path, PathBuf::from("/repo/ubuntu/Dockerfile"));
        assert_eq!(changes[1].action, ChangeAction::Added);
        assert_eq!(changes[2].action, ChangeAction::Deleted);
    }

    #[test]
    fn name_status_rename_takes_new_path() {
        let changes = parse_name_status("R100\ta/Dockerfile\tb/Dockerfile\n", Path::new("/r"));
        assert_eq!(changes[0].path, PathBuf::from("/r/b/Dockerfile"));
        assert_eq!(changes[0].action, ChangeAction::Added);
    }

    #[test]
    fn name_status_ignores_unknown_lines() {
        assert!(parse_name_status("\nX\tweird\n", Path::new("/r")).is_empty());
    }

    #[test]
    fn changed_files_outside_repository_fails() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        assert!(GitChanges::new().changed_files(dir.path(), "main").is_err());
    }
}
