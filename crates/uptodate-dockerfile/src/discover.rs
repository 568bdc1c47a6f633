//! Discovery of build files and spec files below a root.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uptodate_common::error::{Result, UptodateError};
use walkdir::WalkDir;

/// Recursively finds files whose name starts with `prefix`, sorted.
///
/// `root` may also name a single matching file. `.git` directories are
/// not descended into and unreadable entries are skipped.
///
/// # Errors
///
/// Returns [`UptodateError::NotFound`] if `root` does not exist and
/// [`UptodateError::Io`] if it cannot be read.
pub fn find_files(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => UptodateError::NotFound {
            kind: "path",
            id: root.display().to_string(),
        },
        _ => UptodateError::io(root, e),
    })?;
    if metadata.is_file() {
        let matches = root
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with(prefix));
        return Ok(if matches { vec![root.to_path_buf()] } else { Vec::new() });
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().starts_with(prefix) {
            found.push(entry.into_path());
        }
    }
    debug!(root = %root.display(), prefix, count = found.len(), "discovered files");
    Ok(found)
}

/// Keeps the paths of `paths` that also appear in `changed`.
///
/// Both sides are compared in canonical form so relative and absolute
/// spellings of the same file match.
#[must_use]
pub fn filter_changed(paths: Vec<PathBuf>, changed: &[PathBuf]) -> Vec<PathBuf> {
    let canonical = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
    let changed: BTreeSet<PathBuf> = changed.iter().map(|p| canonical(p)).collect();
    paths
        .into_iter()
        .filter(|p| changed.contains(&canonical(p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, "FROM alpine\n").expect("write");
    }

    #[test]
    fn find_files_matches_prefix_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("b/Dockerfile"));
        touch(&dir.path().join("a/Dockerfile.dev"));
        touch(&dir.path().join("a/README.md"));
        touch(&dir.path().join(".git/Dockerfile"));

        let found = find_files(dir.path(), "Dockerfile").expect("should walk");
        assert_eq!(
            found,
            vec![
                dir.path().join("a/Dockerfile.dev"),
                dir.path().join("b/Dockerfile")
            ]
        );
    }

    #[test]
    fn find_files_accepts_single_file_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("Dockerfile");
        touch(&file);
        assert_eq!(find_files(&file, "Dockerfile").expect("ok"), vec![file]);
    }

    #[test]
    fn find_files_missing_root_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            find_files(&dir.path().join("nope"), "Dockerfile"),
            Err(UptodateError::NotFound { kind: "path", .. })
        ));
    }

    #[test]
    fn filter_changed_keeps_overlap() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a/Dockerfile");
        let b = dir.path().join("b/Dockerfile");
        touch(&a);
        touch(&b);
        let kept = filter_changed(vec![a.clone(), b], &[dir.path().join("a/../a/Dockerfile")]);
        assert_eq!(kept, vec![a]);
    }
}
