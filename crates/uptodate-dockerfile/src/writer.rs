//! Line-exact, all-or-nothing rewriting of build files.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use tracing::info;
use uptodate_common::error::{Result, UptodateError};

use crate::update::Update;

/// Applies `updates` to `content` in one pass over the original lines.
///
/// Each update replaces the lines `line_index..=end_index` with its
/// reconstructed statement; the indentation of the first line and a
/// trailing carriage return are kept. Updates whose start index lies
/// outside the file or inside another update's span are ignored.
#[must_use]
pub fn apply_updates(content: &str, updates: &[Update]) -> String {
    let by_start: BTreeMap<usize, &Update> = updates.iter().map(|u| (u.line_index, u)).collect();
    let lines: Vec<&str> = content.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut skip_through: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        if skip_through.is_some_and(|end| idx <= end) {
            continue;
        }
        skip_through = None;
        match by_start.get(&idx) {
            Some(update) => {
                let indent_len = line.len() - line.trim_start().len();
                let mut replaced = format!("{}{}", &line[..indent_len], update.line());
                let end = update.end_index.max(idx);
                if lines.get(end).is_some_and(|l| l.ends_with('\r')) {
                    replaced.push('\r');
                }
                out.push(replaced);
                skip_through = Some(end);
            }
            None => out.push((*line).to_string()),
        }
    }
    out.join("\n")
}

/// Writes `content` to `path` through a sibling temporary file that is
/// synced and then renamed over the target.
///
/// # Errors
///
/// Returns [`UptodateError::Io`] if any step fails; the target is then
/// left untouched.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| UptodateError::io(dir, e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| UptodateError::io(temp.path(), e))?;
    temp.flush().map_err(|e| UptodateError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| UptodateError::io(temp.path(), e))?;

    if let Ok(metadata) = std::fs::metadata(path) {
        std::fs::set_permissions(temp.path(), metadata.permissions())
            .map_err(|e| UptodateError::io(temp.path(), e))?;
    }
    let _ = temp
        .persist(path)
        .map_err(|e| UptodateError::io(path, e.error))?;
    Ok(())
}

/// Re-reads `path`, applies `updates` and writes the result atomically.
///
/// # Errors
///
/// Returns [`UptodateError::Io`] if reading or writing fails.
pub fn write_updates(path: &Path, updates: &[Update]) -> Result<()> {
    let content = std::fs::read_to_string(path).map_err(|e| UptodateError::io(path, e))?;
    for update in updates {
        info!(path = %path.display(), from = %update.original, to = %update.updated, "updating");
    }
    write_atomic(path, &apply_updates(&content, updates))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(line_index: usize, end_index: usize, updated: &str) -> Update {
        Update {
            keyword: "FROM".to_string(),
            flags: Vec::new(),
            original: String::new(),
            updated: updated.to_string(),
            line_index,
            end_index,
        }
    }

    #[test]
    fn apply_updates_replaces_exact_lines() {
        let content = "FROM a:1\nRUN x\nFROM b:2 AS b\n";
        let out = apply_updates(
            content,
            &[update(2, 2, "b:2@sha256:bb AS b"), update(0, 0, "a:1@sha256:aa")],
        );
        assert_eq!(out, "FROM a:1@sha256:aa\nRUN x\nFROM b:2@sha256:bb AS b\n");
    }

    #[test]
    fn apply_updates_collapses_continued_statement() {
        let content = "FROM \\\n  a:1\nRUN x\nFROM b:2";
        let out = apply_updates(content, &[update(0, 1, "a:1@sha256:aa"), update(3, 3, "b:3")]);
        assert_eq!(out, "FROM a:1@sha256:aa\nRUN x\nFROM b:3");
    }

    #[test]
    fn apply_updates_keeps_crlf_and_indent() {
        let content = "  FROM a:1\r\nRUN x\r\n";
        let out = apply_updates(content, &[update(0, 0, "a:2")]);
        assert_eq!(out, "  FROM a:2\r\nRUN x\r\n");
    }

    #[test]
    fn apply_updates_without_updates_is_identity() {
        let content = "FROM a:1\n\n# comment\n";
        assert_eq!(apply_updates(content, &[]), content);
    }

    #[test]
    fn write_updates_rewrites_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Dockerfile");
        std::fs::write(&path, "FROM a:1\nRUN x\n").expect("write");
        write_updates(&path, &[update(0, 0, "a:1@sha256:aa")]).expect("should write");
        let content = std::fs::read_to_string(&path).expect("read");
        assert_eq!(content, "FROM a:1@sha256:aa\nRUN x\n");
    }

    #[test]
    fn write_updates_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = write_updates(&dir.path().join("Dockerfile"), &[]).unwrap_err();
        assert!(matches!(err, UptodateError::Io { .. }));
    }
}
