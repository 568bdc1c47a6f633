//! Result output for calling pipelines.
//!
//! Results are serialized as a JSON array. Inside a GitHub Actions step
//! (`GITHUB_OUTPUT` set) they are appended to the step output file as
//! `<parser>_matrix` and `<parser>_matrix_empty`; otherwise the JSON goes
//! to stdout.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use uptodate_common::constants::GITHUB_OUTPUT_ENV;

/// Builds the `key=value` lines for one result set.
#[must_use]
pub fn github_output_lines(parser: &str, json: &str, empty: bool) -> String {
    format!("{parser}_matrix={json}\n{parser}_matrix_empty={empty}\n")
}

/// Appends `lines` to the step output file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn append_github_output(path: &Path, lines: &str) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    file.write_all(lines.as_bytes())
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

/// Emits `results` for `parser`.
///
/// # Errors
///
/// Returns an error on serialization or write failure.
pub fn emit<T: Serialize>(parser: &str, results: &[T]) -> anyhow::Result<()> {
    let json = serde_json::to_string(results)?;
    match std::env::var(GITHUB_OUTPUT_ENV) {
        Ok(path) if !path.trim().is_empty() => append_github_output(
            Path::new(&path),
            &github_output_lines(parser, &json, results.is_empty()),
        ),
        _ => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", serde_json::to_string_pretty(results)?)?;
            Ok(())
        }
    }
}

/// Formats a heading followed by aligned `label: count` rows.
#[must_use]
pub fn format_summary(heading: &str, rows: &[(&str, usize)]) -> String {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or_default();
    let mut summary = format!("{heading}\n{}\n", "=".repeat(heading.len()));
    for (label, count) in rows {
        let _ = writeln!(summary, "  {label:<width$}  {count}");
    }
    summary
}
