//! Listing of build files, optionally filtered by their `ARG` usage.

use std::path::PathBuf;

use tracing::{debug, warn};
use uptodate_common::types::FileRecord;

use crate::parser::ast::BuildFile;

/// Parser name recorded on output records.
pub const PARSER_NAME: &str = "dockerfilelist";

/// Which build files to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    /// Keep files declaring any `ARG`.
    pub include_args: bool,
    /// Keep files declaring an `ARG` without a default.
    pub include_empty_args: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            include_args: true,
            include_empty_args: true,
        }
    }
}

/// Returns a record for every path that passes `options`.
///
/// Files are only parsed when a filter is active; an unparsable file is
/// dropped from a filtered listing.
#[must_use]
pub fn list_dockerfiles(paths: &[PathBuf], options: ListOptions) -> Vec<FileRecord> {
    let filtering = !options.include_args || !options.include_empty_args;
    paths
        .iter()
        .filter(|path| {
            if !filtering {
                return true;
            }
            match BuildFile::load(path) {
                Ok(file) => {
                    let keep = (options.include_args || !file.has_build_args())
                        && (options.include_empty_args || !file.has_empty_build_args());
                    if !keep {
                        debug!(path = %path.display(), "filtered out by build args");
                    }
                    keep
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "not a loadable build file, skipping");
                    false
                }
            }
        })
        .map(|path| FileRecord::new(path.display().to_string(), PARSER_NAME))
        .collect()
}
