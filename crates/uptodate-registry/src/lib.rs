//! # uptodate-registry
//!
//! External collaborators consumed by the matrix engine and the build-file
//! updater. Each concern is a trait so the core can run against the
//! in-memory doubles in [`memory`]:
//!
//! - **Registry**: tag listing, image config labels, digest lookup ([`crane`]).
//! - **Package index**: versions of a named package ([`spack`]).
//! - **Source host**: releases and branch commits ([`github`]).
//! - **Changes**: paths touched relative to a branch ([`git`]).

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod crane;
pub mod git;
pub mod github;
pub mod http;
pub mod memory;
pub mod spack;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uptodate_common::error::Result;
use uptodate_common::types::Digest;

/// Read access to a container registry.
pub trait Registry: Send + Sync {
    /// Lists the tags of `repository` in registry order.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached.
    fn list_tags(&self, repository: &str) -> Result<Vec<String>>;

    /// Returns the labels of the image config published at `reference`.
    /// A missing image yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached.
    fn image_labels(&self, reference: &str) -> Result<BTreeMap<String, String>>;

    /// Returns the current digest of `repository:tag`, or `None` when the
    /// registry does not know it.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached.
    fn resolve_digest(&self, reference: &str) -> Result<Option<Digest>>;
}

/// Version metadata for named packages.
pub trait PackageIndex: Send + Sync {
    /// Lists the versions of `package`, newest first. Unknown packages
    /// yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be reached or decoded.
    fn list_versions(&self, package: &str) -> Result<Vec<String>>;
}

/// A published release on a source host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release name (falls back to the tag name when unnamed).
    pub name: String,
    /// Git tag the release points at.
    pub tag_name: String,
}

/// A commit on a source host branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash.
    pub sha: String,
}

/// Releases and commits of hosted repositories.
pub trait SourceHost: Send + Sync {
    /// Lists releases of `org/repo`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be reached or decoded.
    fn list_releases(&self, repository: &str) -> Result<Vec<Release>>;

    /// Lists commits of `org/repo` on `branch`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be reached or decoded.
    fn list_commits(&self, repository: &str, branch: &str) -> Result<Vec<Commit>>;
}

/// Kind of change a commit range applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    /// Path was added.
    Added,
    /// Path contents changed.
    Modified,
    /// Path was removed.
    Deleted,
}

impl ChangeAction {
    /// Returns whether the path still exists after the change.
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Added | Self::Modified)
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "Insert"),
            Self::Modified => write!(f, "Modify"),
            Self::Deleted => write!(f, "Delete"),
        }
    }
}

/// One changed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path joined onto the repository root.
    pub path: PathBuf,
    /// What happened to it.
    pub action: ChangeAction,
}

/// Detects which files a branch comparison touched.
pub trait ChangeDetector: Send + Sync {
    /// Lists every changed file under `root` relative to `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not inside a repository or the
    /// comparison commit cannot be found.
    fn changed_files(&self, root: &Path, branch: &str) -> Result<Vec<ChangedFile>>;

    /// Lists added or modified paths only.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`ChangeDetector::changed_files`].
    fn changed_paths(&self, root: &Path, branch: &str) -> Result<Vec<PathBuf>> {
        Ok(self
            .changed_files(root, branch)?
            .into_iter()
            .filter(|c| c.action.is_present())
            .map(|c| c.path)
            .collect())
    }
}
