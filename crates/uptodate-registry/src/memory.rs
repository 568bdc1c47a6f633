//! In-memory collaborators for offline runs and tests.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use uptodate_common::error::Result;
use uptodate_common::types::Digest;

use crate::{
    ChangeDetector, ChangedFile, Commit, PackageIndex, Registry, Release, SourceHost,
};

/// A [`Registry`] populated up front.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    tags: BTreeMap<String, Vec<String>>,
    labels: BTreeMap<String, BTreeMap<String, String>>,
    digests: BTreeMap<String, Digest>,
    digest_lookups: AtomicUsize,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `tags` for `repository`, in registry order.
    #[must_use]
    pub fn with_tags(mut self, repository: &str, tags: &[&str]) -> Self {
        let _ = self.tags.insert(
            repository.to_string(),
            tags.iter().map(|t| (*t).to_string()).collect(),
        );
        self
    }

    /// Publishes an image config for `reference` carrying `labels`.
    #[must_use]
    pub fn with_labels(mut self, reference: &str, labels: &[(&str, &str)]) -> Self {
        let _ = self.labels.insert(
            reference.to_string(),
            labels
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self
    }

    /// Makes `reference` (`repository:tag`) resolve to `digest`.
    ///
    /// # Panics
    ///
    /// Panics if `digest` is malformed.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_digest(mut self, reference: &str, digest: &str) -> Self {
        let _ = self.digests.insert(
            reference.to_string(),
            Digest::parse(digest).expect("test digest must be well formed"),
        );
        self
    }

    /// Number of digest lookups served so far.
    pub fn digest_lookups(&self) -> usize {
        self.digest_lookups.load(Ordering::SeqCst)
    }
}

impl Registry for InMemoryRegistry {
    fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        Ok(self.tags.get(repository).cloned().unwrap_or_default())
    }

    fn image_labels(&self, reference: &str) -> Result<BTreeMap<String, String>> {
        Ok(self.labels.get(reference).cloned().unwrap_or_default())
    }

    fn resolve_digest(&self, reference: &str) -> Result<Option<Digest>> {
        let _ = self.digest_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.digests.get(reference).cloned())
    }
}

/// A [`PackageIndex`] populated up front.
#[derive(Debug, Default)]
pub struct InMemoryPackageIndex {
    packages: BTreeMap<String, Vec<String>>,
}

impl InMemoryPackageIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `versions` (newest first) for `package`.
    #[must_use]
    pub fn with_package(mut self, package: &str, versions: &[&str]) -> Self {
        let _ = self.packages.insert(
            package.to_string(),
            versions.iter().map(|v| (*v).to_string()).collect(),
        );
        self
    }
}

impl PackageIndex for InMemoryPackageIndex {
    fn list_versions(&self, package: &str) -> Result<Vec<String>> {
        Ok(self.packages.get(package).cloned().unwrap_or_default())
    }
}

/// A [`SourceHost`] populated up front.
#[derive(Debug, Default)]
pub struct InMemorySourceHost {
    releases: BTreeMap<String, Vec<Release>>,
    commits: BTreeMap<(String, String), Vec<Commit>>,
}

impl InMemorySourceHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes releases (newest first) for `repository`.
    #[must_use]
    pub fn with_releases(mut self, repository: &str, names: &[&str]) -> Self {
        let _ = self.releases.insert(
            repository.to_string(),
            names
                .iter()
                .map(|n| Release {
                    name: (*n).to_string(),
                    tag_name: (*n).to_string(),
                })
                .collect(),
        );
        self
    }

    /// Publishes commits (newest first) for `repository` on `branch`.
    #[must_use]
    pub fn with_commits(mut self, repository: &str, branch: &str, shas: &[&str]) -> Self {
        let _ = self.commits.insert(
            (repository.to_string(), branch.to_string()),
            shas.iter()
                .map(|s| Commit {
                    sha: (*s).to_string(),
                })
                .collect(),
        );
        self
    }
}

impl SourceHost for InMemorySourceHost {
    fn list_releases(&self, repository: &str) -> Result<Vec<Release>> {
        Ok(self.releases.get(repository).cloned().unwrap_or_default())
    }

    fn list_commits(&self, repository: &str, branch: &str) -> Result<Vec<Commit>> {
        Ok(self
            .commits
            .get(&(repository.to_string(), branch.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// A [`ChangeDetector`] that reports a fixed change set.
#[derive(Debug, Default)]
pub struct StaticChanges {
    changes: Vec<ChangedFile>,
}

impl StaticChanges {
    /// Creates a detector reporting `changes` for any root and branch.
    #[must_use]
    pub const fn new(changes: Vec<ChangedFile>) -> Self {
        Self { changes }
    }
}

impl ChangeDetector for StaticChanges {
    fn changed_files(&self, _root: &Path, _branch: &str) -> Result<Vec<ChangedFile>> {
        Ok(self.changes.clone())
    }
}
