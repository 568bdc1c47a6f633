//! Docker hierarchies: one subdirectory per image tag, each with its own
//! Dockerfile. Missing tags are created from the newest present one.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uptodate_common::constants::{DOCKERFILE_NAME, VERSION_REGEX};
use uptodate_common::error::{Result, UptodateError};
use uptodate_common::types::FileRecord;
use uptodate_dockerfile::parser::ast::BuildFile;
use uptodate_dockerfile::update::replace_froms;
use uptodate_dockerfile::writer::{apply_updates, write_atomic};
use uptodate_registry::Registry;

use crate::spec::{HierarchySpec, load_spec};

/// Parser name recorded on output records.
pub const PARSER_NAME: &str = "dockerhierarchy";

/// Outcome for one hierarchy.
#[derive(Debug, Clone, Default)]
pub struct HierarchyReport {
    /// Spec file of the hierarchy.
    pub spec_path: PathBuf,
    /// Container whose tags drive the hierarchy.
    pub container: String,
    /// Tags without a directory (created unless dry run).
    pub missing: Vec<String>,
    /// Tags with a directory.
    pub present: Vec<String>,
    /// Records of created build files.
    pub records: Vec<FileRecord>,
}

/// Creates build files for newly published tags.
pub struct HierarchyUpdater<'a> {
    registry: &'a dyn Registry,
}

impl std::fmt::Debug for HierarchyUpdater<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyUpdater").finish_non_exhaustive()
    }
}

fn tag_directories(root: &Path) -> Result<BTreeSet<String>> {
    let entries = std::fs::read_dir(root).map_err(|e| UptodateError::io(root, e))?;
    let mut dirs = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| UptodateError::io(root, e))?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            let _ = dirs.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(dirs)
}

impl<'a> HierarchyUpdater<'a> {
    /// Creates an updater listing tags from `registry`.
    #[must_use]
    pub const fn new(registry: &'a dyn Registry) -> Self {
        Self { registry }
    }

    /// Updates every hierarchy among `spec_paths`; specs without a
    /// `dockerhierarchy` section are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, I/O or registry error.
    pub fn run(&self, spec_paths: &[PathBuf], dry_run: bool) -> Result<Vec<HierarchyReport>> {
        let mut reports = Vec::new();
        for path in spec_paths {
            let spec = load_spec(path)?;
            let Some(hierarchy) = spec.hierarchy else {
                info!(path = %path.display(), "dockerhierarchy section not found, skipping");
                continue;
            };
            reports.push(self.update(path, &hierarchy, dry_run)?);
        }
        Ok(reports)
    }

    /// Updates the hierarchy declared by the spec at `spec_path`.
    ///
    /// # Errors
    ///
    /// Returns [`UptodateError::Config`] when tags are missing and no
    /// Dockerfile exists to copy, and I/O or registry errors otherwise.
    pub fn update(
        &self,
        spec_path: &Path,
        hierarchy: &HierarchySpec,
        dry_run: bool,
    ) -> Result<HierarchyReport> {
        let root = spec_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let policy = hierarchy.policy.clone().with_default_filter(VERSION_REGEX);
        let tags = self.registry.list_tags(&hierarchy.container)?;
        let versions = policy.resolve(&tags)?;

        let existing = tag_directories(root)?;
        let (present, missing): (Vec<String>, Vec<String>) = versions
            .into_iter()
            .partition(|v| existing.contains(v));

        let mut report = HierarchyReport {
            spec_path: spec_path.to_path_buf(),
            container: hierarchy.container.clone(),
            missing,
            present,
            records: Vec::new(),
        };
        if dry_run || report.missing.is_empty() {
            return Ok(report);
        }

        let template = report
            .present
            .iter()
            .rev()
            .map(|tag| root.join(tag).join(DOCKERFILE_NAME))
            .find(|p| p.is_file())
            .ok_or_else(|| {
                UptodateError::config(format!(
                    "{}: tags {:?} are missing but no existing Dockerfile is present to copy",
                    spec_path.display(),
                    report.missing
                ))
            })?;
        let content =
            std::fs::read_to_string(&template).map_err(|e| UptodateError::io(&template, e))?;

        for tag in &report.missing {
            let dest_dir = root.join(tag);
            std::fs::create_dir_all(&dest_dir).map_err(|e| UptodateError::io(&dest_dir, e))?;
            let dest = dest_dir.join(DOCKERFILE_NAME);
            info!(from = %template.display(), to = %dest.display(), "copying Dockerfile");

            let rewritten = match BuildFile::parse(&dest, &content) {
                Ok(file) => apply_updates(&content, &replace_froms(&file, &hierarchy.container, tag)),
                Err(e) => {
                    warn!(path = %template.display(), error = %e, "template is not a loadable build file, copying as is");
                    content.clone()
                }
            };
            write_atomic(&dest, &rewritten)?;

            let relative = dest.strip_prefix(root).unwrap_or(&dest);
            report.records.push(FileRecord {
                name: relative.display().to_string(),
                filename: dest.display().to_string(),
                parser: PARSER_NAME.to_string(),
                identifier: Some(tag.clone()),
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use uptodate_registry::memory::InMemoryRegistry;

    use super::*;
    use crate::versions::VersionPolicy;

    fn spec() -> HierarchySpec {
        HierarchySpec {
            container: "ghcr.io/org/base".to_string(),
            policy: VersionPolicy::default(),
        }
    }

    #[test]
    fn missing_tags_without_template_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec_path = dir.path().join("uptodate.yaml");
        let registry = InMemoryRegistry::new().with_tags("ghcr.io/org/base", &["1.0"]);
        let err = HierarchyUpdater::new(&registry)
            .update(&spec_path, &spec(), false)
            .unwrap_err();
        assert!(matches!(err, UptodateError::Config { .. }));
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("1.0")).expect("mkdir");
        let spec_path = dir.path().join("uptodate.yaml");
        let registry =
            InMemoryRegistry::new().with_tags("ghcr.io/org/base", &["1.0", "1.1", "latest"]);
        let report = HierarchyUpdater::new(&registry)
            .update(&spec_path, &spec(), true)
            .expect("update");
        assert_eq!(report.present, vec!["1.0"]);
        assert_eq!(report.missing, vec!["1.1"]);
        assert!(!dir.path().join("1.1").exists());
    }
}
