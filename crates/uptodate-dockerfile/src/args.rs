//! Resolution of recognized `ARG` defaults.
//!
//! Three name prefixes are understood:
//!
//! - `uptodate_spack_<package>`: newest version in the package index.
//! - `uptodate_github_release_<org>__<repo>`: newest release name.
//! - `uptodate_github_commit_<org>__<repo>__<branch>`: newest commit on
//!   the branch.
//!
//! Only the default value is replaced; anything after the declaration on
//! the same line is carried over.

use tracing::{debug, info, warn};
use uptodate_common::constants::{
    GITHUB_ARG_SEPARATOR, GITHUB_COMMIT_ARG_PREFIX, GITHUB_RELEASE_ARG_PREFIX, SPACK_ARG_PREFIX,
};
use uptodate_common::error::Result;
use uptodate_registry::{PackageIndex, SourceHost};

use crate::parser::ast::{ArgDecl, Instruction};
use crate::update::Update;

/// Where a recognized `ARG` takes its newest value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSource {
    /// Newest version of a package-index package.
    Package {
        /// Package name.
        package: String,
    },
    /// Newest release of `org/repo`.
    Release {
        /// `org/repo`.
        repository: String,
    },
    /// Newest commit of `org/repo` on `branch`.
    Commit {
        /// `org/repo`.
        repository: String,
        /// Branch name.
        branch: String,
    },
}

impl ArgSource {
    /// Classifies a build argument name. Unrecognized or malformed names
    /// yield `None`.
    #[must_use]
    pub fn classify(name: &str) -> Option<Self> {
        if let Some(package) = name.strip_prefix(SPACK_ARG_PREFIX) {
            return (!package.is_empty()).then(|| Self::Package {
                package: package.to_string(),
            });
        }
        if let Some(rest) = name.strip_prefix(GITHUB_RELEASE_ARG_PREFIX) {
            let Some((org, repo)) = rest.split_once(GITHUB_ARG_SEPARATOR) else {
                warn!(name, "cannot find double underscore separating org from repository");
                return None;
            };
            if org.is_empty() || repo.is_empty() {
                warn!(name, "org or repository is empty");
                return None;
            }
            return Some(Self::Release {
                repository: format!("{org}/{repo}"),
            });
        }
        if let Some(rest) = name.strip_prefix(GITHUB_COMMIT_ARG_PREFIX) {
            let parts: Vec<&str> = rest.split(GITHUB_ARG_SEPARATOR).collect();
            let [org, repo, branch] = parts.as_slice() else {
                warn!(name, "expected <org>__<repo>__<branch>");
                return None;
            };
            if org.is_empty() || repo.is_empty() || branch.is_empty() {
                warn!(name, "org, repository, or branch is empty");
                return None;
            }
            return Some(Self::Commit {
                repository: format!("{org}/{repo}"),
                branch: (*branch).to_string(),
            });
        }
        None
    }
}

/// Collaborators consulted for `ARG` defaults.
#[derive(Clone, Copy)]
pub struct ArgResolvers<'a> {
    /// Package index for `uptodate_spack_` arguments.
    pub packages: &'a dyn PackageIndex,
    /// Source host for `uptodate_github_` arguments.
    pub source_host: &'a dyn SourceHost,
}

impl std::fmt::Debug for ArgResolvers<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgResolvers").finish_non_exhaustive()
    }
}

impl ArgResolvers<'_> {
    /// Looks up the newest value for `source`.
    ///
    /// # Errors
    ///
    /// Propagates collaborator errors.
    pub fn newest(&self, source: &ArgSource) -> Result<Option<String>> {
        let newest = match source {
            ArgSource::Package { package } => {
                self.packages.list_versions(package)?.into_iter().next()
            }
            ArgSource::Release { repository } => self
                .source_host
                .list_releases(repository)?
                .into_iter()
                .next()
                .map(|r| r.name),
            ArgSource::Commit { repository, branch } => self
                .source_host
                .list_commits(repository, branch)?
                .into_iter()
                .next()
                .map(|c| c.sha),
        };
        if newest.is_none() {
            info!(?source, "no versions found, leaving default unchanged");
        }
        Ok(newest)
    }
}

/// Computes the update for one `ARG` instruction, if any.
///
/// # Errors
///
/// Propagates collaborator errors.
pub fn resolve_arg(instruction: &Instruction, resolvers: ArgResolvers<'_>) -> Result<Option<Update>> {
    let Some((declaration, extras)) = instruction.args.split_first() else {
        return Ok(None);
    };
    let decl = ArgDecl::parse(declaration);
    let Some(source) = ArgSource::classify(&decl.name) else {
        return Ok(None);
    };
    debug!(name = %decl.name, "found recognized build arg");
    let Some(newest) = resolvers.newest(&source)? else {
        return Ok(None);
    };

    let updated = std::iter::once(format!("{}={newest}", decl.name))
        .chain(extras.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    if updated == instruction.joined_args() {
        debug!(name = %decl.name, "build arg already at newest value");
        return Ok(None);
    }
    Ok(Some(Update::replacing(instruction, updated)))
}

#[cfg(test)]
mod tests {
    use uptodate_registry::memory::{InMemoryPackageIndex, InMemorySourceHost};

    use super::*;
    use crate::parser::ast::BuildFile;

    fn fixtures() -> (InMemoryPackageIndex, InMemorySourceHost) {
        (
            InMemoryPackageIndex::new().with_package("zlib", &["1.2.13", "1.2.12", "1.2.11"]),
            InMemorySourceHost::new()
                .with_releases("spack/spack", &["v0.21.0", "v0.20.3"])
                .with_commits("spack/spack", "develop", &["f00d", "beef"]),
        )
    }

    fn resolve(content: &str) -> Vec<Update> {
        let (packages, host) = fixtures();
        let resolvers = ArgResolvers {
            packages: &packages,
            source_host: &host,
        };
        let file = BuildFile::parse("Dockerfile", content).expect("should parse");
        file.args()
            .filter_map(|arg| resolve_arg(arg, resolvers).expect("should resolve"))
            .collect()
    }

    #[test]
    fn classify_recognizes_prefixes() {
        assert_eq!(
            ArgSource::classify("uptodate_spack_zlib"),
            Some(ArgSource::Package {
                package: "zlib".to_string()
            })
        );
        assert_eq!(
            ArgSource::classify("uptodate_github_commit_spack__spack__develop"),
            Some(ArgSource::Commit {
                repository: "spack/spack".to_string(),
                branch: "develop".to_string()
            })
        );
        assert_eq!(ArgSource::classify("VERSION"), None);
    }

    #[test]
    fn classify_malformed_github_names_rejected() {
        assert_eq!(ArgSource::classify("uptodate_github_release_spack"), None);
        assert_eq!(ArgSource::classify("uptodate_github_release___spack"), None);
        assert_eq!(ArgSource::classify("uptodate_github_commit_spack__spack"), None);
    }

    #[test]
    fn spack_arg_takes_newest_version() {
        let updates = resolve("ARG uptodate_spack_zlib=1.2.11\nFROM alpine\n");
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].line(), "ARG uptodate_spack_zlib=1.2.13");
    }

    #[test]
    fn release_and_commit_args_resolved() {
        let updates = resolve(
            "ARG uptodate_github_release_spack__spack=v0.20.3\n\
             ARG uptodate_github_commit_spack__spack__develop\n",
        );
        assert_eq!(updates[0].updated, "uptodate_github_release_spack__spack=v0.21.0");
        assert_eq!(updates[1].updated, "uptodate_github_commit_spack__spack__develop=f00d");
    }

    #[test]
    fn current_arg_produces_no_update() {
        assert!(resolve("ARG uptodate_spack_zlib=1.2.13\n").is_empty());
    }

    #[test]
    fn trailing_content_preserved() {
        let updates = resolve("ARG uptodate_spack_zlib=1.2.11 OTHER=1\n");
        assert_eq!(updates[0].updated, "uptodate_spack_zlib=1.2.13 OTHER=1");
    }

    #[test]
    fn unknown_package_left_alone() {
        assert!(resolve("ARG uptodate_spack_nothing=1.0\n").is_empty());
    }
}
