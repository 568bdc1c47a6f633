//! Variable Expander: one build-argument declaration to its values.

use tracing::{info, warn};
use uptodate_common::error::Result;
use uptodate_common::types::ImageRef;
use uptodate_dockerfile::resolve_reference;
use uptodate_registry::{PackageIndex, Registry};

use crate::spec::{BuildArgKind, VariableSpec};

/// A build argument with its ordered candidate values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariable {
    /// Build argument name.
    pub name: String,
    /// Values in matrix order.
    pub values: Vec<String>,
}

impl ResolvedVariable {
    /// Creates a variable from any string-like values.
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Collaborators consulted while expanding variables.
#[derive(Clone, Copy)]
pub struct Sources<'a> {
    /// Container registry for tag listing and digest lookup.
    pub registry: &'a dyn Registry,
    /// Package index for `spack` arguments.
    pub packages: &'a dyn PackageIndex,
}

impl std::fmt::Debug for Sources<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sources").finish_non_exhaustive()
    }
}

/// Expands `spec` into its values.
///
/// Resolution misses yield an empty variable; collaborator transport
/// failures are returned.
///
/// # Errors
///
/// Returns collaborator errors and invalid version filters.
pub fn expand(spec: &VariableSpec, sources: Sources<'_>) -> Result<ResolvedVariable> {
    let values = match &spec.kind {
        BuildArgKind::Manual { values, versions } => {
            if !values.is_empty() {
                if !versions.is_empty() {
                    warn!(name = %spec.name, "both values and versions given, using values");
                }
                values.clone()
            } else {
                versions.clone()
            }
        }
        BuildArgKind::Container { image, policy } => {
            let reference = ImageRef::parse(image);
            if reference.tag.is_some() {
                resolve_reference(image, sources.registry)?
                    .into_iter()
                    .collect()
            } else {
                let tags = sources.registry.list_tags(&reference.repository)?;
                policy.resolve(&tags)?
            }
        }
        BuildArgKind::PackageIndex { package, policy } => {
            let mut versions = sources.packages.list_versions(package)?;
            versions.reverse();
            policy.resolve(&versions)?
        }
    };

    if values.is_empty() {
        info!(name = %spec.name, "no values resolved for build arg");
    }
    Ok(ResolvedVariable {
        name: spec.name.clone(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use uptodate_common::types::NamingRole;
    use uptodate_registry::memory::{InMemoryPackageIndex, InMemoryRegistry};

    use super::*;
    use crate::versions::VersionPolicy;

    fn spec(kind: BuildArgKind) -> VariableSpec {
        VariableSpec {
            name: "arg".to_string(),
            slug: "arg".to_string(),
            role: NamingRole::Tag,
            kind,
            params: BTreeMap::new(),
        }
    }

    fn expand_with(kind: BuildArgKind) -> ResolvedVariable {
        let registry = InMemoryRegistry::new()
            .with_tags("ubuntu", &["16.04", "18.04", "20.04", "latest"])
            .with_digest("ubuntu:20.04", "sha256:abc");
        let packages = InMemoryPackageIndex::new().with_package("zlib", &["1.2.13", "1.2.12", "1.2.11"]);
        expand(
            &spec(kind),
            Sources {
                registry: &registry,
                packages: &packages,
            },
        )
        .expect("should expand")
    }

    #[test]
    fn manual_values_preferred_over_versions() {
        let var = expand_with(BuildArgKind::Manual {
            values: vec!["a".into()],
            versions: vec!["1".into()],
        });
        assert_eq!(var.values, vec!["a"]);
    }

    #[test]
    fn manual_versions_used_verbatim() {
        let var = expand_with(BuildArgKind::Manual {
            values: Vec::new(),
            versions: vec!["2".into(), "1".into()],
        });
        assert_eq!(var.values, vec!["2", "1"]);
    }

    #[test]
    fn tagged_container_resolves_single_pinned_value() {
        let var = expand_with(BuildArgKind::Container {
            image: "ubuntu:20.04".into(),
            policy: VersionPolicy::default(),
        });
        assert_eq!(var.values, vec!["ubuntu:20.04@sha256:abc"]);
    }

    #[test]
    fn untagged_container_lists_filtered_tags() {
        let var = expand_with(BuildArgKind::Container {
            image: "ubuntu".into(),
            policy: VersionPolicy {
                filters: vec!["^[0-9]+[.][0-9]+$".into()],
                skips: ["16.04".to_string()].into_iter().collect(),
                ..VersionPolicy::default()
            },
        });
        assert_eq!(var.values, vec!["18.04", "20.04"]);
    }

    #[test]
    fn package_versions_normalized_ascending() {
        let var = expand_with(BuildArgKind::PackageIndex {
            package: "zlib".into(),
            policy: VersionPolicy::default(),
        });
        assert_eq!(var.values, vec!["1.2.11", "1.2.12", "1.2.13"]);
    }

    #[test]
    fn unknown_sources_yield_empty_variable() {
        let missing_image = expand_with(BuildArgKind::Container {
            image: "nothing:1.0".into(),
            policy: VersionPolicy::default(),
        });
        assert!(missing_image.values.is_empty());
        let missing_package = expand_with(BuildArgKind::PackageIndex {
            package: "nothing".into(),
            policy: VersionPolicy::default(),
        });
        assert!(missing_package.values.is_empty());
    }
}
