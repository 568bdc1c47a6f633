//! Raw and validated models of `uptodate.yaml` spec files.
//!
//! The raw types mirror the YAML document loosely; [`super::validator`]
//! turns them into the typed model below before any matrix work starts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use uptodate_common::types::NamingRole;

use crate::versions::VersionPolicy;

/// A YAML scalar read as text, so `20.04` and `"20.04"` both decode.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Scalar(pub String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_yaml::Value::deserialize(deserializer)? {
            serde_yaml::Value::String(s) => Ok(Self(s)),
            serde_yaml::Value::Number(n) => Ok(Self(n.to_string())),
            serde_yaml::Value::Bool(b) => Ok(Self(b.to_string())),
            other => Err(D::Error::custom(format!(
                "expected a scalar value, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn strings(values: Vec<Scalar>) -> Vec<String> {
    values.into_iter().map(|s| s.0).collect()
}

const fn default_active() -> bool {
    true
}

/// Top level of a spec file.
#[derive(Debug, Default, Deserialize)]
pub struct RawSpecDocument {
    /// Build-matrix section.
    #[serde(default)]
    pub dockerbuild: Option<RawDockerBuild>,
    /// Docker-hierarchy section.
    #[serde(default)]
    pub dockerhierarchy: Option<RawDockerHierarchy>,
}

/// `dockerbuild:` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDockerBuild {
    /// Whether builds are planned for this spec.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Replaces the directory-derived basename.
    #[serde(default)]
    pub container_basename: Option<String>,
    /// Build arguments keyed by name; document order is kept.
    #[serde(default)]
    pub build_args: serde_yaml::Mapping,
    /// Explicit matrix columns, zipped positionally.
    #[serde(default)]
    pub matrix: BTreeMap<String, Vec<Scalar>>,
    /// Excluded rows as parallel columns.
    #[serde(default)]
    pub exclude: BTreeMap<String, Vec<Scalar>>,
}

/// One entry of `build_args:`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBuildArg {
    /// `container`, `spack` or `manual`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Image or package name.
    #[serde(default)]
    pub name: Option<String>,
    /// Naming-role override.
    #[serde(default)]
    pub role: Option<NamingRole>,
    /// Slug used in container names.
    #[serde(default)]
    pub slug: Option<String>,
    /// Literal values.
    #[serde(default)]
    pub values: Vec<Scalar>,
    /// Literal versions.
    #[serde(default)]
    pub versions: Vec<Scalar>,
    /// Version filters.
    #[serde(default)]
    pub filter: Vec<String>,
    /// First version to keep.
    #[serde(default)]
    pub startat: Option<Scalar>,
    /// Last version to keep.
    #[serde(default)]
    pub endat: Option<Scalar>,
    /// Versions to drop.
    #[serde(default)]
    pub skips: Vec<Scalar>,
    /// Versions to always keep.
    #[serde(default)]
    pub includes: Vec<Scalar>,
    /// Free-form parameters.
    #[serde(default)]
    pub params: BTreeMap<String, Scalar>,
}

/// `dockerhierarchy:` section.
#[derive(Debug, Deserialize)]
pub struct RawDockerHierarchy {
    /// Container whose tags drive the hierarchy.
    pub container: RawHierarchyContainer,
}

/// `dockerhierarchy.container:`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawHierarchyContainer {
    /// Image repository.
    #[serde(default)]
    pub name: Option<String>,
    /// Tag filters.
    #[serde(default)]
    pub filter: Vec<String>,
    /// First tag to keep.
    #[serde(default)]
    pub startat: Option<Scalar>,
    /// Last tag to keep.
    #[serde(default)]
    pub endat: Option<Scalar>,
    /// Tags to drop.
    #[serde(default)]
    pub skips: Vec<Scalar>,
    /// Tags to always keep.
    #[serde(default)]
    pub includes: Vec<Scalar>,
}

/// How a build argument produces its candidate values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildArgKind {
    /// Values listed in the spec.
    Manual {
        /// Literal values.
        values: Vec<String>,
        /// Literal versions, used when `values` is empty.
        versions: Vec<String>,
    },
    /// Tags of a container image, or its pinned digest when tagged.
    Container {
        /// Image reference, with or without tag.
        image: String,
        /// Tag policy.
        policy: VersionPolicy,
    },
    /// Versions of a package-index package.
    PackageIndex {
        /// Package name.
        package: String,
        /// Version policy.
        policy: VersionPolicy,
    },
}

impl BuildArgKind {
    /// Type segment used in `uptodate_matrix_<type>_<name>` labels.
    #[must_use]
    pub const fn label_type(&self) -> &'static str {
        match self {
            Self::Manual { .. } => "manual",
            Self::Container { .. } => "container",
            Self::PackageIndex { .. } => "spack",
        }
    }

    /// Naming role used when the spec does not set one.
    #[must_use]
    pub const fn default_role(&self) -> NamingRole {
        match self {
            Self::Container { .. } => NamingRole::Container,
            Self::Manual { .. } | Self::PackageIndex { .. } => NamingRole::Tag,
        }
    }

    /// Image reference of a container argument.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        match self {
            Self::Container { image, .. } => Some(image),
            _ => None,
        }
    }
}

/// A validated build argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    /// Build argument name.
    pub name: String,
    /// Slug used in container names.
    pub slug: String,
    /// Naming role.
    pub role: NamingRole,
    /// Value source.
    pub kind: BuildArgKind,
    /// Free-form parameters.
    pub params: BTreeMap<String, String>,
}

/// A validated `dockerbuild:` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// Whether builds are planned.
    pub active: bool,
    /// Replaces the directory-derived basename.
    pub container_basename: Option<String>,
    /// Build arguments in declaration order.
    pub variables: Vec<VariableSpec>,
    /// Explicit matrix columns.
    pub matrix: Option<BTreeMap<String, Vec<String>>>,
    /// Exclusion columns.
    pub exclude: Option<BTreeMap<String, Vec<String>>>,
}

/// A validated `dockerhierarchy:` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchySpec {
    /// Image repository.
    pub container: String,
    /// Tag policy.
    pub policy: VersionPolicy,
}

/// A decoded spec file.
#[derive(Debug, Clone)]
pub struct SpecFile {
    /// Location on disk.
    pub path: PathBuf,
    /// Build-matrix section, if present.
    pub build: Option<BuildSpec>,
    /// Docker-hierarchy section, if present.
    pub hierarchy: Option<HierarchySpec>,
}
