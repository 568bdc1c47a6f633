//! Validation of raw spec documents into the typed model.
//!
//! Every check runs before any matrix work, so a bad spec aborts the run
//! with a field-level message instead of silently defaulting.

use std::collections::BTreeMap;
use std::path::Path;

use uptodate_common::error::{Result, UptodateError};

use super::model::{
    BuildArgKind, BuildSpec, HierarchySpec, RawBuildArg, RawDockerBuild, RawDockerHierarchy,
    RawSpecDocument, Scalar, SpecFile, VariableSpec, strings,
};
use crate::versions::VersionPolicy;

/// Validates a raw document read from `path`.
///
/// # Checks performed
///
/// 1. Every build-arg key is a string and every entry decodes.
/// 2. `type` is `container`, `spack`, `manual` or absent.
/// 3. Container and spack arguments have a `name`.
/// 4. Manual arguments have `values` or `versions`.
/// 5. Exclusion columns all have the same length.
/// 6. A hierarchy container has a `name`.
///
/// A build arg without `role` takes [`BuildArgKind::default_role`]:
/// `container` args name the image, `manual` and `spack` args the tag.
///
/// # Errors
///
/// Returns [`UptodateError::Config`] naming the file and field at fault.
pub fn validate(path: &Path, raw: RawSpecDocument) -> Result<SpecFile> {
    let build = raw
        .dockerbuild
        .map(|b| validate_build(path, b))
        .transpose()?;
    let hierarchy = raw
        .dockerhierarchy
        .map(|h| validate_hierarchy(path, h))
        .transpose()?;
    Ok(SpecFile {
        path: path.to_path_buf(),
        build,
        hierarchy,
    })
}

fn config_err(path: &Path, message: impl std::fmt::Display) -> UptodateError {
    UptodateError::config(format!("{}: {message}", path.display()))
}

fn policy(
    filter: Vec<String>,
    startat: Option<Scalar>,
    endat: Option<Scalar>,
    skips: Vec<Scalar>,
    includes: Vec<Scalar>,
) -> VersionPolicy {
    VersionPolicy {
        filters: filter,
        start_at: startat.map(|s| s.0),
        end_at: endat.map(|s| s.0),
        skips: skips.into_iter().map(|s| s.0).collect(),
        includes: includes.into_iter().map(|s| s.0).collect(),
    }
}

fn validate_build(path: &Path, raw: RawDockerBuild) -> Result<BuildSpec> {
    let mut variables = Vec::with_capacity(raw.build_args.len());
    for (key, value) in raw.build_args {
        let Some(name) = key.as_str().map(str::to_string) else {
            return Err(config_err(path, format!("build arg key {key:?} is not a string")));
        };
        let arg: RawBuildArg = serde_yaml::from_value(value)
            .map_err(|e| config_err(path, format!("build arg \"{name}\": {e}")))?;
        variables.push(validate_build_arg(path, name, arg)?);
    }

    let exclude = columns(raw.exclude);
    if let Some(exclude) = &exclude {
        check_equal_lengths(path, exclude)?;
    }

    Ok(BuildSpec {
        active: raw.active,
        container_basename: raw.container_basename.filter(|b| !b.is_empty()),
        variables,
        matrix: columns(raw.matrix),
        exclude,
    })
}

fn columns(raw: BTreeMap<String, Vec<Scalar>>) -> Option<BTreeMap<String, Vec<String>>> {
    if raw.is_empty() {
        return None;
    }
    Some(raw.into_iter().map(|(k, v)| (k, strings(v))).collect())
}

fn check_equal_lengths(path: &Path, columns: &BTreeMap<String, Vec<String>>) -> Result<()> {
    let mut lengths = columns.values().map(Vec::len);
    let first = lengths.next().unwrap_or_default();
    if lengths.any(|len| len != first) {
        return Err(config_err(path, "all entries in exclude must have equal length"));
    }
    Ok(())
}

fn validate_build_arg(path: &Path, name: String, raw: RawBuildArg) -> Result<VariableSpec> {
    let required_name = |kind: &str| {
        raw.name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| config_err(path, format!("{kind} build arg \"{name}\" requires a name")))
    };

    let kind = match raw.kind.as_deref() {
        Some("container") => BuildArgKind::Container {
            image: required_name("container")?,
            policy: policy(raw.filter, raw.startat, raw.endat, raw.skips, raw.includes),
        },
        Some("spack") => BuildArgKind::PackageIndex {
            package: required_name("spack")?,
            policy: policy(raw.filter, raw.startat, raw.endat, raw.skips, raw.includes),
        },
        None | Some("manual") => {
            if raw.values.is_empty() && raw.versions.is_empty() {
                return Err(config_err(
                    path,
                    format!("manual build arg \"{name}\" needs values or versions"),
                ));
            }
            BuildArgKind::Manual {
                values: strings(raw.values),
                versions: strings(raw.versions),
            }
        }
        Some(other) => {
            return Err(config_err(
                path,
                format!(
                    "build arg \"{name}\" has unknown type \"{other}\" (expected container, spack or manual)"
                ),
            ));
        }
    };

    Ok(VariableSpec {
        slug: raw.slug.filter(|s| !s.is_empty()).unwrap_or_else(|| name.clone()),
        role: raw.role.unwrap_or_else(|| kind.default_role()),
        params: raw.params.into_iter().map(|(k, v)| (k, v.0)).collect(),
        name,
        kind,
    })
}

fn validate_hierarchy(path: &Path, raw: RawDockerHierarchy) -> Result<HierarchySpec> {
    let container = raw.container;
    let Some(name) = container.name.filter(|n| !n.is_empty()) else {
        return Err(config_err(path, "dockerhierarchy container requires a name"));
    };
    Ok(HierarchySpec {
        container: name,
        policy: policy(
            container.filter,
            container.startat,
            container.endat,
            container.skips,
            container.includes,
        ),
    })
}
