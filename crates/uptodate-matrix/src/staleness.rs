//! Staleness Comparator: decides whether a matrix entry needs a build by
//! comparing freshly resolved values with the labels of the published
//! image.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use tracing::{debug, info};
use uptodate_common::constants::MATRIX_LABEL_PREFIX;
use uptodate_common::error::Result;
use uptodate_common::types::{ImageRef, NamingRole};
use uptodate_dockerfile::resolve_reference;
use uptodate_registry::Registry;

use crate::matrix::MatrixEntry;
use crate::naming::NamingRoles;

/// A decoded `uptodate_matrix_<type>_<name>` image label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Full label key.
    pub key: String,
    /// Build argument type segment.
    pub label_type: String,
    /// Build argument name.
    pub name: String,
    /// Recorded value.
    pub value: String,
}

impl Label {
    /// Decodes a label; keys without the matrix prefix or without a
    /// `<type>_<name>` split yield `None`.
    #[must_use]
    pub fn decode(key: &str, value: &str) -> Option<Self> {
        let rest = key.strip_prefix(MATRIX_LABEL_PREFIX)?;
        let (label_type, name) = rest.split_once('_')?;
        if label_type.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            label_type: label_type.to_string(),
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Encodes the label key for `label_type` and `name`.
    #[must_use]
    pub fn key_for(label_type: &str, name: &str) -> String {
        format!("{MATRIX_LABEL_PREFIX}{label_type}_{name}")
    }
}

/// Decodes every matrix label of an image config, keyed by name.
#[must_use]
pub fn decode_labels(labels: &BTreeMap<String, String>) -> BTreeMap<String, Label> {
    labels
        .iter()
        .filter_map(|(k, v)| Label::decode(k, v))
        .map(|l| (l.name.clone(), l))
        .collect()
}

/// Within-run cache of resolved container references.
#[derive(Debug, Default)]
pub struct LatestCache {
    resolved: Mutex<HashMap<String, Option<String>>>,
}

impl LatestCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `reference` once per run.
    ///
    /// # Errors
    ///
    /// Propagates registry errors; failures are not cached.
    pub fn resolve(&self, reference: &str, registry: &dyn Registry) -> Result<Option<String>> {
        if let Some(hit) = self
            .resolved
            .lock()
            .ok()
            .and_then(|cache| cache.get(reference).cloned())
        {
            return Ok(hit);
        }
        let resolved = resolve_reference(reference, registry)?;
        if let Ok(mut cache) = self.resolved.lock() {
            let _ = cache.insert(reference.to_string(), resolved.clone());
        }
        Ok(resolved)
    }
}

/// Reference looked up for a container-role value: the value itself when
/// it is already a full reference, otherwise `image:value`.
fn container_reference(image: &str, value: &str) -> String {
    if value.contains(':') || value.contains('@') {
        value.to_string()
    } else {
        format!("{}:{value}", ImageRef::parse(image).repository)
    }
}

/// Re-resolves every container-argument value of `entry`, keyed by name.
///
/// # Errors
///
/// Propagates registry errors.
pub fn latest_values(
    entry: &MatrixEntry,
    roles: &NamingRoles,
    registry: &dyn Registry,
    cache: &LatestCache,
) -> Result<BTreeMap<String, String>> {
    let mut latest = BTreeMap::new();
    for binding in roles.with_role(NamingRole::Container) {
        let (Some(image), Some(value)) = (binding.image.as_deref(), entry.get(&binding.name)) else {
            continue;
        };
        let reference = container_reference(image, value);
        if let Some(resolved) = cache.resolve(&reference, registry)? {
            let _ = latest.insert(binding.name.clone(), resolved);
        }
    }
    Ok(latest)
}

/// Build labels recording the latest values of container arguments.
#[must_use]
pub fn build_labels(latest: &BTreeMap<String, String>, roles: &NamingRoles) -> BTreeMap<String, String> {
    roles
        .iter()
        .filter_map(|binding| {
            let value = latest.get(&binding.name)?;
            Some((Label::key_for(binding.label_type, &binding.name), value.clone()))
        })
        .collect()
}

/// Matrix labels of the image published at `container_name`, or `None`
/// when the repository has no tags.
///
/// # Errors
///
/// Propagates registry errors.
pub fn current_labels(
    container_name: &str,
    registry: &dyn Registry,
) -> Result<Option<BTreeMap<String, Label>>> {
    let repository = ImageRef::parse(container_name).repository;
    if registry.list_tags(&repository)?.is_empty() {
        info!(repository, "container has no tags, skipping label lookup");
        return Ok(None);
    }
    Ok(Some(decode_labels(&registry.image_labels(container_name)?)))
}

/// Outcome of comparing latest values with published labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Every build was requested.
    Forced,
    /// Nothing is known about the published image.
    UnknownState,
    /// The published image has no matrix labels but values are known.
    Unlabeled,
    /// A recorded value differs from the latest one.
    Changed {
        /// Build argument name.
        name: String,
    },
    /// A recorded value has no latest counterpart.
    MissingLatest {
        /// Build argument name.
        name: String,
    },
    /// Every recorded value matches.
    UpToDate,
}

impl Decision {
    /// Whether the decision calls for a build.
    #[must_use]
    pub const fn should_build(&self) -> bool {
        !matches!(self, Self::UpToDate)
    }
}

/// Applies the rebuild decision table.
#[must_use]
pub fn decide(
    latest: &BTreeMap<String, String>,
    current: Option<&BTreeMap<String, Label>>,
    force_all: bool,
) -> Decision {
    if force_all {
        return Decision::Forced;
    }
    let Some(current) = current else {
        return Decision::UnknownState;
    };
    if current.is_empty() && !latest.is_empty() {
        return Decision::Unlabeled;
    }
    for label in current.values() {
        match latest.get(&label.name) {
            None => {
                return Decision::MissingLatest {
                    name: label.name.clone(),
                };
            }
            Some(value) if *value != label.value => {
                debug!(name = %label.name, current = %label.value, latest = %value, "value changed");
                return Decision::Changed {
                    name: label.name.clone(),
                };
            }
            Some(_) => {}
        }
    }
    Decision::UpToDate
}

/// Returns whether `container_name` should be built given the latest
/// values and the published labels of every known container.
#[must_use]
pub fn should_build(
    container_name: &str,
    latest: &BTreeMap<String, String>,
    current: &BTreeMap<String, BTreeMap<String, Label>>,
    force_all: bool,
) -> bool {
    decide(latest, current.get(container_name), force_all).should_build()
}

#[cfg(test)]
mod tests {
    use uptodate_registry::memory::InMemoryRegistry;

    use super::*;
    use crate::naming::RoleBinding;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, Label> {
        decode_labels(
            &pairs
                .iter()
                .map(|(name, v)| (Label::key_for("container", name), (*v).to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn container_roles() -> NamingRoles {
        NamingRoles::new(vec![RoleBinding {
            name: "base".to_string(),
            slug: "base".to_string(),
            role: NamingRole::Container,
            label_type: "container",
            image: Some("ubuntu".to_string()),
        }])
    }

    #[test]
    fn label_decode_splits_type_and_name() {
        let label = Label::decode("uptodate_matrix_container_base_image", "x").expect("label");
        assert_eq!(label.label_type, "container");
        assert_eq!(label.name, "base_image");
        assert!(Label::decode("org.opencontainers.image.source", "x").is_none());
        assert!(Label::decode("uptodate_matrix_container", "x").is_none());
    }

    #[test]
    fn force_all_always_builds() {
        let latest = map(&[("base", "a")]);
        let current = labels(&[("base", "a")]);
        assert_eq!(decide(&latest, Some(&current), true), Decision::Forced);
        assert!(decide(&latest, Some(&current), true).should_build());
        assert!(!decide(&latest, Some(&current), false).should_build());
    }

    #[test]
    fn decision_table() {
        let latest = map(&[("base", "a")]);
        assert_eq!(decide(&latest, None, false), Decision::UnknownState);
        assert_eq!(
            decide(&latest, Some(&BTreeMap::new()), false),
            Decision::Unlabeled
        );
        assert_eq!(
            decide(&latest, Some(&labels(&[("base", "old")])), false),
            Decision::Changed {
                name: "base".to_string()
            }
        );
        assert_eq!(
            decide(&latest, Some(&labels(&[("other", "x")])), false),
            Decision::MissingLatest {
                name: "other".to_string()
            }
        );
        assert_eq!(
            decide(&latest, Some(&labels(&[("base", "a")])), false),
            Decision::UpToDate
        );
        assert_eq!(
            decide(&BTreeMap::new(), Some(&BTreeMap::new()), false),
            Decision::UpToDate
        );
    }

    #[test]
    fn should_build_looks_up_container() {
        let latest = map(&[("base", "a")]);
        let mut current = BTreeMap::new();
        let _ = current.insert("app:1".to_string(), labels(&[("base", "a")]));
        assert!(!should_build("app:1", &latest, &current, false));
        assert!(should_build("app:2", &latest, &current, false));
    }

    #[test]
    fn latest_values_cached_per_reference() {
        let registry = InMemoryRegistry::new().with_digest("ubuntu:20.04", "sha256:abc");
        let cache = LatestCache::new();
        let roles = container_roles();
        let entry = MatrixEntry::new().with("base", "20.04");

        let first = latest_values(&entry, &roles, &registry, &cache).expect("latest");
        let second = latest_values(&entry.with("os", "x"), &roles, &registry, &cache).expect("latest");
        assert_eq!(first.get("base").map(String::as_str), Some("ubuntu:20.04@sha256:abc"));
        assert_eq!(first, second);
        assert_eq!(registry.digest_lookups(), 1);
    }

    #[test]
    fn build_labels_use_label_type() {
        let labels = build_labels(&map(&[("base", "ubuntu:20.04@sha256:abc")]), &container_roles());
        assert_eq!(
            labels.get("uptodate_matrix_container_base").map(String::as_str),
            Some("ubuntu:20.04@sha256:abc")
        );
    }

    #[test]
    fn current_labels_require_tags() {
        let registry = InMemoryRegistry::new()
            .with_tags("ghcr.io/org/app", &["os-18.04"])
            .with_labels(
                "ghcr.io/org/app:os-18.04",
                &[("uptodate_matrix_container_base", "v"), ("maintainer", "me")],
            );
        let found = current_labels("ghcr.io/org/app:os-18.04", &registry)
            .expect("lookup")
            .expect("known image");
        assert_eq!(found.len(), 1);
        assert_eq!(found["base"].value, "v");

        let unknown = current_labels("ghcr.io/org/other:os-18.04", &registry).expect("lookup");
        assert!(unknown.is_none());
    }
}
