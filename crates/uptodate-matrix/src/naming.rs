//! Container Namer: deterministic image names from a matrix entry.
//!
//! Naming roles are computed once per spec as an immutable list in
//! declaration order and passed by reference to [`container_name`], so
//! the "latest" and "current" passes derive identical names.

use std::fmt::Write as _;

use uptodate_common::types::NamingRole;

use crate::matrix::MatrixEntry;
use crate::spec::VariableSpec;

/// How one build argument takes part in naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBinding {
    /// Build argument name (matrix key).
    pub name: String,
    /// Slug written into names.
    pub slug: String,
    /// Naming role.
    pub role: NamingRole,
    /// Type segment of the matrix label.
    pub label_type: &'static str,
    /// Image repository for container arguments.
    pub image: Option<String>,
}

/// Naming roles of a spec, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingRoles {
    bindings: Vec<RoleBinding>,
}

impl NamingRoles {
    /// Derives roles from `specs`, keeping their order.
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a VariableSpec>) -> Self {
        let bindings = specs
            .into_iter()
            .map(|spec| RoleBinding {
                name: spec.name.clone(),
                slug: spec.slug.clone(),
                role: spec.role,
                label_type: spec.kind.label_type(),
                image: spec.kind.image().map(str::to_string),
            })
            .collect();
        Self { bindings }
    }

    /// Creates roles from explicit bindings.
    #[must_use]
    pub const fn new(bindings: Vec<RoleBinding>) -> Self {
        Self { bindings }
    }

    /// Every binding in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &RoleBinding> {
        self.bindings.iter()
    }

    /// Bindings with `role`, in declaration order.
    pub fn with_role(&self, role: NamingRole) -> impl Iterator<Item = &RoleBinding> {
        self.bindings.iter().filter(move |b| b.role == role)
    }

    /// Binding for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RoleBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }
}

/// Replaces characters that are not valid in an image name or tag.
#[must_use]
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Computes `[registry/]base[-slug-value...][:slug-value-...]`.
///
/// Container-role values extend the name and tag-role values form the
/// tag, both in declaration order. Without tag-role bindings the name
/// has no tag.
#[must_use]
pub fn container_name(
    registry: Option<&str>,
    base: &str,
    entry: &MatrixEntry,
    roles: &NamingRoles,
) -> String {
    let value = |binding: &RoleBinding| sanitize(entry.get(&binding.name).unwrap_or_default());

    let mut name = base.to_string();
    for binding in roles.with_role(NamingRole::Container) {
        let _ = write!(name, "-{}-{}", binding.slug, value(binding));
    }

    if let Some(registry) = registry.map(|r| r.trim_end_matches('/')).filter(|r| !r.is_empty()) {
        name = format!("{registry}/{name}");
    }

    let tags: Vec<String> = roles
        .with_role(NamingRole::Tag)
        .map(|binding| format!("{}-{}", binding.slug, value(binding)))
        .collect();
    if !tags.is_empty() {
        name = format!("{name}:{}", tags.join("-"));
        name = name.trim_matches('-').to_string();
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(name: &str, role: NamingRole) -> RoleBinding {
        RoleBinding {
            name: name.to_string(),
            slug: name.to_string(),
            role,
            label_type: "manual",
            image: None,
        }
    }

    fn roles() -> NamingRoles {
        NamingRoles::new(vec![
            binding("os", NamingRole::Tag),
            binding("base", NamingRole::Container),
            binding("py", NamingRole::Tag),
            binding("jobs", NamingRole::Manual),
        ])
    }

    fn entry(base: &str, os: &str) -> MatrixEntry {
        [("os", os), ("base", base), ("py", "3.9"), ("jobs", "4")]
            .into_iter()
            .collect()
    }

    #[test]
    fn name_has_container_suffix_and_tag() {
        let name = container_name(Some("ghcr.io/org"), "myapp", &entry("20.04", "18.04"), &roles());
        assert_eq!(name, "ghcr.io/org/myapp-base-20.04:os-18.04-py-3.9");
    }

    #[test]
    fn name_is_pure() {
        let e = entry("20.04", "18.04");
        assert_eq!(
            container_name(None, "myapp", &e, &roles()),
            container_name(None, "myapp", &e, &roles())
        );
    }

    #[test]
    fn container_value_changes_name_tag_value_changes_tag_only() {
        let original = container_name(None, "myapp", &entry("20.04", "18.04"), &roles());
        let new_base = container_name(None, "myapp", &entry("22.04", "18.04"), &roles());
        let new_os = container_name(None, "myapp", &entry("20.04", "20.04"), &roles());

        let split = |n: &str| {
            let (repo, tag) = n.split_once(':').expect("tag");
            (repo.to_string(), tag.to_string())
        };
        assert_ne!(split(&original).0, split(&new_base).0);
        assert_eq!(split(&original).0, split(&new_os).0);
        assert_ne!(split(&original).1, split(&new_os).1);
    }

    #[test]
    fn no_tag_roles_means_no_tag() {
        let roles = NamingRoles::new(vec![binding("base", NamingRole::Container)]);
        let e: MatrixEntry = [("base", "focal")].into_iter().collect();
        assert_eq!(container_name(None, "app", &e, &roles), "app-base-focal");
    }

    #[test]
    fn pinned_values_are_sanitized() {
        let roles = NamingRoles::new(vec![binding("base", NamingRole::Container)]);
        let e: MatrixEntry = [("base", "ubuntu:20.04@sha256:abc")].into_iter().collect();
        assert_eq!(
            container_name(None, "app", &e, &roles),
            "app-base-ubuntu-20.04-sha256-abc"
        );
    }

    #[test]
    fn empty_tag_value_trimmed() {
        let roles = NamingRoles::new(vec![binding("os", NamingRole::Tag)]);
        let e: MatrixEntry = [("os", "")].into_iter().collect();
        assert_eq!(container_name(None, "app", &e, &roles), "app:os");
    }
}
