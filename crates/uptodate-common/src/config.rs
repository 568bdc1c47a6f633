//! Run configuration for the uptodate tools.
//!
//! Values come from `UPTODATE_*` environment variables on top of the
//! defaults in [`crate::constants`].

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_GITHUB_API, DEFAULT_PACKAGE_INDEX, DEFAULT_REGISTRY_API, ENV_PREFIX,
};

/// Root configuration shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptodateConfig {
    /// Verbose diagnostics.
    pub debug: bool,
    /// Base URL of the crane web front-end for registry lookups.
    pub registry_api: String,
    /// Base URL holding package-index `<package>.json` documents.
    pub package_index_url: String,
    /// Base URL of the GitHub REST API.
    pub github_api: String,
    /// Optional token sent to the GitHub API.
    pub github_token: Option<String>,
}

impl Default for UptodateConfig {
    fn default() -> Self {
        Self {
            debug: false,
            registry_api: DEFAULT_REGISTRY_API.to_string(),
            package_index_url: DEFAULT_PACKAGE_INDEX.to_string(),
            github_api: DEFAULT_GITHUB_API.to_string(),
            github_token: None,
        }
    }
}

impl UptodateConfig {
    /// Builds the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.trim().is_empty())
        };
        let defaults = Self::default();
        Self {
            debug: var("DEBUG").is_some_and(|v| parse_bool(&v)),
            registry_api: var("REGISTRY_API").unwrap_or(defaults.registry_api),
            package_index_url: var("PACKAGE_INDEX").unwrap_or(defaults.package_index_url),
            github_api: var("GITHUB_API").unwrap_or(defaults.github_api),
            github_token: lookup("GITHUB_TOKEN").filter(|v| !v.trim().is_empty()),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
