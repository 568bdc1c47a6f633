//! Package versions from a spack-style package index.
//!
//! Each package is described by `<index>/<package>.json`, whose `versions`
//! array lists the newest version first.

use reqwest::header::HeaderMap;
use serde::Deserialize;
use uptodate_common::error::Result;

use crate::PackageIndex;
use crate::http::HttpClient;

/// One entry of a package's `versions` array.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageVersion {
    /// Version string.
    pub name: String,
    /// Source archive checksum, when published.
    #[serde(default)]
    pub sha256: Option<String>,
}

/// The parts of a package document that uptodate reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageDocument {
    /// Package name.
    pub name: String,
    /// Known versions, newest first.
    #[serde(default)]
    pub versions: Vec<PackageVersion>,
}

impl PackageDocument {
    /// Returns the version names in document order.
    #[must_use]
    pub fn version_names(&self) -> Vec<String> {
        self.versions.iter().map(|v| v.name.clone()).collect()
    }
}

/// [`PackageIndex`] backed by the spack packages site.
#[derive(Debug, Clone)]
pub struct SpackIndex {
    base_url: String,
    http: HttpClient,
}

impl SpackIndex {
    /// Creates an index client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: HttpClient::new()?,
        })
    }
}

impl PackageIndex for SpackIndex {
    fn list_versions(&self, package: &str) -> Result<Vec<String>> {
        let url = format!("{}/{package}.json", self.base_url);
        let document: Option<PackageDocument> = self.http.get_json(&url, HeaderMap::new())?;
        let versions = document.map(|d| d.version_names()).unwrap_or_default();
        tracing::debug!(package, count = versions.len(), "listed package versions");
        Ok(versions)
    }
}
